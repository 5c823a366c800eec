use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use betsim_core::{validate_fraction, Bet, FlipMultipliers, Result, SimError};

use crate::stats::Distribution;
use crate::trial::simulate_terminal_wealth;

/// Run `trials` independent trials sequentially on the caller's generator.
pub fn run_experiment<R: Rng + ?Sized>(
    bet: &Bet,
    fraction: f64,
    flips: u64,
    trials: u64,
    rng: &mut R,
) -> Result<Distribution> {
    bet.validate()?;
    validate_fraction(fraction)?;
    if trials == 0 {
        return Err(SimError::InvalidTrialCount { value: trials });
    }
    let multipliers = bet.multipliers(fraction);
    let values = (0..trials)
        .map(|_| simulate_terminal_wealth(&multipliers, flips, rng))
        .collect();
    Ok(Distribution::new(values))
}

/// Deterministic parallel trial generation.
///
/// Trials of a cell are split into fixed-size chunks. Chunk `c` of cell `k`
/// draws from a ChaCha8 key built from `(seed, k)` on stream `c`, so the
/// output depends only on `(seed, chunk_size)` and never on thread count.
/// Distinct `(seed, cell)` pairs never share a key.
#[derive(Debug, Clone, Copy)]
pub struct TrialStreams {
    seed: u64,
    chunk_size: usize,
}

impl TrialStreams {
    pub fn new(seed: u64, chunk_size: usize) -> Self {
        Self {
            seed,
            chunk_size: chunk_size.max(1),
        }
    }

    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Generator for one chunk of one cell.
    pub fn rng(&self, cell: u64, chunk: u64) -> ChaCha8Rng {
        let mut key = [0u8; 32];
        key[..8].copy_from_slice(&self.seed.to_le_bytes());
        key[8..16].copy_from_slice(&cell.to_le_bytes());
        let mut rng = ChaCha8Rng::from_seed(key);
        rng.set_stream(chunk);
        rng
    }

    /// Terminal wealths of `trials` trials for one cell, in chunk order.
    pub fn terminal_wealths(
        &self,
        cell: u64,
        multipliers: &FlipMultipliers,
        flips: u64,
        trials: u64,
    ) -> Vec<f64> {
        let chunk_size = self.chunk_size as u64;
        let n_chunks = trials.div_ceil(chunk_size);

        let chunks: Vec<Vec<f64>> = (0..n_chunks)
            .into_par_iter()
            .map(|chunk| {
                let start = chunk * chunk_size;
                let end = (start + chunk_size).min(trials);
                let mut rng = self.rng(cell, chunk);
                (start..end)
                    .map(|_| simulate_terminal_wealth(multipliers, flips, &mut rng))
                    .collect()
            })
            .collect();

        chunks.concat()
    }

    /// Parallel counterpart of [`run_experiment`] for a single cell.
    pub fn run_experiment(
        &self,
        cell: u64,
        bet: &Bet,
        fraction: f64,
        flips: u64,
        trials: u64,
    ) -> Result<Distribution> {
        bet.validate()?;
        validate_fraction(fraction)?;
        if trials == 0 {
            return Err(SimError::InvalidTrialCount { value: trials });
        }
        let values = self.terminal_wealths(cell, &bet.multipliers(fraction), flips, trials);
        Ok(Distribution::new(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_fraction_every_trial_is_one() {
        let bet = Bet::new(2.0, 0.5).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let dist = run_experiment(&bet, 0.0, 50, 1000, &mut rng).unwrap();
        assert_eq!(dist.len(), 1000);
        assert_eq!(dist.median(), 1.0);
        assert_eq!(dist.mean(), 1.0);
    }

    #[test]
    fn test_mean_converges_to_expectation() {
        // E[m] = 0.5 * 1.125 + 0.5 * 0.9 = 1.0125
        let bet = Bet::new(1.25, 0.8).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let dist = run_experiment(&bet, 0.5, 10, 100_000, &mut rng).unwrap();
        let expected = 1.0125f64.powi(10);
        let rel = (dist.mean() - expected).abs() / expected;
        assert!(rel < 0.05, "mean {} vs {}", dist.mean(), expected);
    }

    #[test]
    fn test_rejects_zero_trials() {
        let bet = Bet::new(2.0, 0.5).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(
            run_experiment(&bet, 0.5, 10, 0, &mut rng).unwrap_err(),
            SimError::InvalidTrialCount { value: 0 }
        );
    }

    #[test]
    fn test_streams_are_deterministic() {
        let streams = TrialStreams::new(99, 64);
        let m = Bet::new(2.0, 0.5).unwrap().multipliers(0.5);
        let a = streams.terminal_wealths(3, &m, 20, 1000);
        let b = streams.terminal_wealths(3, &m, 20, 1000);
        assert_eq!(a.len(), 1000);
        assert_eq!(a, b);
    }

    #[test]
    fn test_streams_differ_across_cells_and_seeds() {
        let m = Bet::new(2.0, 0.5).unwrap().multipliers(0.5);
        let base = TrialStreams::new(1, 64).terminal_wealths(0, &m, 20, 200);
        let other_cell = TrialStreams::new(1, 64).terminal_wealths(1, &m, 20, 200);
        let other_seed = TrialStreams::new(2, 64).terminal_wealths(0, &m, 20, 200);
        assert_ne!(base, other_cell);
        assert_ne!(base, other_seed);
    }

    #[test]
    fn test_adjacent_seeds_do_not_share_cells() {
        let m = Bet::new(2.0, 0.5).unwrap().multipliers(0.5);
        for seed in 0..8u64 {
            for cell in 1..4u64 {
                let base = TrialStreams::new(seed, 64).terminal_wealths(cell, &m, 100, 200);
                let shifted =
                    TrialStreams::new(seed + 1, 64).terminal_wealths(cell - 1, &m, 100, 200);
                assert_ne!(base, shifted, "seed {} cell {}", seed, cell);
            }
        }
    }

    #[test]
    fn test_partial_last_chunk() {
        let streams = TrialStreams::new(5, 300);
        let m = Bet::new(2.0, 0.5).unwrap().multipliers(0.3);
        assert_eq!(streams.terminal_wealths(0, &m, 5, 1001).len(), 1001);
    }

    #[test]
    fn test_parallel_experiment_validates() {
        let streams = TrialStreams::new(5, 300);
        let bet = Bet::new(2.0, 0.5).unwrap();
        assert!(streams.run_experiment(0, &bet, -0.1, 5, 10).is_err());
        assert!(streams.run_experiment(0, &bet, 0.1, 5, 0).is_err());
        assert_eq!(streams.run_experiment(0, &bet, 0.1, 0, 10).unwrap().median(), 1.0);
    }
}
