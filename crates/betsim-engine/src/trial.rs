use rand::{Rng, RngCore};

use betsim_core::{validate_fraction, Bet, FlipMultipliers, Result};

/// Simulate one trial of `flips` fair coin flips starting from wealth 1.0.
///
/// Each `next_u64` draw supplies 64 flips, low bit first; a set bit is a
/// win. Overflow to `+inf` and underflow to `0.0` are kept as-is.
#[inline]
pub fn simulate_terminal_wealth<R: RngCore + ?Sized>(
    multipliers: &FlipMultipliers,
    flips: u64,
    rng: &mut R,
) -> f64 {
    let mut wealth = 1.0;
    let mut remaining = flips;
    while remaining > 0 {
        let bits = rng.next_u64();
        let take = remaining.min(64);
        for i in 0..take {
            wealth = multipliers.apply(wealth, (bits >> i) & 1 == 1);
        }
        remaining -= take;
    }
    wealth
}

/// Terminal wealth of a single trial staking `fraction` of wealth per flip.
///
/// Fails fast on an invalid bet or a fraction outside [0, 1]. `flips = 0`
/// is allowed and returns exactly 1.0.
pub fn run_trial<R: Rng + ?Sized>(
    bet: &Bet,
    fraction: f64,
    flips: u64,
    rng: &mut R,
) -> Result<f64> {
    bet.validate()?;
    validate_fraction(fraction)?;
    Ok(simulate_terminal_wealth(&bet.multipliers(fraction), flips, rng))
}

#[cfg(test)]
mod tests {
    use super::*;
    use betsim_core::SimError;
    use rand::rngs::mock::StepRng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_all_wins() {
        let bet = Bet::new(2.0, 0.5).unwrap();
        let mut rng = StepRng::new(u64::MAX, 0);
        let wealth = run_trial(&bet, 0.5, 10, &mut rng).unwrap();
        assert!((wealth - 1.5f64.powi(10)).abs() < 1e-9);
    }

    #[test]
    fn test_all_losses() {
        let bet = Bet::new(2.0, 0.5).unwrap();
        let mut rng = StepRng::new(0, 0);
        let wealth = run_trial(&bet, 0.5, 100, &mut rng).unwrap();
        assert!((wealth - 0.75f64.powi(100)).abs() < 1e-20);
    }

    #[test]
    fn test_bits_consumed_low_first() {
        // 0b01: first flip wins, second loses.
        let bet = Bet::new(2.0, 0.5).unwrap();
        let mut rng = StepRng::new(1, 0);
        let wealth = run_trial(&bet, 1.0, 2, &mut rng).unwrap();
        assert!((wealth - 1.0).abs() < 1e-12);

        let mut rng = StepRng::new(1, 0);
        let wealth = run_trial(&bet, 1.0, 1, &mut rng).unwrap();
        assert!((wealth - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_more_than_64_flips_draws_again() {
        // Two draws: first all losses, second all wins.
        let bet = Bet::new(2.0, 0.5).unwrap();
        let mut rng = StepRng::new(0, u64::MAX);
        let wealth = run_trial(&bet, 1.0, 128, &mut rng).unwrap();
        assert!((wealth - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_flips_is_one() {
        let bet = Bet::new(3.0, 0.1).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(run_trial(&bet, 0.7, 0, &mut rng).unwrap(), 1.0);
    }

    #[test]
    fn test_zero_fraction_is_one() {
        let bet = Bet::new(3.0, 0.1).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        assert_eq!(run_trial(&bet, 0.0, 1000, &mut rng).unwrap(), 1.0);
    }

    #[test]
    fn test_neutral_bet_is_one() {
        let bet = Bet::new(1.0, 1.0).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert_eq!(run_trial(&bet, 0.8, 1000, &mut rng).unwrap(), 1.0);
    }

    #[test]
    fn test_total_loss_ruins() {
        let bet = Bet::new(2.0, 0.0).unwrap();
        let mut rng = StepRng::new(0, 0);
        assert_eq!(run_trial(&bet, 1.0, 5, &mut rng).unwrap(), 0.0);
    }

    #[test]
    fn test_overflow_propagates() {
        let bet = Bet::new(1e10, 0.5).unwrap();
        let mut rng = StepRng::new(u64::MAX, u64::MAX);
        let wealth = run_trial(&bet, 1.0, 64, &mut rng).unwrap();
        assert_eq!(wealth, f64::INFINITY);
    }

    #[test]
    fn test_rejects_invalid_fraction() {
        let bet = Bet::new(2.0, 0.5).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        assert_eq!(
            run_trial(&bet, 1.5, 10, &mut rng),
            Err(SimError::InvalidFraction { value: 1.5 })
        );
    }
}
