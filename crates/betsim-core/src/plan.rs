use serde::Serialize;

use crate::bet::{validate_fraction, Bet};
use crate::error::{Result, SimError};

pub const DEFAULT_CHUNK_SIZE: usize = 4096;
pub const DEFAULT_HISTOGRAM_MIN: f64 = 1e-10;
pub const DEFAULT_HISTOGRAM_MAX: f64 = 1e10;

/// Display bounds for decade histograms. Statistics never use them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramBounds {
    pub min: f64,
    pub max: f64,
}

impl HistogramBounds {
    pub fn new(min: f64, max: f64) -> Result<Self> {
        if !min.is_finite() || !max.is_finite() || min <= 0.0 || min >= max {
            return Err(SimError::InvalidHistogramBounds { min, max });
        }
        Ok(Self { min, max })
    }
}

impl Default for HistogramBounds {
    fn default() -> Self {
        Self {
            min: DEFAULT_HISTOGRAM_MIN,
            max: DEFAULT_HISTOGRAM_MAX,
        }
    }
}

/// A fully validated sweep request.
///
/// Construction checks every parameter, so the engine can start trial work
/// without further validation. Fields are read-only once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepPlan {
    bet: Bet,
    fractions: Vec<f64>,
    flip_counts: Vec<u64>,
    trials: u64,
    seed: Option<u64>,
    chunk_size: usize,
    histogram: HistogramBounds,
}

impl SweepPlan {
    pub fn new(bet: Bet, fractions: Vec<f64>, flip_counts: Vec<u64>, trials: u64) -> Result<Self> {
        bet.validate()?;
        if fractions.is_empty() {
            return Err(SimError::empty_grid("allocation fractions"));
        }
        for &f in &fractions {
            validate_fraction(f)?;
        }
        if flip_counts.is_empty() {
            return Err(SimError::empty_grid("flip counts"));
        }
        if let Some(&n) = flip_counts.iter().find(|&&n| n == 0) {
            return Err(SimError::InvalidFlipCount { value: n });
        }
        if trials == 0 {
            return Err(SimError::InvalidTrialCount { value: trials });
        }
        Ok(Self {
            bet,
            fractions,
            flip_counts,
            trials,
            seed: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            histogram: HistogramBounds::default(),
        })
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(SimError::InvalidChunkSize { value: chunk_size });
        }
        self.chunk_size = chunk_size;
        Ok(self)
    }

    pub fn with_histogram(mut self, histogram: HistogramBounds) -> Self {
        self.histogram = histogram;
        self
    }

    #[inline]
    pub fn bet(&self) -> Bet {
        self.bet
    }

    #[inline]
    pub fn fractions(&self) -> &[f64] {
        &self.fractions
    }

    #[inline]
    pub fn flip_counts(&self) -> &[u64] {
        &self.flip_counts
    }

    #[inline]
    pub fn trials(&self) -> u64 {
        self.trials
    }

    #[inline]
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    #[inline]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    #[inline]
    pub fn histogram(&self) -> HistogramBounds {
        self.histogram
    }

    /// Number of (fraction, flip count) cells in the grid.
    pub fn cell_count(&self) -> usize {
        self.fractions.len() * self.flip_counts.len()
    }
}
