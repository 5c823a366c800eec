//! Error types for parameter validation and configuration loading.

use thiserror::Error;

/// Result type alias for simulation operations.
pub type Result<T> = std::result::Result<T, SimError>;

/// Invalid simulation parameters. Raised before any trial work starts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    /// Allocation fraction outside [0, 1] or not finite.
    #[error("Invalid allocation fraction {value}: must be within [0, 1]")]
    InvalidFraction { value: f64 },

    /// Win multiplier must be positive and finite.
    #[error("Invalid win multiplier {value}: must be > 0")]
    InvalidWinMultiplier { value: f64 },

    /// Lose multiplier must be non-negative and finite.
    #[error("Invalid lose multiplier {value}: must be >= 0")]
    InvalidLoseMultiplier { value: f64 },

    /// Configured flip count below one.
    #[error("Invalid flip count {value}: must be >= 1")]
    InvalidFlipCount { value: u64 },

    /// Flip range that yields no flip counts.
    #[error("Invalid flip range start={start} stop={stop} step={step}: {reason}")]
    InvalidFlipRange {
        start: u64,
        stop: u64,
        step: u64,
        reason: &'static str,
    },

    /// Trial count below one.
    #[error("Invalid trial count {value}: must be >= 1")]
    InvalidTrialCount { value: u64 },

    /// Fraction grid step outside (0, 1].
    #[error("Invalid fraction step {value}: must be within (0, 1]")]
    InvalidFractionStep { value: f64 },

    /// Trials per random stream below one.
    #[error("Invalid chunk size {value}: must be >= 1")]
    InvalidChunkSize { value: usize },

    /// Histogram display bounds must be positive with min < max.
    #[error("Invalid histogram bounds [{min}, {max}]")]
    InvalidHistogramBounds { min: f64, max: f64 },

    /// A grid axis with no points.
    #[error("Empty grid provided for {context}")]
    EmptyGrid { context: String },
}

impl SimError {
    /// Create an empty grid error.
    pub fn empty_grid(context: impl Into<String>) -> Self {
        Self::EmptyGrid {
            context: context.into(),
        }
    }
}

/// Failure to read or parse a configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(String),

    #[error("config parse error: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_parameter() {
        let err = SimError::InvalidFraction { value: 1.5 };
        assert!(err.to_string().contains("allocation fraction 1.5"));

        let err = SimError::InvalidTrialCount { value: 0 };
        assert!(err.to_string().contains("trial count 0"));

        let err = SimError::empty_grid("fractions");
        assert_eq!(err.to_string(), "Empty grid provided for fractions");
    }
}
