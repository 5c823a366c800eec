use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

/// Upper bound on points along either grid axis.
pub const MAX_GRID_POINTS: u64 = 1_000_000;

/// Half-open range of flip counts, `start..stop` stepping by `step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlipRange {
    pub start: u64,
    pub stop: u64,
    pub step: u64,
}

impl FlipRange {
    pub fn new(start: u64, stop: u64, step: u64) -> Self {
        Self { start, stop, step }
    }

    /// Expand into the flip counts, rejecting empty or zero-flip ranges.
    pub fn counts(&self) -> Result<Vec<u64>> {
        let err = |reason| SimError::InvalidFlipRange {
            start: self.start,
            stop: self.stop,
            step: self.step,
            reason,
        };
        if self.step == 0 {
            return Err(err("step must be >= 1"));
        }
        if self.start == 0 {
            return Err(err("start must be >= 1"));
        }
        if self.stop <= self.start {
            return Err(err("range is empty"));
        }
        if (self.stop - self.start).div_ceil(self.step) > MAX_GRID_POINTS {
            return Err(err("too many flip counts"));
        }
        Ok((self.start..self.stop).step_by(self.step as usize).collect())
    }
}

/// Evenly spaced fractions `0, step, 2*step, ...` up to and including 1.0.
///
/// Points are computed as `i * step` so drift does not accumulate; a final
/// point within 1e-9 of 1.0 is snapped to exactly 1.0.
pub fn fraction_grid(step: f64) -> Result<Vec<f64>> {
    if !step.is_finite() || step <= 0.0 || step > 1.0 {
        return Err(SimError::InvalidFractionStep { value: step });
    }
    let points = (1.0 / step + 1e-9).floor();
    if points >= MAX_GRID_POINTS as f64 {
        return Err(SimError::InvalidFractionStep { value: step });
    }
    let points = points as usize;
    let mut grid: Vec<f64> = (0..=points).map(|i| i as f64 * step).collect();
    if let Some(last) = grid.last_mut() {
        if (*last - 1.0).abs() < 1e-9 {
            *last = 1.0;
        }
    }
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flip_range_exclusive_stop() {
        let range = FlipRange::new(100, 501, 100);
        assert_eq!(range.counts().unwrap(), vec![100, 200, 300, 400, 500]);
    }

    #[test]
    fn test_flip_range_single() {
        let range = FlipRange::new(10, 11, 5);
        assert_eq!(range.counts().unwrap(), vec![10]);
    }

    #[test]
    fn test_flip_range_rejects_degenerate() {
        assert!(FlipRange::new(0, 10, 1).counts().is_err());
        assert!(FlipRange::new(10, 10, 1).counts().is_err());
        assert!(FlipRange::new(10, 20, 0).counts().is_err());
    }

    #[test]
    fn test_flip_range_rejects_oversized() {
        let err = FlipRange::new(1, u64::MAX, 1).counts().unwrap_err();
        assert!(matches!(
            err,
            SimError::InvalidFlipRange { reason: "too many flip counts", .. }
        ));
        assert_eq!(
            FlipRange::new(1, MAX_GRID_POINTS + 1, 1).counts().unwrap().len() as u64,
            MAX_GRID_POINTS
        );
    }

    #[test]
    fn test_fraction_grid_tenths() {
        let grid = fraction_grid(0.1).unwrap();
        assert_eq!(grid.len(), 11);
        assert_eq!(grid[0], 0.0);
        assert_eq!(grid[10], 1.0);
        assert!((grid[3] - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_fraction_grid_twentieths() {
        let grid = fraction_grid(0.05).unwrap();
        assert_eq!(grid.len(), 21);
        assert_eq!(*grid.last().unwrap(), 1.0);
    }

    #[test]
    fn test_fraction_grid_uneven_step_stops_below_one() {
        let grid = fraction_grid(0.3).unwrap();
        assert_eq!(grid.len(), 4);
        assert!((grid[3] - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_fraction_grid_rejects_bad_step() {
        assert!(fraction_grid(0.0).is_err());
        assert!(fraction_grid(-0.1).is_err());
        assert!(fraction_grid(1.5).is_err());
        assert!(fraction_grid(f64::NAN).is_err());
    }

    #[test]
    fn test_fraction_grid_rejects_tiny_step() {
        assert_eq!(
            fraction_grid(1e-300),
            Err(SimError::InvalidFractionStep { value: 1e-300 })
        );
        assert!(fraction_grid(1e-10).is_err());
        assert_eq!(fraction_grid(1e-4).unwrap().len(), 10_001);
    }
}
