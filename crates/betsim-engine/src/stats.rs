//! Summary statistics over terminal-wealth distributions.

use serde::Serialize;

use betsim_core::HistogramBounds;

/// Summary of one (fraction, flips) cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    pub median: f64,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    /// Share of trials that ended below the starting wealth of 1.0.
    pub loss_probability: f64,
}

/// Terminal wealths of independent trials, sorted ascending by IEEE total order.
#[derive(Debug, Clone)]
pub struct Distribution {
    values: Vec<f64>,
}

impl Distribution {
    pub fn new(mut values: Vec<f64>) -> Self {
        values.sort_unstable_by(f64::total_cmp);
        Self { values }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Middle order statistic; the average of the two middle ones for even counts.
    pub fn median(&self) -> f64 {
        let n = self.values.len();
        if n == 0 {
            return f64::NAN;
        }
        if n % 2 == 1 {
            self.values[n / 2]
        } else {
            0.5 * (self.values[n / 2 - 1] + self.values[n / 2])
        }
    }

    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            return f64::NAN;
        }
        let n = self.values.len() as f64;
        let sum = self.values.iter().sum::<f64>();
        let max_is_finite = self.values.last().is_some_and(|v| v.is_finite());
        if sum.is_finite() || !max_is_finite {
            return sum / n;
        }
        // Finite values whose sum overflows: divide before adding.
        self.values.iter().map(|v| v / n).sum()
    }

    pub fn summary(&self) -> Summary {
        let n = self.values.len();
        let losses = self.values.partition_point(|&v| v < 1.0);
        Summary {
            median: self.median(),
            mean: self.mean(),
            min: self.values.first().copied().unwrap_or(f64::NAN),
            max: self.values.last().copied().unwrap_or(f64::NAN),
            loss_probability: if n == 0 { 0.0 } else { losses as f64 / n as f64 },
        }
    }

    pub fn histogram(&self, bounds: HistogramBounds) -> DecadeHistogram {
        DecadeHistogram::from_values(&self.values, bounds)
    }
}

/// One power-of-ten bucket `[lower, upper)`; the top bucket also holds `upper`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DecadeBin {
    pub lower: f64,
    pub upper: f64,
    pub percent: f64,
}

/// Percentage of trials per decade of terminal wealth.
///
/// Values are clamped to the display bounds before bucketing, so ruined
/// trials land in the lowest bin and runaway ones in the highest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecadeHistogram {
    pub bins: Vec<DecadeBin>,
}

impl DecadeHistogram {
    pub fn from_values(values: &[f64], bounds: HistogramBounds) -> Self {
        // Snap exact powers of ten that log10 rounds a hair off.
        let min_exp = (bounds.min.log10() + 1e-9).floor() as i32;
        let max_exp = ((bounds.max.log10() - 1e-9).ceil() as i32).max(min_exp + 1);
        let n_bins = (max_exp - min_exp) as usize;

        let mut counts = vec![0usize; n_bins];
        for &v in values {
            let clamped = v.clamp(bounds.min, bounds.max);
            let idx = (clamped.log10().floor() as i64 - min_exp as i64)
                .clamp(0, n_bins as i64 - 1) as usize;
            counts[idx] += 1;
        }

        let total = values.len().max(1) as f64;
        let bins = counts
            .iter()
            .enumerate()
            .map(|(i, &count)| DecadeBin {
                lower: 10f64.powi(min_exp + i as i32),
                upper: 10f64.powi(min_exp + i as i32 + 1),
                percent: count as f64 * 100.0 / total,
            })
            .collect();

        Self { bins }
    }

    /// The bin holding the most trials.
    pub fn mode(&self) -> Option<&DecadeBin> {
        self.bins
            .iter()
            .max_by(|a, b| a.percent.total_cmp(&b.percent))
    }
}
