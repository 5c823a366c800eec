use serde::Deserialize;
use std::path::Path;

use crate::bet::Bet;
use crate::error::{ConfigError, Result};
use crate::grid::{fraction_grid, FlipRange};
use crate::plan::{HistogramBounds, SweepPlan, DEFAULT_CHUNK_SIZE};

/// Top-level simulation config, parsed from one or more TOML files.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SimulationConfig {
    #[serde(default)]
    pub bet: BetConfig,
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

impl SimulationConfig {
    /// Load config from a TOML file path.
    pub fn from_toml(path: &Path) -> std::result::Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse config from a TOML string.
    pub fn from_toml_str(s: &str) -> std::result::Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load and merge multiple TOML files (later files override earlier).
    pub fn from_toml_files(paths: &[&Path]) -> std::result::Result<Self, ConfigError> {
        let Some((first, rest)) = paths.split_first() else {
            return Err(ConfigError::Parse("no config files provided".into()));
        };
        let mut base = read_value(first)?;
        for path in rest {
            merge_toml(&mut base, read_value(path)?);
        }
        base.try_into()
            .map_err(|e: toml::de::Error| ConfigError::Parse(e.to_string()))
    }

    /// Validate every field and build the immutable sweep plan.
    pub fn plan(&self) -> Result<SweepPlan> {
        let bet = Bet::new(self.bet.win_multiplier, self.bet.lose_multiplier)?;
        let fractions = match &self.grid.fractions {
            Some(explicit) => explicit.clone(),
            None => fraction_grid(self.grid.fraction_step)?,
        };
        let flip_counts = self.grid.flip_range().counts()?;
        let histogram =
            HistogramBounds::new(self.report.histogram_min, self.report.histogram_max)?;

        Ok(SweepPlan::new(bet, fractions, flip_counts, self.run.trials)?
            .with_chunk_size(self.run.chunk_size)?
            .with_seed(self.run.seed)
            .with_histogram(histogram))
    }
}

fn read_value(path: &Path) -> std::result::Result<toml::Value, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
    toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
}

fn merge_toml(base: &mut toml::Value, overlay: toml::Value) {
    if let (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) =
        (base, overlay)
    {
        for (key, value) in overlay_table {
            if let Some(base_value) = base_table.get_mut(&key) {
                if base_value.is_table() && value.is_table() {
                    merge_toml(base_value, value);
                    continue;
                }
            }
            base_table.insert(key, value);
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BetConfig {
    #[serde(default = "default_1_25")]
    pub win_multiplier: f64,
    #[serde(default = "default_0_80")]
    pub lose_multiplier: f64,
}

impl Default for BetConfig {
    fn default() -> Self {
        Self {
            win_multiplier: 1.25,
            lose_multiplier: 0.8,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GridConfig {
    /// Explicit fraction list; overrides `fraction_step` when present.
    #[serde(default)]
    pub fractions: Option<Vec<f64>>,
    #[serde(default = "default_0_10")]
    pub fraction_step: f64,
    #[serde(default = "default_100")]
    pub flips_start: u64,
    #[serde(default = "default_501")]
    pub flips_stop: u64,
    #[serde(default = "default_100")]
    pub flips_step: u64,
}

impl GridConfig {
    pub fn flip_range(&self) -> FlipRange {
        FlipRange::new(self.flips_start, self.flips_stop, self.flips_step)
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            fractions: None,
            fraction_step: 0.1,
            flips_start: 100,
            flips_stop: 501,
            flips_step: 100,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_100000")]
    pub trials: u64,
    /// Absent means a fresh seed is drawn from OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            trials: 100_000,
            seed: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_1e_minus_10")]
    pub histogram_min: f64,
    #[serde(default = "default_1e10")]
    pub histogram_max: f64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            histogram_min: 1e-10,
            histogram_max: 1e10,
        }
    }
}

// Default value helpers
fn default_100() -> u64 { 100 }
fn default_501() -> u64 { 501 }
fn default_100000() -> u64 { 100_000 }
fn default_chunk_size() -> usize { DEFAULT_CHUNK_SIZE }
fn default_0_10() -> f64 { 0.10 }
fn default_0_80() -> f64 { 0.80 }
fn default_1_25() -> f64 { 1.25 }
fn default_1e_minus_10() -> f64 { 1e-10 }
fn default_1e10() -> f64 { 1e10 }
