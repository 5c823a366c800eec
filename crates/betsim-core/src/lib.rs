pub mod bet;
pub mod config;
pub mod error;
pub mod grid;
pub mod plan;

pub use bet::{validate_fraction, Bet, FlipMultipliers};
pub use config::SimulationConfig;
pub use error::{ConfigError, Result, SimError};
pub use grid::{fraction_grid, FlipRange, MAX_GRID_POINTS};
pub use plan::{HistogramBounds, SweepPlan};
