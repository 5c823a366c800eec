pub mod experiment;
pub mod stats;
pub mod sweep;
pub mod theory;
pub mod trial;

pub use experiment::{run_experiment, TrialStreams};
pub use stats::{DecadeBin, DecadeHistogram, Distribution, Summary};
pub use sweep::{sweep, CellResult, FlipRow, ResultTable, SweepRunner};
pub use theory::CellTheory;
pub use trial::{run_trial, simulate_terminal_wealth};
