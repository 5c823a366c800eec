use std::time::Instant;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use betsim_core::{Bet, Result, SweepPlan};

use crate::experiment::TrialStreams;
use crate::stats::{DecadeHistogram, Distribution, Summary};
use crate::theory::{growth_optimal_fraction, CellTheory};

/// Outcome of one (fraction, flip count) cell.
#[derive(Debug, Clone, Serialize)]
pub struct CellResult {
    pub fraction: f64,
    pub flips: u64,
    pub summary: Summary,
    pub histogram: DecadeHistogram,
    pub theory: CellTheory,
}

/// All cells for one flip count, ordered as the plan's fractions.
#[derive(Debug, Clone, Serialize)]
pub struct FlipRow {
    pub flips: u64,
    pub cells: Vec<CellResult>,
}

impl FlipRow {
    /// Grid cell with the highest sampled median.
    pub fn best_by_median(&self) -> Option<&CellResult> {
        self.cells
            .iter()
            .max_by(|a, b| a.summary.median.total_cmp(&b.summary.median))
    }
}

/// Median/mean terminal wealth across the full fraction x flip-count grid.
#[derive(Debug, Clone, Serialize)]
pub struct ResultTable {
    pub bet: Bet,
    pub trials: u64,
    /// Seed actually used; rerunning with it reproduces the table bit for bit.
    pub seed: u64,
    pub growth_optimal_fraction: f64,
    pub rows: Vec<FlipRow>,
}

impl ResultTable {
    pub fn row(&self, flips: u64) -> Option<&FlipRow> {
        self.rows.iter().find(|r| r.flips == flips)
    }

    /// `(fraction, median, mean)` triples for one flip count.
    pub fn series(&self, flips: u64) -> Option<Vec<(f64, f64, f64)>> {
        self.row(flips).map(|row| {
            row.cells
                .iter()
                .map(|c| (c.fraction, c.summary.median, c.summary.mean))
                .collect()
        })
    }

    /// Fraction with the highest sampled median for one flip count.
    pub fn best_by_median(&self, flips: u64) -> Option<f64> {
        self.row(flips)
            .and_then(FlipRow::best_by_median)
            .map(|c| c.fraction)
    }

    pub fn cells(&self) -> impl Iterator<Item = &CellResult> {
        self.rows.iter().flat_map(|r| r.cells.iter())
    }
}

/// Evaluates every cell of a [`SweepPlan`].
///
/// Cells run in parallel via Rayon and trials within a cell run in parallel
/// chunks, each on its own random stream (see [`TrialStreams`]).
#[derive(Debug, Clone, Copy, Default)]
pub struct SweepRunner;

impl SweepRunner {
    pub fn new() -> Self {
        Self
    }

    pub fn run(&self, plan: &SweepPlan) -> ResultTable {
        let seed = plan.seed().unwrap_or_else(|| {
            let seed = rand::random();
            info!(seed, "no seed configured, drew one from entropy");
            seed
        });
        let streams = TrialStreams::new(seed, plan.chunk_size());
        let bet = plan.bet();
        let fractions = plan.fractions();
        let histogram_bounds = plan.histogram();

        info!(
            win = bet.win_multiplier,
            lose = bet.lose_multiplier,
            fractions = fractions.len(),
            flip_counts = plan.flip_counts().len(),
            trials = plan.trials(),
            seed,
            "starting sweep"
        );
        let start = Instant::now();

        let cells: Vec<(usize, usize)> = (0..plan.flip_counts().len())
            .flat_map(|row| (0..fractions.len()).map(move |col| (row, col)))
            .collect();

        let results: Vec<CellResult> = cells
            .par_iter()
            .map(|&(row, col)| {
                let flips = plan.flip_counts()[row];
                let fraction = fractions[col];
                let cell = (row * fractions.len() + col) as u64;

                let values = streams.terminal_wealths(
                    cell,
                    &bet.multipliers(fraction),
                    flips,
                    plan.trials(),
                );
                let dist = Distribution::new(values);
                let summary = dist.summary();
                debug!(
                    flips,
                    fraction,
                    median = summary.median,
                    mean = summary.mean,
                    "cell done"
                );

                CellResult {
                    fraction,
                    flips,
                    summary,
                    histogram: dist.histogram(histogram_bounds),
                    theory: CellTheory::new(&bet, fraction, flips),
                }
            })
            .collect();

        let mut results = results.into_iter();
        let rows: Vec<FlipRow> = plan
            .flip_counts()
            .iter()
            .map(|&flips| {
                let row = FlipRow {
                    flips,
                    cells: results.by_ref().take(fractions.len()).collect(),
                };
                if let Some(best) = row.best_by_median() {
                    info!(
                        flips,
                        best_fraction = best.fraction,
                        median = best.summary.median,
                        "row done"
                    );
                }
                row
            })
            .collect();

        info!(
            cells = plan.cell_count(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "sweep complete"
        );

        ResultTable {
            bet,
            trials: plan.trials(),
            seed,
            growth_optimal_fraction: growth_optimal_fraction(&bet),
            rows,
        }
    }
}

/// Validate the inputs, then evaluate the full grid.
///
/// Any invalid parameter aborts before a single trial runs; no partial
/// table is produced.
pub fn sweep(
    bet: Bet,
    fractions: &[f64],
    flip_counts: &[u64],
    trials: u64,
    seed: Option<u64>,
) -> Result<ResultTable> {
    let plan = SweepPlan::new(bet, fractions.to_vec(), flip_counts.to_vec(), trials)?
        .with_seed(seed);
    Ok(SweepRunner::new().run(&plan))
}
