use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use betsim_core::SimulationConfig;
use betsim_engine::{ResultTable, SweepRunner};

#[derive(Parser, Debug)]
#[command(
    name = "betsim",
    about = "Monte Carlo sweep of allocation fractions for repeated binary bets"
)]
struct Cli {
    /// Path to TOML config file(s), comma-separated for merge
    #[arg(long)]
    config: Option<String>,

    /// Multiplier applied to the stake on a win
    #[arg(long)]
    win: Option<f64>,

    /// Multiplier applied to the stake on a loss
    #[arg(long)]
    lose: Option<f64>,

    /// Spacing of the allocation fraction grid over [0, 1]
    #[arg(long)]
    fraction_step: Option<f64>,

    /// First flip count
    #[arg(long)]
    flips_start: Option<u64>,

    /// Flip count upper bound (exclusive)
    #[arg(long)]
    flips_stop: Option<u64>,

    /// Flip count increment
    #[arg(long)]
    flips_step: Option<u64>,

    /// Number of trials per (fraction, flips) cell
    #[arg(long)]
    trials: Option<u64>,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Worker threads (defaults to all cores)
    #[arg(long)]
    threads: Option<usize>,

    /// Output file path (stdout if not specified)
    #[arg(long)]
    output_file: Option<PathBuf>,
}

impl Cli {
    fn load_config(&self) -> Result<SimulationConfig> {
        let mut config = match &self.config {
            Some(paths) => {
                let paths: Vec<PathBuf> = paths
                    .split(',')
                    .map(|p| PathBuf::from(p.trim()))
                    .collect();
                let refs: Vec<&Path> = paths.iter().map(|p| p.as_path()).collect();
                SimulationConfig::from_toml_files(&refs)
                    .with_context(|| format!("loading config from {}", paths_display(&paths)))?
            }
            None => SimulationConfig::default(),
        };

        if let Some(w) = self.win {
            config.bet.win_multiplier = w;
        }
        if let Some(l) = self.lose {
            config.bet.lose_multiplier = l;
        }
        if let Some(step) = self.fraction_step {
            config.grid.fraction_step = step;
            config.grid.fractions = None;
        }
        if let Some(start) = self.flips_start {
            config.grid.flips_start = start;
        }
        if let Some(stop) = self.flips_stop {
            config.grid.flips_stop = stop;
        }
        if let Some(step) = self.flips_step {
            config.grid.flips_step = step;
        }
        if let Some(trials) = self.trials {
            config.run.trials = trials;
        }
        if self.seed.is_some() {
            config.run.seed = self.seed;
        }
        Ok(config)
    }
}

fn paths_display(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// JSON output: run metadata plus the full result table.
#[derive(Debug, Serialize)]
struct OutputReport<'a> {
    meta: OutputMeta,
    table: &'a ResultTable,
}

#[derive(Debug, Serialize)]
struct OutputMeta {
    config_files: Vec<String>,
    fractions: usize,
    flip_counts: Vec<u64>,
    elapsed_ms: u128,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let start = Instant::now();

    let plan = cli
        .load_config()?
        .plan()
        .context("invalid simulation parameters")?;

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("configuring worker threads")?;
    }
    info!(threads = rayon::current_num_threads(), "worker pool ready");

    let table = SweepRunner::new().run(&plan);

    let report = OutputReport {
        meta: OutputMeta {
            config_files: cli
                .config
                .as_deref()
                .map(|c| c.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_default(),
            fractions: plan.fractions().len(),
            flip_counts: plan.flip_counts().to_vec(),
            elapsed_ms: start.elapsed().as_millis(),
        },
        table: &table,
    };

    print_summary(&table);

    let json = serde_json::to_string_pretty(&report).context("serializing report")?;
    if let Some(output_path) = &cli.output_file {
        std::fs::write(output_path, &json)
            .with_context(|| format!("writing {}", output_path.display()))?;
        info!(path = %output_path.display(), "results written");
    } else {
        println!("{}", json);
    }

    info!(elapsed_ms = start.elapsed().as_millis() as u64, "done");
    Ok(())
}

fn print_summary(table: &ResultTable) {
    eprintln!("\n{}", "=".repeat(88));
    eprintln!("Allocation Sweep Results");
    eprintln!("{}", "=".repeat(88));
    eprintln!(
        "Win: {:.2} | Lose: {:.2} | Trials: {} | Seed: {} | Growth-optimal fraction: {:.3}",
        table.bet.win_multiplier,
        table.bet.lose_multiplier,
        table.trials,
        table.seed,
        table.growth_optimal_fraction,
    );

    for row in &table.rows {
        eprintln!("{}", "-".repeat(88));
        eprintln!("Flips: {}", row.flips);
        eprintln!(
            "{:>8} {:>12} {:>12} {:>12} {:>12} {:>8} {:>14}",
            "Stake", "Median", "Mean", "Min", "Max", "P(loss)", "Theory median"
        );
        for cell in &row.cells {
            eprintln!(
                "{:>7.0}% {:>12.2e} {:>12.2e} {:>12.2e} {:>12.2e} {:>7.1}% {:>14.2e}",
                cell.fraction * 100.0,
                cell.summary.median,
                cell.summary.mean,
                cell.summary.min,
                cell.summary.max,
                cell.summary.loss_probability * 100.0,
                cell.theory.expected_median,
            );
        }
        if let Some(best) = row.best_by_median() {
            eprintln!("Best median at {:.0}% stake", best.fraction * 100.0);
        }
    }
    eprintln!("{}", "=".repeat(88));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_apply_on_defaults() {
        let cli = Cli::parse_from([
            "betsim", "--win", "2.0", "--lose", "0.5", "--trials", "10", "--seed", "3",
            "--flips-start", "5", "--flips-stop", "6",
        ]);
        let plan = cli.load_config().unwrap().plan().unwrap();
        assert!((plan.bet().win_multiplier - 2.0).abs() < 1e-12);
        assert_eq!(plan.trials(), 10);
        assert_eq!(plan.seed(), Some(3));
        assert_eq!(plan.flip_counts(), &[5]);
        assert_eq!(plan.fractions().len(), 11);
    }

    #[test]
    fn test_invalid_override_fails_plan() {
        let cli = Cli::parse_from(["betsim", "--trials", "0"]);
        assert!(cli.load_config().unwrap().plan().is_err());
    }

    #[test]
    fn test_missing_config_file_errors() {
        let cli = Cli::parse_from(["betsim", "--config", "/nonexistent/betsim.toml"]);
        let err = cli.load_config().unwrap_err();
        assert!(err.to_string().contains("/nonexistent/betsim.toml"));
    }
}
