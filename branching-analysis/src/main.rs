use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Builder;
use log::{info, warn, LevelFilter};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

use branching_common::read_results;

mod regression;

use regression::{fit_division_schedule, fit_log_population, summarize, FitSummary, RegressionFit};

/// Command-line arguments for the growth-rate analysis
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Batch results file (.json, .bin or .msgpack)
    #[arg(short, long)]
    input: PathBuf,

    /// Output CSV with one regression per run
    #[arg(short, long, default_value = "growth_rates.csv")]
    output: PathBuf,

    /// Shortest population curve, in points, that is fitted at all
    #[arg(long, default_value_t = 2)]
    min_points: usize,

    /// Number of division times used by the division-schedule estimator
    #[arg(long, default_value_t = 300)]
    division_limit: usize,
}

/// Both estimators for one run; either may be missing when the run is excluded.
struct RunFits {
    run_index: u32,
    log_population: Option<RegressionFit>,
    division_schedule: Option<RegressionFit>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    run_with_args(args)
}

fn run_with_args(args: Args) -> Result<()> {
    // Initialize logger
    Builder::from_default_env()
        .filter(None, LevelFilter::Info)
        .init();

    info!("Starting Growth Rate Analysis...");
    info!("Input file: {}", args.input.display());

    let results = read_results(&args.input)
        .with_context(|| format!("Failed to load batch results from '{}'", args.input.display()))?;
    info!(
        "Loaded {} completed runs ({} failed runs were excluded by the engine).",
        results.completed.len(),
        results.failed.len()
    );

    let fits: Vec<RunFits> = results
        .completed
        .par_iter()
        .map(|record| RunFits {
            run_index: record.run_index,
            log_population: fit_log_population(&record.curve, args.min_points),
            division_schedule: fit_division_schedule(&record.events, args.division_limit),
        })
        .collect();

    for run in fits.iter().filter(|f| f.log_population.is_none()) {
        warn!(
            "Run {} excluded from log-population fit (under {} points, extinct or no time spread).",
            run.run_index,
            args.min_points.max(2)
        );
    }

    write_fits_csv(&args.output, &fits)?;
    info!("Per-run regressions saved to {}", args.output.display());

    let log_fits: Vec<RegressionFit> = fits.iter().filter_map(|f| f.log_population).collect();
    let schedule_fits: Vec<RegressionFit> =
        fits.iter().filter_map(|f| f.division_schedule).collect();
    report("ln(population) ~ time", summarize(&log_fits));
    report("division time ~ ln(k)", summarize(&schedule_fits));

    info!("Analysis Complete.");
    Ok(())
}

fn report(name: &str, summary: Option<FitSummary>) {
    match summary {
        Some(s) => info!(
            "{}: {} runs | slope {:.5} ± {:.5} | intercept {:.5} ± {:.5}",
            name, s.count, s.slope_mean, s.slope_std, s.intercept_mean, s.intercept_std
        ),
        None => warn!("{}: no run could be fitted.", name),
    }
}

fn write_fits_csv(path: &Path, fits: &[RunFits]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV file '{}'", path.display()))?;
    writer.write_record([
        "run",
        "log_population_points",
        "log_population_slope",
        "log_population_intercept",
        "division_schedule_slope",
        "division_schedule_intercept",
    ])?;

    let cell = |value: Option<f64>| value.map(|v| format!("{:.6}", v)).unwrap_or_default();
    for run in fits {
        writer.write_record(&[
            run.run_index.to_string(),
            run.log_population.map(|f| f.points.to_string()).unwrap_or_default(),
            cell(run.log_population.map(|f| f.slope)),
            cell(run.log_population.map(|f| f.intercept)),
            cell(run.division_schedule.map(|f| f.slope)),
            cell(run.division_schedule.map(|f| f.intercept)),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
