//! Parallel dispatch of independent runs.
//!
//! Runs share nothing but the read-only config. Each one owns its engine and
//! random source; results meet only in the concurrent map once a run ends.

use crate::error::SimulationError;
use crate::simulation::CellSimulation;
use branching_common::{BatchResults, FailedRun, RunRecord, SimulationConfig};
use dashmap::DashMap;
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use rayon::prelude::*;
use std::sync::atomic::AtomicBool;

/// Seed of run `run_index` in a batch seeded with `base_seed`.
pub fn seed_for_run(base_seed: u64, run_index: u32) -> u64 {
    base_seed.wrapping_add(run_index as u64)
}

/// Runs a single simulation to its step budget, termination, or cancellation.
pub fn run_single(
    config: &SimulationConfig,
    run_index: u32,
    cancel: &AtomicBool,
) -> Result<RunRecord, SimulationError> {
    let seed = seed_for_run(config.run.seed, run_index);
    let mut sim = CellSimulation::from_config(config, seed)?;
    let processed = sim.run_with_cancel(config.run.steps, cancel)?;

    debug!(
        "Run {} (seed {}): {} events, final population {}, t={:.4}{}",
        run_index,
        seed,
        processed,
        sim.population(),
        sim.current_time(),
        if sim.is_terminated() { ", terminated" } else { "" }
    );
    Ok(sim.into_record(run_index, seed))
}

/// Runs `config.run.runs` independent simulations in parallel.
///
/// A run that fails is recorded in `failed` and the rest of the batch
/// carries on.
pub fn run_batch(config: &SimulationConfig, cancel: &AtomicBool) -> BatchResults {
    let runs = config.run.runs;
    info!(
        "Dispatching {} runs of up to {} steps on {} threads.",
        runs,
        config.run.steps,
        rayon::current_num_threads()
    );

    let progress_bar = ProgressBar::new(runs as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} runs ({percent}%) [{eta}]")
    {
        progress_bar.set_style(style.progress_chars("#>-"));
    }

    let outcomes: DashMap<u32, Result<RunRecord, SimulationError>> = DashMap::new();
    (0..runs)
        .into_par_iter()
        .progress_with(progress_bar.clone())
        .for_each(|run_index| {
            outcomes.insert(run_index, run_single(config, run_index, cancel));
        });
    progress_bar.finish_and_clear();

    let mut ordered: Vec<(u32, Result<RunRecord, SimulationError>)> =
        outcomes.into_iter().collect();
    ordered.sort_by_key(|(run_index, _)| *run_index);

    let mut results = BatchResults::default();
    for (run_index, outcome) in ordered {
        match outcome {
            Ok(record) => results.completed.push(record),
            Err(e) => {
                warn!("Run {} failed and is excluded: {}", run_index, e);
                results.failed.push(FailedRun {
                    run_index,
                    seed: seed_for_run(config.run.seed, run_index),
                    reason: e.to_string(),
                });
            }
        }
    }

    info!(
        "Batch finished: {} completed, {} failed.",
        results.completed.len(),
        results.failed.len()
    );
    results
}
