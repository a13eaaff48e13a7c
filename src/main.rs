use anyhow::Result;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::time::Instant;
use log::{info, debug};

use branching_common::SimulationConfig;
use branching_engine::output::save_batch;
use branching_engine::run_batch;

fn main() -> Result<()> {
    // Initialize the logger
    env_logger::init();

    info!("Starting Branching Process Engine...");

    // --- Load Configuration ---
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.toml".to_string());
    let config = SimulationConfig::load(&config_path)?;
    info!("Loaded configuration from {}", config_path);
    debug!("Configuration: {:#?}", config);

    // --- Configure Rayon Thread Pool (Optional) ---
    if let Some(threads) = config.run.threads {
        rayon::ThreadPoolBuilder::new().num_threads(threads).build_global()?;
    }
    info!("Using {} Rayon threads.", rayon::current_num_threads());

    // --- Run Batch ---
    let start_time = Instant::now();
    let cancel = AtomicBool::new(false);
    let results = run_batch(&config, &cancel);
    let total_duration = start_time.elapsed();
    info!(
        "Simulation finished in {:.3} seconds: {} runs completed, {} failed.",
        total_duration.as_secs_f64(),
        results.completed.len(),
        results.failed.len()
    );

    let terminated = results.completed.iter().filter(|r| r.terminated).count();
    if terminated > 0 {
        info!("{} runs ran out of events before the step budget.", terminated);
    }

    // --- Save Recorded Data ---
    info!("Saving recorded data...");
    save_batch(&results, &config.output, Path::new("."))?;

    info!("Simulation Complete.");
    Ok(())
}
