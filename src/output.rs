use anyhow::{Context, Result};
use branching_common::{write_results, BatchResults, OutputConfig, ResultFormat};
use log::{error, info};
use std::path::{Path, PathBuf};

/// Saves batch results as configured and returns the paths written.
///
/// Results go to `<base>_results.<ext>`; an unknown format falls back to
/// JSON. With `save_curves_csv`, every population curve also goes to
/// `<base>_curves.csv`.
pub fn save_batch(
    results: &BatchResults,
    output: &OutputConfig,
    dir: &Path,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    if output.save_results {
        let name = output.format.as_deref().unwrap_or("json");
        let format = ResultFormat::from_name(name).unwrap_or_else(|| {
            error!("Unknown output format: {}. Using JSON instead.", name);
            ResultFormat::Json
        });
        let path = dir.join(format!("{}_results.{}", output.base_filename, format.extension()));
        write_results(&path, results, format)?;
        info!("Batch results saved to {} ({:?} format)", path.display(), format);
        written.push(path);
    } else {
        info!("Skipping saving results as per config (save_results is false).");
    }

    if output.save_curves_csv {
        let path = dir.join(format!("{}_curves.csv", output.base_filename));
        write_curves_csv(&path, results)?;
        info!("Population curves saved to {}", path.display());
        written.push(path);
    }

    Ok(written)
}

/// Writes one `run,time,population` row per curve point.
fn write_curves_csv(path: &Path, results: &BatchResults) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV file '{}'", path.display()))?;
    writer.write_record(["run", "time", "population"])?;
    for (run_index, curve) in results.curves() {
        for point in curve {
            writer.write_record(&[
                run_index.to_string(),
                format!("{:.6}", point.time),
                point.population.to_string(),
            ])?;
        }
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use branching_common::{population_curve, read_results, EventKind, EventLogEntry, RunRecord};

    fn results() -> BatchResults {
        let events = vec![
            EventLogEntry::new(1.0, EventKind::Division, 0),
            EventLogEntry::new(2.5, EventKind::Division, 1),
        ];
        BatchResults {
            completed: vec![RunRecord {
                run_index: 3,
                seed: 3,
                steps_taken: 2,
                terminated: false,
                final_population: 3,
                curve: population_curve(&events),
                events,
            }],
            failed: Vec::new(),
        }
    }

    #[test]
    fn writes_results_and_curves() {
        let dir = tempfile::tempdir().unwrap();
        let output = OutputConfig {
            base_filename: "growth".to_string(),
            save_results: true,
            format: Some("messagepack".to_string()),
            save_curves_csv: true,
        };

        let written = save_batch(&results(), &output, dir.path()).unwrap();
        assert_eq!(written[0], dir.path().join("growth_results.msgpack"));
        assert_eq!(read_results(&written[0]).unwrap().completed[0].run_index, 3);

        let csv = std::fs::read_to_string(&written[1]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "run,time,population");
        assert_eq!(lines[1], "3,0.000000,1");
        assert_eq!(lines[3], "3,2.500000,3");
    }

    #[test]
    fn unknown_format_falls_back_to_json() {
        let dir = tempfile::tempdir().unwrap();
        let output = OutputConfig {
            base_filename: "run".to_string(),
            save_results: true,
            format: Some("parquet".to_string()),
            save_curves_csv: false,
        };
        let written = save_batch(&results(), &output, dir.path()).unwrap();
        assert_eq!(written, vec![dir.path().join("run_results.json")]);
    }
}
