use crate::record::BatchResults;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// On-disk encodings for batch results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultFormat {
    Json,
    Bincode,
    MessagePack,
}

impl ResultFormat {
    /// Parses a config format name. Unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "json" => Some(ResultFormat::Json),
            "bincode" => Some(ResultFormat::Bincode),
            "messagepack" => Some(ResultFormat::MessagePack),
            _ => None,
        }
    }

    /// Guesses the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "json" => Some(ResultFormat::Json),
            "bin" => Some(ResultFormat::Bincode),
            "msgpack" => Some(ResultFormat::MessagePack),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ResultFormat::Json => "json",
            ResultFormat::Bincode => "bin",
            ResultFormat::MessagePack => "msgpack",
        }
    }
}

/// Writes batch results to `path` in the given format.
pub fn write_results(path: &Path, results: &BatchResults, format: ResultFormat) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create results file '{}'", path.display()))?;
    let mut writer = BufWriter::new(file);

    match format {
        ResultFormat::Json => serde_json::to_writer(&mut writer, results)
            .context("Failed to serialize results to JSON")?,
        ResultFormat::Bincode => bincode::serialize_into(&mut writer, results)
            .context("Failed to serialize results to bincode")?,
        ResultFormat::MessagePack => rmp_serde::encode::write(&mut writer, results)
            .context("Failed to serialize results to MessagePack")?,
    }
    writer.flush()?;
    Ok(())
}

/// Reads batch results, choosing the decoder from the file extension.
pub fn read_results(path: &Path) -> Result<BatchResults> {
    let format = ResultFormat::from_path(path).with_context(|| {
        format!(
            "Cannot infer results format from '{}' (expected .json, .bin or .msgpack)",
            path.display()
        )
    })?;
    let file = File::open(path)
        .with_context(|| format!("Failed to open results file '{}'", path.display()))?;
    let reader = BufReader::new(file);

    let results = match format {
        ResultFormat::Json => {
            serde_json::from_reader(reader).context("Failed to parse JSON results")?
        }
        ResultFormat::Bincode => {
            bincode::deserialize_from(reader).context("Failed to parse bincode results")?
        }
        ResultFormat::MessagePack => {
            rmp_serde::decode::from_read(reader).context("Failed to parse MessagePack results")?
        }
    };
    Ok(results)
}
