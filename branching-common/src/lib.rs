pub mod config;
pub mod curve;
pub mod record;
pub mod storage;

// Re-export key types for easier use by dependent crates
pub use config::{
    CellConfig, CellVariant, IntensityConfig, OutputConfig, RunConfig, SamplerConfig,
    SimulationConfig, TimeContract, DEFAULT_MAX_ATTEMPTS,
};
pub use curve::population_curve;
pub use record::{
    BatchResults, CellId, EventKind, EventLogEntry, FailedRun, PopulationPoint, RunRecord,
};
pub use storage::{read_results, write_results, ResultFormat};
