use std::fmt;
use thiserror::Error;

/// Which of a cell's two samplers produced a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerRole {
    Division,
    Lifetime,
}

impl fmt::Display for SamplerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SamplerRole::Division => write!(f, "division"),
            SamplerRole::Lifetime => write!(f, "lifetime"),
        }
    }
}

/// Errors that end a single simulation run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    /// The dividable factory never drew a division time before the death time.
    #[error("no dividable cell born at t={born_time} after {attempts} attempts")]
    SamplingExhausted { attempts: u32, born_time: f64 },

    /// A sampler returned NaN or a negative duration.
    #[error("{role} sampler returned {value} for a cell born at t={born_time}")]
    SamplerContractViolation {
        role: SamplerRole,
        born_time: f64,
        value: f64,
    },

    /// Sampler parameters rejected when building the distribution.
    #[error("invalid sampler: {0}")]
    InvalidSampler(String),
}
