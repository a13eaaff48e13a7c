//! Duration samplers consumed by the cell factory.
//!
//! A sampler maps the birth time of a cell to a random duration. The random
//! source is owned by the caller and passed in, so a run is reproducible from
//! its seed and independent runs never share generator state.

use crate::error::SimulationError;
use branching_common::{IntensityConfig, SamplerConfig};
use log::trace;
use rand::distr::Uniform;
use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::{Distribution, Exp, Gamma};

/// Draws a duration for a cell born at `time`.
///
/// Implementations return a non-negative value; `f64::INFINITY` means the
/// event never happens.
pub trait DurationSampler: Send + Sync {
    fn sample(&self, time: f64, rng: &mut StdRng) -> f64;
}

impl<F> DurationSampler for F
where
    F: Fn(f64, &mut StdRng) -> f64 + Send + Sync,
{
    fn sample(&self, time: f64, rng: &mut StdRng) -> f64 {
        self(time, rng)
    }
}

/// Always returns the same duration.
#[derive(Debug, Clone, Copy)]
pub struct FixedDuration(pub f64);

impl DurationSampler for FixedDuration {
    fn sample(&self, _time: f64, _rng: &mut StdRng) -> f64 {
        self.0
    }
}

/// Wraps any `rand` distribution over `f64` that ignores the birth time.
#[derive(Debug, Clone)]
pub struct DistributionSampler<D> {
    dist: D,
}

impl<D> DistributionSampler<D> {
    pub fn new(dist: D) -> Self {
        Self { dist }
    }
}

impl<D> DurationSampler for DistributionSampler<D>
where
    D: Distribution<f64> + Send + Sync,
{
    fn sample(&self, _time: f64, rng: &mut StdRng) -> f64 {
        self.dist.sample(rng)
    }
}

/// Deterministic `amplitude * sin(time) + offset` of the birth time.
#[derive(Debug, Clone, Copy)]
pub struct SinusoidalDuration {
    pub amplitude: f64,
    pub offset: f64,
}

impl DurationSampler for SinusoidalDuration {
    fn sample(&self, time: f64, _rng: &mut StdRng) -> f64 {
        self.amplitude * time.sin() + self.offset
    }
}

/// Time to the first event of an inhomogeneous Poisson process, by thinning.
///
/// Candidates arrive at the bounding rate `gamma_max` and are accepted with
/// probability `intensity / gamma_max`. Gives up after `max_candidates`
/// candidates and reports that no event happens.
#[derive(Debug, Clone)]
pub struct ThinningSampler {
    intensity: IntensityConfig,
    gamma_max: f64,
    max_candidates: u32,
}

impl ThinningSampler {
    /// Rejects a `gamma_max` that does not bound the intensity from above.
    pub fn new(
        intensity: IntensityConfig,
        gamma_max: f64,
        max_candidates: u32,
    ) -> Result<Self, SimulationError> {
        SamplerConfig::Thinning { intensity: intensity.clone(), gamma_max, max_candidates }
            .validate()
            .map_err(|e| SimulationError::InvalidSampler(format!("thinning: {}", e)))?;
        Ok(Self { intensity, gamma_max, max_candidates })
    }
}

impl DurationSampler for ThinningSampler {
    fn sample(&self, time: f64, rng: &mut StdRng) -> f64 {
        let mut tau = 0.0;
        for _ in 0..self.max_candidates {
            // random() is in [0, 1); flip it so the log stays finite.
            let u1: f64 = 1.0 - rng.random::<f64>();
            tau -= u1.ln() / self.gamma_max;
            let u2: f64 = rng.random();
            if u2 <= self.intensity.rate(tau, time) / self.gamma_max {
                return tau;
            }
        }
        trace!(
            "Thinning rejected {} candidates for a cell born at t={:.4}; no event.",
            self.max_candidates,
            time
        );
        f64::INFINITY
    }
}

/// Builds the sampler described by a config table.
///
/// The table is validated first, so a config assembled in code is held to
/// the same rules as one loaded from TOML.
pub fn build_sampler(config: &SamplerConfig) -> Result<Box<dyn DurationSampler>, SimulationError> {
    let invalid = |e: &dyn std::fmt::Display| {
        SimulationError::InvalidSampler(format!("{:?}: {}", config, e))
    };
    config.validate().map_err(|e| invalid(&e))?;

    let sampler: Box<dyn DurationSampler> = match *config {
        SamplerConfig::Fixed { value } => Box::new(FixedDuration(value)),
        SamplerConfig::Uniform { low, high } => {
            let dist = Uniform::new_inclusive(low, high).map_err(|e| invalid(&e))?;
            Box::new(DistributionSampler::new(dist))
        }
        SamplerConfig::Exponential { mean } => {
            let dist = Exp::new(1.0 / mean).map_err(|e| invalid(&e))?;
            Box::new(DistributionSampler::new(dist))
        }
        SamplerConfig::Gamma { shape, scale } => {
            let dist = Gamma::new(shape, scale).map_err(|e| invalid(&e))?;
            Box::new(DistributionSampler::new(dist))
        }
        SamplerConfig::Sinusoidal { amplitude, offset } => {
            Box::new(SinusoidalDuration { amplitude, offset })
        }
        SamplerConfig::Thinning { ref intensity, gamma_max, max_candidates } => {
            Box::new(ThinningSampler::new(intensity.clone(), gamma_max, max_candidates)?)
        }
    };
    Ok(sampler)
}
