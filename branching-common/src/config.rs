use serde::{Deserialize, Serialize};
use anyhow::Result;
use std::path::Path;

/// Retry bound for the dividable cell variant.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 100;

// Budget and seeding for a batch of independent runs
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct RunConfig {
    /// Maximum number of events processed per run.
    pub steps: u64,
    /// Number of independent runs in a batch.
    pub runs: u32,
    /// Base seed; each run derives its own seed from this and its index.
    pub seed: u64,
    /// Size of the rayon pool. Uses the rayon default when absent.
    #[serde(default)]
    pub threads: Option<usize>,
}

/// How a new cell's life and division times are initialized.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CellVariant {
    /// Both times sampled; the cell divides only if division comes first.
    Normal,
    /// Lifetime fixed to infinity; the cell always divides eventually.
    Immortal,
    /// Resampled until division strictly precedes death.
    Dividable,
}

/// How a sampler's return value is turned into an absolute event time.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TimeContract {
    /// The sample is a duration added to the birth time.
    DurationFromBirth,
    /// The sample is already an absolute simulation time.
    Absolute,
}

// Cell construction settings, loaded from the [cells] table
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct CellConfig {
    #[serde(default = "default_variant")]
    pub variant: CellVariant,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_time_contract")]
    pub time_contract: TimeContract,
    /// Keep dead cells around for auditing.
    #[serde(default = "default_retain_dead")]
    pub retain_dead: bool,
}

fn default_variant() -> CellVariant {
    CellVariant::Normal
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_time_contract() -> TimeContract {
    TimeContract::DurationFromBirth
}

fn default_retain_dead() -> bool {
    true
}

impl Default for CellConfig {
    fn default() -> Self {
        CellConfig {
            variant: default_variant(),
            max_attempts: default_max_attempts(),
            time_contract: default_time_contract(),
            retain_dead: default_retain_dead(),
        }
    }
}

/// Rate function of an inhomogeneous Poisson process, sampled by thinning.
///
/// `elapsed` is the time since the cell was born.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum IntensityConfig {
    Constant { rate: f64 },
    /// `amplitude * sin(2π elapsed / period) + offset`
    Sinusoidal { amplitude: f64, period: f64, offset: f64 },
    /// `initial * exp(-elapsed / scale)`
    ExponentialDecay { initial: f64, scale: f64 },
    /// `amplitude * sin(2 elapsed + born_time) + offset`; depends on the birth time too.
    PhaseShiftedSine { amplitude: f64, offset: f64 },
}

impl IntensityConfig {
    /// Evaluates the rate for a cell born at `born_time`, `elapsed` after its birth.
    pub fn rate(&self, elapsed: f64, born_time: f64) -> f64 {
        match *self {
            IntensityConfig::Constant { rate } => rate,
            IntensityConfig::Sinusoidal { amplitude, period, offset } => {
                amplitude * (2.0 * std::f64::consts::PI * elapsed / period).sin() + offset
            }
            IntensityConfig::ExponentialDecay { initial, scale } => {
                initial * (-elapsed / scale).exp()
            }
            IntensityConfig::PhaseShiftedSine { amplitude, offset } => {
                amplitude * (elapsed + born_time + elapsed).sin() + offset
            }
        }
    }

    /// Supremum of the rate over all times.
    pub fn upper_bound(&self) -> f64 {
        match *self {
            IntensityConfig::Constant { rate } => rate,
            IntensityConfig::Sinusoidal { amplitude, offset, .. }
            | IntensityConfig::PhaseShiftedSine { amplitude, offset } => amplitude.abs() + offset,
            IntensityConfig::ExponentialDecay { initial, .. } => initial,
        }
    }

    /// Infimum of the rate over all times.
    fn lower_bound(&self) -> f64 {
        match *self {
            IntensityConfig::Constant { rate } => rate,
            IntensityConfig::Sinusoidal { amplitude, offset, .. }
            | IntensityConfig::PhaseShiftedSine { amplitude, offset } => offset - amplitude.abs(),
            IntensityConfig::ExponentialDecay { .. } => 0.0,
        }
    }

    fn validate(&self) -> Result<()> {
        if let IntensityConfig::Sinusoidal { period, .. } = self {
            if !(*period > 0.0) {
                anyhow::bail!("sinusoidal intensity period must be positive, got {}.", period);
            }
        }
        if let IntensityConfig::ExponentialDecay { scale, .. } = self {
            if !(*scale > 0.0) {
                anyhow::bail!("exponential decay scale must be positive, got {}.", scale);
            }
        }
        if !(self.lower_bound() >= 0.0) || !self.upper_bound().is_finite() {
            anyhow::bail!("intensity {:?} must stay finite and non-negative.", self);
        }
        Ok(())
    }
}

/// A duration distribution, selected with the `kind` key.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SamplerConfig {
    /// Always the same duration. `inf` means the event never happens.
    Fixed { value: f64 },
    Uniform { low: f64, high: f64 },
    Exponential { mean: f64 },
    Gamma { shape: f64, scale: f64 },
    /// `amplitude * sin(born_time) + offset`
    Sinusoidal { amplitude: f64, offset: f64 },
    /// First event of an inhomogeneous Poisson process, by thinning against `gamma_max`.
    Thinning {
        intensity: IntensityConfig,
        gamma_max: f64,
        #[serde(default = "default_max_candidates")]
        max_candidates: u32,
    },
}

fn default_max_candidates() -> u32 {
    1_000_000
}

impl SamplerConfig {
    /// Checks that the parameters describe a distribution over non-negative durations.
    pub fn validate(&self) -> Result<()> {
        match self {
            SamplerConfig::Fixed { value } => {
                if value.is_nan() || *value < 0.0 {
                    anyhow::bail!("fixed duration must be non-negative, got {}.", value);
                }
            }
            SamplerConfig::Uniform { low, high } => {
                if !(*low >= 0.0 && low <= high && high.is_finite()) {
                    anyhow::bail!(
                        "uniform bounds must satisfy 0 <= low <= high < inf, got [{}, {}].",
                        low,
                        high
                    );
                }
            }
            SamplerConfig::Exponential { mean } => {
                if !(*mean > 0.0 && mean.is_finite()) {
                    anyhow::bail!("exponential mean must be positive and finite, got {}.", mean);
                }
            }
            SamplerConfig::Gamma { shape, scale } => {
                if !(*shape > 0.0 && *scale > 0.0) {
                    anyhow::bail!(
                        "gamma shape and scale must be positive, got shape={} scale={}.",
                        shape,
                        scale
                    );
                }
            }
            SamplerConfig::Sinusoidal { amplitude, offset } => {
                if !(*offset >= amplitude.abs()) {
                    anyhow::bail!(
                        "sinusoidal offset ({}) must be at least |amplitude| ({}).",
                        offset,
                        amplitude
                    );
                }
            }
            SamplerConfig::Thinning { intensity, gamma_max, max_candidates } => {
                if !(*gamma_max > 0.0 && gamma_max.is_finite()) {
                    anyhow::bail!("gamma_max must be positive and finite, got {}.", gamma_max);
                }
                if *max_candidates == 0 {
                    anyhow::bail!("max_candidates must be greater than 0.");
                }
                intensity.validate()?;
                if intensity.upper_bound() > *gamma_max {
                    anyhow::bail!(
                        "gamma_max ({}) must bound the intensity (sup = {}).",
                        gamma_max,
                        intensity.upper_bound()
                    );
                }
            }
        }
        Ok(())
    }
}

// Configuration for output settings, loaded from the [output] table
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct OutputConfig {
    pub base_filename: String,
    pub save_results: bool,
    pub format: Option<String>, // Output format: "json", "bincode", "messagepack"
    #[serde(default)]
    pub save_curves_csv: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            base_filename: "branching".to_string(),
            save_results: true,
            format: Some("json".to_string()),
            save_curves_csv: false,
        }
    }
}

// Main simulation configuration structure, loaded from config.toml.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SimulationConfig {
    pub run: RunConfig,
    #[serde(default)]
    pub cells: CellConfig,
    pub division: SamplerConfig,
    pub lifetime: SamplerConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            run: RunConfig { steps: 200, runs: 40, seed: 0, threads: None },
            cells: CellConfig::default(),
            division: SamplerConfig::Exponential { mean: 5.0 },
            lifetime: SamplerConfig::Exponential { mean: 15.0 },
            output: OutputConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Loads the simulation configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let config_str = std::fs::read_to_string(path_ref)
            .map_err(|e| {
                anyhow::anyhow!("Failed to read config file '{}': {}", path_ref.display(), e)
            })?;
        let config = Self::from_toml_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Invalid config '{}': {}", path_ref.display(), e))?;

        Ok(config)
    }

    /// Parses and validates a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.run.runs == 0 {
            anyhow::bail!("runs must be greater than 0.");
        }
        if self.run.threads == Some(0) {
            anyhow::bail!("threads must be greater than 0 when set.");
        }
        if self.cells.max_attempts == 0 {
            anyhow::bail!("max_attempts must be greater than 0.");
        }
        self.division
            .validate()
            .map_err(|e| anyhow::anyhow!("[division] {}", e))?;
        self.lifetime
            .validate()
            .map_err(|e| anyhow::anyhow!("[lifetime] {}", e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_CONFIG: &str = r#"
        [run]
        steps = 500
        runs = 8
        seed = 42
        threads = 2

        [cells]
        variant = "dividable"
        time_contract = "absolute"
        retain_dead = false

        [division]
        kind = "thinning"
        gamma_max = 10.0

        [division.intensity]
        shape = "sinusoidal"
        amplitude = 5.0
        period = 10.0
        offset = 5.0

        [lifetime]
        kind = "fixed"
        value = inf

        [output]
        base_filename = "growth"
        save_results = true
        format = "bincode"
        save_curves_csv = true
    "#;

    #[test]
    fn parses_full_config() {
        let config = SimulationConfig::from_toml_str(FULL_CONFIG).unwrap();
        assert_eq!(config.run.steps, 500);
        assert_eq!(config.run.threads, Some(2));
        assert_eq!(config.cells.variant, CellVariant::Dividable);
        assert_eq!(config.cells.max_attempts, DEFAULT_MAX_ATTEMPTS);
        assert_eq!(config.cells.time_contract, TimeContract::Absolute);
        assert!(!config.cells.retain_dead);
        assert_eq!(
            config.division,
            SamplerConfig::Thinning {
                intensity: IntensityConfig::Sinusoidal {
                    amplitude: 5.0,
                    period: 10.0,
                    offset: 5.0,
                },
                gamma_max: 10.0,
                max_candidates: 1_000_000,
            }
        );
        match config.lifetime {
            SamplerConfig::Fixed { value } => assert!(value.is_infinite()),
            other => panic!("unexpected lifetime sampler {:?}", other),
        }
        assert_eq!(config.output.format.as_deref(), Some("bincode"));
    }

    #[test]
    fn missing_sections_use_defaults() {
        let text = r#"
            [run]
            steps = 10
            runs = 1
            seed = 7

            [division]
            kind = "exponential"
            mean = 5.0

            [lifetime]
            kind = "gamma"
            shape = 2.0
            scale = 3.0
        "#;
        let config = SimulationConfig::from_toml_str(text).unwrap();
        assert_eq!(config.cells.variant, CellVariant::Normal);
        assert_eq!(config.cells.time_contract, TimeContract::DurationFromBirth);
        assert!(config.cells.retain_dead);
        assert_eq!(config.output.base_filename, "branching");
    }

    #[test]
    fn rejects_zero_runs() {
        let mut config = SimulationConfig::default();
        config.run.runs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_unbounded_thinning_intensity() {
        let sampler = SamplerConfig::Thinning {
            intensity: IntensityConfig::Constant { rate: 12.0 },
            gamma_max: 10.0,
            max_candidates: 100,
        };
        assert!(sampler.validate().is_err());
    }

    #[test]
    fn rejects_negative_sinusoidal_durations() {
        let sampler = SamplerConfig::Sinusoidal { amplitude: 10.0, offset: 5.0 };
        assert!(sampler.validate().is_err());
        let sampler = SamplerConfig::Sinusoidal { amplitude: 10.0, offset: 10.0 };
        assert!(sampler.validate().is_ok());
    }

    #[test]
    fn phase_shifted_sine_depends_on_birth_time() {
        let intensity = IntensityConfig::PhaseShiftedSine { amplitude: 5.0, offset: 5.0 };
        let a = intensity.rate(0.5, 0.0);
        let b = intensity.rate(0.5, 1.0);
        assert!((a - (5.0 * 1.0f64.sin() + 5.0)).abs() < 1e-12);
        assert!((b - (5.0 * 2.0f64.sin() + 5.0)).abs() < 1e-12);
    }
}
