use crate::error::{SamplerRole, SimulationError};
use crate::sampler::{build_sampler, DurationSampler};
use branching_common::{
    CellConfig, CellId, CellVariant, SamplerConfig, TimeContract, DEFAULT_MAX_ATTEMPTS,
};
use log::trace;
use rand::rngs::StdRng;

/// One cell between its birth and its division or death.
///
/// Times are absolute simulation times. `will_divide` is fixed at creation:
/// a cell whose division time is not before its death time can only die.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    id: CellId,
    born_time: f64,
    life_time: f64,
    division_time: f64,
    is_alive: bool,
    will_divide: bool,
}

impl Cell {
    /// A live cell that dies at `life_time` unless it divides at `division_time` first.
    pub fn new(id: CellId, born_time: f64, life_time: f64, division_time: f64) -> Self {
        Self {
            id,
            born_time,
            life_time,
            division_time,
            is_alive: true,
            will_divide: division_time < life_time,
        }
    }

    /// A live cell that never dies of age and always divides at `division_time`.
    pub fn immortal(id: CellId, born_time: f64, division_time: f64) -> Self {
        Self {
            id,
            born_time,
            life_time: f64::INFINITY,
            division_time,
            is_alive: true,
            will_divide: true,
        }
    }

    pub fn id(&self) -> CellId {
        self.id
    }

    pub fn born_time(&self) -> f64 {
        self.born_time
    }

    pub fn life_time(&self) -> f64 {
        self.life_time
    }

    pub fn division_time(&self) -> f64 {
        self.division_time
    }

    pub fn is_alive(&self) -> bool {
        self.is_alive
    }

    pub fn will_divide(&self) -> bool {
        self.will_divide
    }

    /// Marks the cell dead. Only the population handlers call this, once per cell.
    pub(crate) fn deactivate(&mut self) {
        debug_assert!(self.is_alive, "cell {} deactivated twice", self.id);
        self.is_alive = false;
    }
}

/// Creates cells from a division sampler, a lifetime sampler and a variant.
pub struct CellFactory {
    variant: CellVariant,
    time_contract: TimeContract,
    max_attempts: u32,
    division: Box<dyn DurationSampler>,
    lifetime: Box<dyn DurationSampler>,
}

impl CellFactory {
    /// A factory using the `duration_from_birth` contract and the default retry bound.
    pub fn new(
        variant: CellVariant,
        division: Box<dyn DurationSampler>,
        lifetime: Box<dyn DurationSampler>,
    ) -> Self {
        Self {
            variant,
            time_contract: TimeContract::DurationFromBirth,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            division,
            lifetime,
        }
    }

    pub fn with_time_contract(mut self, time_contract: TimeContract) -> Self {
        self.time_contract = time_contract;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Builds the factory and both samplers from config tables.
    pub fn from_config(
        cells: &CellConfig,
        division: &SamplerConfig,
        lifetime: &SamplerConfig,
    ) -> Result<Self, SimulationError> {
        Ok(Self::new(cells.variant, build_sampler(division)?, build_sampler(lifetime)?)
            .with_time_contract(cells.time_contract)
            .with_max_attempts(cells.max_attempts))
    }

    pub fn variant(&self) -> CellVariant {
        self.variant
    }

    /// Creates a live cell born at `born_time`.
    pub fn create(
        &self,
        id: CellId,
        born_time: f64,
        rng: &mut StdRng,
    ) -> Result<Cell, SimulationError> {
        match self.variant {
            CellVariant::Normal => self.create_normal(id, born_time, rng),
            CellVariant::Immortal => {
                let division_time = self.event_time(SamplerRole::Division, born_time, rng)?;
                Ok(Cell::immortal(id, born_time, division_time))
            }
            CellVariant::Dividable => self.create_dividable(id, born_time, rng),
        }
    }

    fn create_normal(
        &self,
        id: CellId,
        born_time: f64,
        rng: &mut StdRng,
    ) -> Result<Cell, SimulationError> {
        let life_time = self.event_time(SamplerRole::Lifetime, born_time, rng)?;
        let division_time = self.event_time(SamplerRole::Division, born_time, rng)?;
        Ok(Cell::new(id, born_time, life_time, division_time))
    }

    fn create_dividable(
        &self,
        id: CellId,
        born_time: f64,
        rng: &mut StdRng,
    ) -> Result<Cell, SimulationError> {
        for attempt in 1..=self.max_attempts {
            let cell = self.create_normal(id, born_time, rng)?;
            if cell.life_time > cell.division_time {
                return Ok(cell);
            }
            trace!(
                "Cell {} attempt {}: division at {:.4} not before death at {:.4}, resampling.",
                id,
                attempt,
                cell.division_time,
                cell.life_time
            );
        }
        Err(SimulationError::SamplingExhausted {
            attempts: self.max_attempts,
            born_time,
        })
    }

    /// Samples one absolute event time under the configured time contract.
    fn event_time(
        &self,
        role: SamplerRole,
        born_time: f64,
        rng: &mut StdRng,
    ) -> Result<f64, SimulationError> {
        let sampler = match role {
            SamplerRole::Division => &self.division,
            SamplerRole::Lifetime => &self.lifetime,
        };
        let value = sampler.sample(born_time, rng);
        let duration = match self.time_contract {
            TimeContract::DurationFromBirth => value,
            TimeContract::Absolute => value - born_time,
        };
        // NaN fails this comparison too.
        if !(duration >= 0.0) {
            return Err(SimulationError::SamplerContractViolation { role, born_time, value });
        }
        Ok(match self.time_contract {
            TimeContract::DurationFromBirth => born_time + value,
            TimeContract::Absolute => value,
        })
    }
}
