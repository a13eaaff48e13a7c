use crate::cell::{Cell, CellFactory};
use crate::error::SimulationError;
use crate::population::Population;
use crate::selector::{find_next_event, NextEvent};
use branching_common::{
    population_curve, EventLogEntry, PopulationPoint, RunRecord, SimulationConfig,
};
use log::{debug, trace};
use rand::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};

/// Manages the state and execution of one branching-process run.
///
/// Each step processes exactly one event, so steps must be applied in
/// order. Once no live cell has a finite event time left, the run is
/// terminated and further steps change nothing. A sampler error ends the
/// run as well: the failing step leaves the state untouched and every later
/// step returns the same error.
pub struct CellSimulation {
    /// Builds the seed cell and all daughters.
    factory: CellFactory,
    /// Live cells and the dead-cell audit trail.
    population: Population,
    /// The run's private random source, threaded through every sampler call.
    rng: StdRng,
    /// Processed events in processing order.
    events: Vec<EventLogEntry>,
    /// Number of processed events.
    steps_taken: u64,
    /// Time of the last processed event.
    current_time: f64,
    terminated: bool,
    /// The error that ended the run, if any.
    failed: Option<SimulationError>,
}

impl CellSimulation {
    /// Creates a run whose seed cell is born at time 0.
    pub fn new(
        factory: CellFactory,
        mut rng: StdRng,
        retain_dead: bool,
    ) -> Result<Self, SimulationError> {
        let seed_cell = factory.create(0, 0.0, &mut rng)?;
        debug!(
            "Seed cell: divides at {:.4}, dies at {:.4}, will divide: {}",
            seed_cell.division_time(),
            seed_cell.life_time(),
            seed_cell.will_divide()
        );

        Ok(Self {
            factory,
            population: Population::seeded(seed_cell, retain_dead),
            rng,
            events: Vec::new(),
            steps_taken: 0,
            current_time: 0.0,
            terminated: false,
            failed: None,
        })
    }

    /// Creates a run from a config, with its random source seeded by `seed`.
    pub fn from_config(config: &SimulationConfig, seed: u64) -> Result<Self, SimulationError> {
        let factory = CellFactory::from_config(&config.cells, &config.division, &config.lifetime)?;
        Self::new(factory, StdRng::seed_from_u64(seed), config.cells.retain_dead)
    }

    /// Processes the next event.
    ///
    /// Returns the logged event, or `None` once no event is left.
    pub fn step(&mut self) -> Result<Option<EventLogEntry>, SimulationError> {
        if let Some(err) = &self.failed {
            return Err(err.clone());
        }
        if self.terminated {
            return Ok(None);
        }

        let entry = match find_next_event(self.population.live()) {
            NextEvent::Pass => {
                debug!(
                    "No further events after {} steps (t={:.4}, population {}).",
                    self.steps_taken,
                    self.current_time,
                    self.population.len()
                );
                self.terminated = true;
                return Ok(None);
            }
            NextEvent::Death { index, .. } => self.population.apply_death(index),
            NextEvent::Division { index, .. } => {
                match self.population.apply_division(index, &self.factory, &mut self.rng) {
                    Ok(entry) => entry,
                    Err(err) => {
                        debug!("Run failed after {} steps: {}", self.steps_taken, err);
                        self.failed = Some(err.clone());
                        return Err(err);
                    }
                }
            }
        };

        self.current_time = entry.time;
        self.steps_taken += 1;
        self.events.push(entry);
        trace!(
            "Step {}: {:?} of cell {} at t={:.4}, population {}",
            self.steps_taken,
            entry.kind,
            entry.cell_id,
            entry.time,
            self.population.len()
        );
        Ok(Some(entry))
    }

    /// Steps up to `steps` times, stopping early on termination.
    ///
    /// Returns the number of events processed.
    pub fn run(&mut self, steps: u64) -> Result<u64, SimulationError> {
        self.run_with_cancel(steps, &AtomicBool::new(false))
    }

    /// Like [`run`](Self::run), but checks `cancel` before every step.
    pub fn run_with_cancel(
        &mut self,
        steps: u64,
        cancel: &AtomicBool,
    ) -> Result<u64, SimulationError> {
        let mut processed = 0;
        for _ in 0..steps {
            if cancel.load(Ordering::Relaxed) {
                debug!("Run cancelled after {} of {} steps.", processed, steps);
                break;
            }
            match self.step()? {
                Some(_) => processed += 1,
                None => break,
            }
        }
        Ok(processed)
    }

    /// The `(time, population)` step function, starting at `(0, 1)`.
    pub fn population_curve(&self) -> Vec<PopulationPoint> {
        population_curve(&self.events)
    }

    pub fn event_log(&self) -> &[EventLogEntry] {
        &self.events
    }

    pub fn live_cells(&self) -> &[Cell] {
        self.population.live()
    }

    /// Dead cells, if the run keeps them.
    pub fn dead_cells(&self) -> &[Cell] {
        self.population.dead()
    }

    /// Returns the current number of live cells.
    pub fn population(&self) -> usize {
        self.population.len()
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn steps_taken(&self) -> u64 {
        self.steps_taken
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// The error that ended the run, if a step failed.
    pub fn failure(&self) -> Option<&SimulationError> {
        self.failed.as_ref()
    }

    /// Packs the run's results for saving and analysis.
    pub fn into_record(self, run_index: u32, seed: u64) -> RunRecord {
        RunRecord {
            run_index,
            seed,
            steps_taken: self.steps_taken,
            terminated: self.terminated,
            final_population: self.population.len(),
            curve: population_curve(&self.events),
            events: self.events,
        }
    }
}
