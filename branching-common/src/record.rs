use serde::{Serialize, Deserialize};

/// Identifier of a cell within one run. The seed cell is 0; daughters take the next free ids.
pub type CellId = u64;

/// The two things that can happen to a live cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Division,
    Death,
}

impl EventKind {
    /// Change in live-cell count caused by one event of this kind.
    pub fn population_delta(self) -> i64 {
        match self {
            EventKind::Division => 1,
            EventKind::Death => -1,
        }
    }
}

/// One processed event, appended in processing order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EventLogEntry {
    /// Simulation time at which the event happened.
    pub time: f64,
    pub kind: EventKind,
    /// The cell that divided or died.
    pub cell_id: CellId,
}

impl EventLogEntry {
    pub fn new(time: f64, kind: EventKind, cell_id: CellId) -> Self {
        Self { time, kind, cell_id }
    }
}

/// A point of the population step function.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PopulationPoint {
    pub time: f64,
    pub population: i64,
}

impl PopulationPoint {
    pub const fn new(time: f64, population: i64) -> Self {
        Self { time, population }
    }
}

/// Everything kept from one completed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_index: u32,
    /// Seed of the run's random source, for replaying it.
    pub seed: u64,
    /// Number of events processed.
    pub steps_taken: u64,
    /// True when the run stopped because no further event exists.
    pub terminated: bool,
    /// Live cells at the end of the run.
    pub final_population: usize,
    pub events: Vec<EventLogEntry>,
    pub curve: Vec<PopulationPoint>,
}

/// A run that ended with an error and is excluded from the results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedRun {
    pub run_index: u32,
    pub seed: u64,
    pub reason: String,
}

/// Results of a batch of independent runs, ordered by run index.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchResults {
    pub completed: Vec<RunRecord>,
    pub failed: Vec<FailedRun>,
}

impl BatchResults {
    pub fn total_runs(&self) -> usize {
        self.completed.len() + self.failed.len()
    }

    /// Population curve of every completed run, keyed by run index.
    pub fn curves(&self) -> impl Iterator<Item = (u32, &[PopulationPoint])> + '_ {
        self.completed
            .iter()
            .map(|record| (record.run_index, record.curve.as_slice()))
    }
}
