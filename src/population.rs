use crate::cell::{Cell, CellFactory};
use crate::error::SimulationError;
use branching_common::{CellId, EventKind, EventLogEntry};
use log::trace;
use rand::rngs::StdRng;

/// Live cells in scan order, plus the optional audit trail of dead ones.
///
/// Removal keeps the order of the remaining cells and daughters are appended
/// at the end, so cross-cell ties always resolve the same way.
#[derive(Debug, Clone)]
pub struct Population {
    live: Vec<Cell>,
    dead: Vec<Cell>,
    retain_dead: bool,
    next_id: CellId,
}

impl Population {
    /// A population holding only `seed`.
    pub fn seeded(seed: Cell, retain_dead: bool) -> Self {
        let next_id = seed.id() + 1;
        Self {
            live: vec![seed],
            dead: Vec::new(),
            retain_dead,
            next_id,
        }
    }

    pub fn live(&self) -> &[Cell] {
        &self.live
    }

    /// Dead cells in the order they were removed. Empty unless `retain_dead` is set.
    pub fn dead(&self) -> &[Cell] {
        &self.dead
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Kills the live cell at `index` at its life time.
    pub fn apply_death(&mut self, index: usize) -> EventLogEntry {
        let cell = self.remove(index);
        trace!("Cell {} died at t={:.4}", cell.id(), cell.life_time());
        let entry = EventLogEntry::new(cell.life_time(), EventKind::Death, cell.id());
        self.retire(cell);
        entry
    }

    /// Replaces the live cell at `index` with two daughters born at its division time.
    ///
    /// Daughters are created before the parent is removed, so a sampling
    /// failure leaves the population as it was.
    pub fn apply_division(
        &mut self,
        index: usize,
        factory: &CellFactory,
        rng: &mut StdRng,
    ) -> Result<EventLogEntry, SimulationError> {
        let born_time = self.live[index].division_time();
        let first = factory.create(self.next_id, born_time, rng)?;
        let second = factory.create(self.next_id + 1, born_time, rng)?;
        self.next_id += 2;

        let parent = self.remove(index);
        trace!(
            "Cell {} divided at t={:.4} into cells {} and {}",
            parent.id(),
            born_time,
            first.id(),
            second.id()
        );
        let entry = EventLogEntry::new(born_time, EventKind::Division, parent.id());
        self.retire(parent);
        self.live.push(first);
        self.live.push(second);
        Ok(entry)
    }

    fn remove(&mut self, index: usize) -> Cell {
        let mut cell = self.live.remove(index);
        cell.deactivate();
        cell
    }

    fn retire(&mut self, cell: Cell) {
        if self.retain_dead {
            self.dead.push(cell);
        }
    }
}
