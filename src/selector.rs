use crate::cell::Cell;
use branching_common::EventKind;

/// The earliest pending event across the live population.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NextEvent {
    /// The cell at `index` divides at `time`.
    Division { index: usize, time: f64 },
    /// The cell at `index` dies at `time`.
    Death { index: usize, time: f64 },
    /// No live cell has a finite event time left.
    Pass,
}

impl NextEvent {
    pub fn kind(&self) -> Option<EventKind> {
        match self {
            NextEvent::Division { .. } => Some(EventKind::Division),
            NextEvent::Death { .. } => Some(EventKind::Death),
            NextEvent::Pass => None,
        }
    }

    pub fn time(&self) -> Option<f64> {
        match *self {
            NextEvent::Division { time, .. } | NextEvent::Death { time, .. } => Some(time),
            NextEvent::Pass => None,
        }
    }
}

/// Scans `cells` in order and returns the globally earliest event.
///
/// Candidates are every live cell's death time and the division time of live
/// cells that will divide. Comparisons are strict, so among equal times the
/// first cell in scan order wins, and infinite times are never selected. The
/// division check runs after the death check for the same cell.
pub fn find_next_event(cells: &[Cell]) -> NextEvent {
    let mut next_time = f64::INFINITY;
    let mut next = NextEvent::Pass;

    for (index, cell) in cells.iter().enumerate() {
        if !cell.is_alive() {
            continue;
        }

        if cell.life_time() < next_time {
            next_time = cell.life_time();
            next = NextEvent::Death { index, time: next_time };
        }

        if cell.will_divide() && cell.division_time() < next_time {
            next_time = cell.division_time();
            next = NextEvent::Division { index, time: next_time };
        }
    }

    next
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_population_passes() {
        assert_eq!(find_next_event(&[]), NextEvent::Pass);
    }

    #[test]
    fn picks_earliest_death() {
        let cells = [Cell::new(0, 0.0, 5.0, 9.0), Cell::new(1, 0.0, 3.0, 9.0)];
        assert_eq!(find_next_event(&cells), NextEvent::Death { index: 1, time: 3.0 });
    }

    #[test]
    fn division_beats_own_later_death() {
        let cells = [Cell::new(0, 0.0, 5.0, 2.0)];
        assert_eq!(find_next_event(&cells), NextEvent::Division { index: 0, time: 2.0 });
    }

    #[test]
    fn ignores_division_time_of_non_dividing_cell() {
        // Division at 1 is after death at 0.5 for cell 0, so only its death counts.
        let cells = [Cell::new(0, 0.0, 0.5, 1.0), Cell::new(1, 0.0, 4.0, 0.75)];
        assert_eq!(find_next_event(&cells), NextEvent::Death { index: 0, time: 0.5 });
    }

    #[test]
    fn ties_across_cells_go_to_first_in_scan_order() {
        let cells = [
            Cell::new(0, 0.0, 4.0, 9.0),
            Cell::new(1, 0.0, 4.0, 9.0),
            Cell::new(2, 0.0, 9.0, 4.0),
        ];
        assert_eq!(find_next_event(&cells), NextEvent::Death { index: 0, time: 4.0 });

        let cells = [Cell::immortal(0, 0.0, 2.0), Cell::immortal(1, 0.0, 2.0)];
        assert_eq!(find_next_event(&cells), NextEvent::Division { index: 0, time: 2.0 });
    }

    #[test]
    fn dead_cells_are_skipped() {
        let mut early = Cell::new(0, 0.0, 1.0, 9.0);
        early.deactivate();
        let cells = [early, Cell::new(1, 0.0, 6.0, 9.0)];
        assert_eq!(find_next_event(&cells), NextEvent::Death { index: 1, time: 6.0 });
    }

    #[test]
    fn infinite_times_pass() {
        let cells = [
            Cell::new(0, 0.0, f64::INFINITY, f64::INFINITY),
            Cell::immortal(1, 0.0, f64::INFINITY),
        ];
        assert_eq!(find_next_event(&cells), NextEvent::Pass);
    }

    #[test]
    fn immortal_cell_only_divides() {
        let cells = [Cell::immortal(0, 0.0, 7.0)];
        let next = find_next_event(&cells);
        assert_eq!(next.kind(), Some(EventKind::Division));
        assert_eq!(next.time(), Some(7.0));
    }
}
