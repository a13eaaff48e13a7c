use crate::record::{EventLogEntry, PopulationPoint};

/// Folds an event log into the population step function.
///
/// The curve starts at `(0, 1)` for the seed cell and gains one point per
/// event, carrying the event's time and the running live-cell count.
pub fn population_curve(events: &[EventLogEntry]) -> Vec<PopulationPoint> {
    let mut curve = Vec::with_capacity(events.len() + 1);
    curve.push(PopulationPoint::new(0.0, 1));

    let mut population = 1;
    for event in events {
        population += event.kind.population_delta();
        curve.push(PopulationPoint::new(event.time, population));
    }
    curve
}
