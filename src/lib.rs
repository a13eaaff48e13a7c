//! Discrete-event simulation of a stochastic branching process.
//!
//! A population starts from one seed cell. Every cell samples a division
//! time and a death time at birth; the engine repeatedly applies the
//! earliest pending event across the population, replacing a dividing cell
//! with two daughters or removing a dying one, and logs each event so the
//! population curve can be rebuilt.

pub mod batch;
pub mod cell;
pub mod error;
pub mod output;
pub mod population;
pub mod sampler;
pub mod selector;
pub mod simulation;

pub use batch::{run_batch, run_single, seed_for_run};
pub use cell::{Cell, CellFactory};
pub use error::{SamplerRole, SimulationError};
pub use sampler::{build_sampler, DurationSampler, FixedDuration};
pub use selector::{find_next_event, NextEvent};
pub use simulation::CellSimulation;
