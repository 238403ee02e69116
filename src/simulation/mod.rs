//! Generation simulation: agents, obstacles and controllers stepped tick by tick

mod controller;
mod generation;

pub use controller::{from_fn, Controller, FnController, HumanController, Observation, TickInput};
pub use generation::{GenerationReport, GenerationSimulator, Participant, RunContext, Termination};
