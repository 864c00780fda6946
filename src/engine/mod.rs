//! The day-stepped simulation engine.
//!
//! - ProcessStep: One phase's queue / active set / done queue machine
//! - Process: The day loop, routing and statistics
//! - ReworkModel: Error-rate driven insertion of rework tasks
//!
//! The engine is synchronous and performs no I/O.

mod process;
mod process_step;
mod rework;

pub use process::{Process, RunState};
pub use process_step::{ProcessStep, StepDayOutcome};
pub use rework::{ReworkModel, ReworkRule};
