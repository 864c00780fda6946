//! Input and output services around the engine.
//!
//! This module contains:
//! - loader: Stories and resource plans from JSON files and plan strings
//! - StoryGenerator: Seeded random stories
//! - SimulationReport: Text, JSON and CSV rendering of a run

pub mod generator;
pub mod loader;
pub mod report;

pub use generator::StoryGenerator;
pub use report::{write_output, OutputFormat, SimulationReport};
