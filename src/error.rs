//! Unified error types for devcyclesim.

use crate::domain::Phase;
use std::path::PathBuf;
use thiserror::Error;

/// Main application error type
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Simulation error: {0}")]
    Simulation(#[from] SimulationError),

    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Terminal error: {0}")]
    Terminal(String),
}

/// Errors from loading settings, story files and resource plan files
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),
}

/// Invalid simulation input detected before the first day runs
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("Resource plans overlap: days {first_start}-{first_end} and {second_start}-{second_end}")]
    OverlappingPlans {
        first_start: u32,
        first_end: u32,
        second_start: u32,
        second_end: u32,
    },

    #[error("Invalid resource plan interval {start}-{end}")]
    InvalidPlanInterval { start: u32, end: u32 },

    #[error("Story {0} has no tasks")]
    EmptyTaskList(String),

    #[error("Story {story} has a non-positive duration for phase {phase}")]
    InvalidDuration { story: String, phase: Phase },

    #[error("Duplicate story id: {0}")]
    DuplicateStoryId(String),

    #[error("Story {0} must arrive on day 1 or later")]
    InvalidArrivalDay(String),

    #[error("Story {0} must have a positive priority")]
    InvalidPriority(String),

    #[error("Stories cannot be added after the simulation has started")]
    AlreadyStarted,

    #[error("Rework probability must be within 0..=1, got {0}")]
    InvalidReworkProbability(f64),

    #[error("Rework rule after {0} inserts no tasks")]
    EmptyReworkRule(Phase),
}

/// Internal defect: the engine broke one of its own invariants
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invariant violated on day {day}: {message}")]
pub struct InvariantViolation {
    pub day: u32,
    pub message: String,
}

/// Errors surfaced by the simulation engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
}

/// Report rendering and output errors
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("No statistics recorded; run the simulation first")]
    Empty,

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Text formatting error: {0}")]
    Format(#[from] std::fmt::Error),

    #[error("Could not write output file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type alias for engine operations
pub type SimResult<T> = std::result::Result<T, SimulationError>;

/// Result type alias for configuration and input loading
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
