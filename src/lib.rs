//! devcyclesim: Day-stepped simulation of a software development pipeline
//!
//! User stories flow through specification, development, test and rollout
//! under capacity limits that may change over time. The crate reports daily
//! queue statistics and lead times, and ships a terminal viewer for results.

pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod services;
pub mod ui;

pub use app::App;
pub use config::SimulatorConfig;
pub use engine::Process;
pub use error::{AppError, Result};
