//! Command-line interface and run preparation.

use crate::config::SimulatorConfig;
use crate::domain::ResourcePlanSchedule;
use crate::engine::{Process, ReworkRule};
use crate::error::{AppError, ConfigError, Result, SimulationError};
use crate::services::{loader, OutputFormat, StoryGenerator};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Day-stepped simulation of a spec → dev → test → rollout pipeline
#[derive(Debug, Parser)]
#[command(name = "devcyclesim")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Settings file used instead of the layered configuration
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run a simulation and report the results
    Run(RunArgs),

    /// Print the effective configuration
    Config,
}

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Simulation duration in days
    #[arg(short, long)]
    pub duration: Option<u32>,

    /// Resource plan as "start-end:spec,dev,test,rollout" (repeatable)
    #[arg(short = 'r', long = "resource-plan", value_name = "PLAN")]
    pub resource_plans: Vec<String>,

    /// JSON file with resource plans
    #[arg(long, value_name = "FILE")]
    pub resource_plans_file: Option<PathBuf>,

    /// JSON file with user stories
    #[arg(short, long, value_name = "FILE", conflicts_with = "generate_stories")]
    pub stories_file: Option<PathBuf>,

    /// Number of stories to generate
    #[arg(short, long, value_name = "N")]
    pub generate_stories: Option<usize>,

    /// Random seed for reproducible results
    #[arg(long)]
    pub seed: Option<u64>,

    /// Probability that a story fails test and needs one more dev and test day
    #[arg(long, value_name = "P")]
    pub rework_rate: Option<f64>,

    /// Output format
    #[arg(short = 't', long, value_enum, default_value_t = OutputFormat::Text)]
    pub output_format: OutputFormat,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output_file: Option<PathBuf>,

    /// Open the interactive results viewer
    #[arg(short, long)]
    pub plot: bool,
}

/// Build a ready-to-run process from command-line arguments on top of the
/// loaded configuration
pub fn prepare_process(args: &RunArgs, config: &SimulatorConfig) -> Result<Process> {
    let days = args.duration.unwrap_or(config.simulation.duration_days);
    if days == 0 {
        return Err(ConfigError::Invalid("duration must be at least 1 day".to_string()).into());
    }

    let mut plans = Vec::new();
    if let Some(path) = &args.resource_plans_file {
        plans.extend(loader::load_resource_plans(path)?);
    }
    for plan in &args.resource_plans {
        plans.push(loader::parse_resource_plan(plan)?);
    }
    let schedule =
        ResourcePlanSchedule::new(plans, config.capacity).map_err(SimulationError::from)?;

    let seed = args.seed.or(config.simulation.seed);
    let stories = match (&args.stories_file, args.generate_stories) {
        (Some(path), _) => loader::load_stories(path)?,
        (None, Some(count)) => StoryGenerator::new(config.generator.clone(), seed)
            .generate(count)
            .map_err(SimulationError::from)?,
        (None, None) => {
            tracing::warn!("no stories given, the pipeline stays empty");
            Vec::new()
        }
    };

    let mut rework = config.rework.clone();
    if let Some(rate) = args.rework_rate {
        rework.rules.push(ReworkRule::failed_test(rate));
    }
    let model = rework
        .build_model(seed.unwrap_or_else(rand::random))
        .map_err(SimulationError::from)?;

    let mut process = Process::new(days, schedule).with_rework(model);
    process.add_all(stories).map_err(SimulationError::from)?;
    Ok(process)
}

/// Load settings from `--config` or the layered sources
pub fn load_config(cli: &Cli) -> std::result::Result<SimulatorConfig, AppError> {
    let config = match &cli.config {
        Some(path) => SimulatorConfig::load_file(path)?,
        None => {
            let cwd = std::env::current_dir()?;
            SimulatorConfig::load(Some(&cwd))?
        }
    };
    Ok(config)
}
