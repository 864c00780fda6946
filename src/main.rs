//! devcyclesim: Day-stepped dev-cycle simulation
//!
//! Runs a simulation from the command line, prints or writes the report and
//! optionally opens the terminal viewer on the results.

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use std::io;
use std::panic;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use devcyclesim::cli::{self, Cli, Commands, RunArgs};
use devcyclesim::services::{write_output, SimulationReport};
use devcyclesim::{App, SimulatorConfig};

/// Setup the terminal for TUI mode
fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore the terminal to normal mode
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Initialize logging with RUST_LOG environment variable support
fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

/// Install a panic hook that restores the terminal before printing the panic
fn install_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));
}

fn run(args: &RunArgs, config: &SimulatorConfig) -> Result<()> {
    let mut process = cli::prepare_process(args, config)?;
    process.run().context("simulation failed")?;

    let report = SimulationReport::from_process(&process);
    let rendered = report.render(args.output_format)?;
    write_output(&rendered, args.output_file.as_deref())?;
    if let Some(path) = &args.output_file {
        tracing::info!("Report written to {}", path.display());
    }

    if args.plot {
        view(report, config)?;
    }
    Ok(())
}

/// Open the results viewer until the user quits
fn view(report: SimulationReport, config: &SimulatorConfig) -> Result<()> {
    install_panic_hook();
    let mut terminal = setup_terminal()?;

    let mut app = App::new(report, &config.ui);
    let result = app.run(&mut terminal);

    restore_terminal(&mut terminal)?;
    result.map_err(Into::into)
}

fn execute(cli: &Cli) -> Result<()> {
    let config = cli::load_config(cli)?;
    match &cli.command {
        Commands::Run(args) => run(args, &config),
        Commands::Config => {
            print!("{}", config.describe());
            if let Some(path) = devcyclesim::config::user_config_path() {
                println!("\nUser config: {}", path.display());
            }
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match execute(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
