//! PNCP Monitor - terminal dashboard and ingestion monitor for municipal
//! procurements published on the Portal Nacional de Contratações Públicas
//!
//! Entry point: CLI parsing, logging, terminal setup for the dashboard.

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::fs::OpenOptions;
use std::io;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

mod api;
mod app;
mod cli;
mod commands;
mod config;
mod format;
mod loader;
mod monitor;
mod notifier;
mod store;
mod themes;
mod ui;
mod views;
mod widgets;

use app::App;
use cli::{Cli, Commands};
use config::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;
    let command = cli.command.unwrap_or(Commands::Dashboard);

    let interactive = command == Commands::Dashboard;
    init_tracing(&settings, interactive)?;

    if !interactive {
        return commands::execute(command, &settings, cli.json).await;
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    // Create and run app
    let result = App::new(settings).and_then(|mut app| app.run());

    // Restore terminal
    disable_raw_mode()?;
    execute!(stdout, LeaveAlternateScreen, DisableMouseCapture)?;

    result
}

/// The dashboard owns the terminal, so it logs to `log_file`; commands log to stderr
fn init_tracing(settings: &Settings, interactive: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if interactive {
        if let Some(parent) = settings.log_file.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating log directory {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&settings.log_file)
            .with_context(|| format!("opening log file {}", settings.log_file.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    }
    Ok(())
}
