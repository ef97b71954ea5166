use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;
use std::{error::Error, io};
use tracing_subscriber::EnvFilter;

mod app;
mod cities;
mod cli;
mod config;
mod debounce;
mod error;
mod icons;
mod owm;
mod suggest;
mod units;
mod weather;
mod worker;

use crate::app::{run_app, App};
use crate::config::{Config, APP_NAME};
use crate::worker::{HttpServices, Worker};

fn default_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_NAME)
        .join(format!("{APP_NAME}.log"))
}

/// The terminal belongs to the UI, so logs go to a file.
fn init_logging(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = File::options().create(true).append(true).open(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = cli::Args::parse();

    let log_path = args.log_file.clone().unwrap_or_else(default_log_path);
    init_logging(&log_path)?;

    let config_path = match args.config {
        Some(path) => path,
        None => Config::default_path()?,
    };
    // What is on disk, without env or command line overrides
    let mut stored = Config::load(&config_path)?;
    let mut config = stored.clone();
    config.apply_env();
    if let Some(units) = args.units {
        config.units = units;
    }
    tracing::info!(config = %config_path.display(), units = ?config.units, "starting");

    let worker = Worker::spawn(HttpServices::new(&config)?)?;
    let mut app = App::new(config.units, config.debounce(), config.refresh_interval());
    if let Some(city) = args.city.or_else(|| config.last_city.clone()) {
        worker.send(app.request_weather(&city, Instant::now()))?;
    }

    // setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app, &worker, |city| {
        stored.last_city = Some(city.to_string());
        if let Err(e) = stored.save(&config_path) {
            tracing::warn!(error = %e, "could not remember last city");
        }
    });

    // restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    finish(res)
}

/// Log a failed run and hand the error back, so the process exits non-zero.
fn finish(res: error::Result<()>) -> Result<(), Box<dyn Error>> {
    if let Err(err) = res {
        tracing::error!(error = %err, "exiting");
        return Err(err.into());
    }
    Ok(())
}
