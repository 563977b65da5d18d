#![allow(dead_code)]

use anyhow::Context;
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::time::Duration;

mod app;
mod aqi;
mod cli;
mod config;
mod demo;
mod error;
mod logging;
mod owm;
mod source;
mod units;
mod weather;

use crate::app::{run_app, App};
use crate::cli::Args;
use crate::config::Settings;
use crate::source::Source;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_path = args.log_file.clone().or_else(logging::default_path);
    if let Err(err) = logging::init(log_path.as_deref(), &args.log_level) {
        eprintln!("logging disabled: {err:#}");
    }

    let settings_path = args.config.clone().or_else(Settings::default_path);
    let mut settings = match &settings_path {
        Some(path) => Settings::load(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => Settings::default(),
    };
    if args.apply(&mut settings) {
        if let Some(path) = &settings_path {
            settings.save(path)?;
        }
    }
    let query = args.query(&settings);

    if args.json {
        let mut source = Source::from_settings(&settings, args.seed);
        let snapshot = source.fetch(&query, settings.units)?;
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    let mut app = App::new(
        settings,
        settings_path,
        args.seed,
        query,
        Duration::from_secs(args.refresh_secs.max(1)),
    );

    // setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // create app and run it
    let res = run_app(&mut terminal, &mut app);

    // restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = %err, "dashboard exited with an error");
        println!("{:?}", err)
    }

    Ok(())
}
