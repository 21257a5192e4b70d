//! `drillbook`: headless driver for the drill canvas.
//!
//! Loads a show file, applies the user's preferences and env tuning, and
//! runs one command against the canvas: list pages, export a page as SVG,
//! or move marchers through the canvas drag path and save the result.

mod config;
mod host;
mod prefs;
mod show;

#[cfg(test)]
#[path = "main_test.rs"]
mod main_test;

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use drill_canvas::doc::{DrillStore, MarcherId, PageId};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::host::Session;
use crate::show::ShowStore;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    Prefs(#[from] prefs::PrefsError),
    #[error(transparent)]
    Show(#[from] show::ShowError),
    #[error(transparent)]
    Host(#[from] host::HostError),
    #[error("--prefs is required for this command")]
    NoPrefsPath,
    #[error("--show is required for this command")]
    NoShowPath,
    #[error("failed to write {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Parser, Debug)]
#[command(name = "drillbook", about = "Headless drill canvas driver")]
struct Cli {
    /// Show file (JSON); required by every command except `init-prefs`.
    #[arg(long, env = "DRILL_SHOW")]
    show: Option<PathBuf>,

    /// Preferences file (JSON); defaults apply when absent.
    #[arg(long, env = "DRILL_PREFS")]
    prefs: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List pages with their marcher counts and locked marchers.
    Pages,
    /// Render a page and write the full field as SVG.
    Export {
        /// Page to render; the show's current page when omitted.
        #[arg(long)]
        page: Option<PageId>,
        /// Output file; stdout when omitted.
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
    /// Drag marchers by whole steps and save the show.
    Move {
        #[arg(long)]
        page: Option<PageId>,
        /// Comma-separated marcher ids.
        #[arg(long, value_delimiter = ',', required = true)]
        marchers: Vec<MarcherId>,
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        dx: f64,
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        dy: f64,
        /// Report the move without saving.
        #[arg(long)]
        dry_run: bool,
    },
    /// Write the effective preferences (defaults when none exist) to `--prefs`.
    InitPrefs,
}

fn main() -> ExitCode {
    init_tracing();
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "drillbook failed");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = AppConfig::from_env()?;
    let settings = match &cli.prefs {
        Some(path) => prefs::load(path)?,
        None => drill_canvas::settings::UiSettings::default(),
    };
    if let Command::InitPrefs = cli.command {
        let path = cli.prefs.as_deref().ok_or(CliError::NoPrefsPath)?;
        prefs::save(path, &settings)?;
        info!(path = %path.display(), "preferences written");
        return Ok(());
    }
    let show_path = cli.show.ok_or(CliError::NoShowPath)?;
    let store = ShowStore::load(&show_path)?;

    match cli.command {
        Command::Pages => {
            let mut session = Session::open(store, settings, &config)?;
            for page in session.store().pages() {
                session.go_to_page(page.id)?;
                let marchers = session.store().marcher_pages(page.id).len();
                let locked = session.locked_marchers();
                println!("{:>4}  {:<12} {:>3} counts  {marchers} marchers  locked: {locked:?}", page.id, page.name, page.counts);
            }
        }
        Command::Export { page, out } => {
            let mut session = Session::open(store, settings, &config)?;
            if let Some(page) = page {
                session.go_to_page(page)?;
            }
            let svg = session.export_svg()?;
            match out {
                Some(path) => {
                    fs::write(&path, svg).map_err(|source| CliError::Output { path: path.clone(), source })?;
                    info!(path = %path.display(), "svg written");
                }
                None => print!("{svg}"),
            }
        }
        Command::Move { page, marchers, dx, dy, dry_run } => {
            let mut session = Session::open(store, settings, &config)?;
            if let Some(page) = page {
                session.go_to_page(page)?;
            }
            let updates = session.move_marchers(&marchers, dx, dy)?;
            for u in &updates {
                println!("marcher {} page {} -> ({}, {})", u.marcher_id, u.page_id, u.x, u.y);
            }
            let canvas = session.canvas();
            debug!(
                selected = canvas.listener().selection().len(),
                commits = canvas.listener().commits(),
                notices = canvas.presentation().messages().len(),
                "move finished"
            );
            if dry_run {
                session.undo()?;
                info!(count = updates.len(), "dry run; show not saved");
            } else {
                let mut store = session.into_store();
                store.save(&show_path)?;
            }
        }
        Command::InitPrefs => {}
    }
    Ok(())
}
