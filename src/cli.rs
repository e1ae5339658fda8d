//! Command-line interface and startup wiring.
//!
//! Resolves the watch directory (defaulting to the user's Downloads
//! folder), loads configuration, applies command-line overrides, and runs
//! the watch loop on a dedicated thread until it terminates.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use crate::config::WatchConfig;
use crate::output::OutputFormatter;
use crate::processor::FileProcessor;
use crate::watcher::DirectoryWatcher;

/// Watch a directory and sort newly created files into category subfolders.
#[derive(Debug, Parser)]
#[command(name = "tidywatch", version, about)]
pub struct Cli {
    /// Directory to watch. Defaults to the user's Downloads folder.
    pub watch_dir: Option<PathBuf>,

    /// Path to a TOML configuration file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Milliseconds between file-size polls during the stability check.
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,

    /// Consecutive unchanged size readings required before a file is moved.
    #[arg(long)]
    pub stable_checks: Option<u32>,

    /// Size readings to take before giving up on an unsettled file.
    #[arg(long)]
    pub max_attempts: Option<u32>,
}

/// Runs the watcher described by the parsed command line.
///
/// Blocks until the watch loop ends: normally never, unless the watched
/// directory is invalidated or the process is killed.
pub fn run(cli: Cli) -> Result<(), String> {
    let watch_dir = match cli.watch_dir {
        Some(dir) => dir,
        None => default_watch_dir()?,
    };

    let mut config = WatchConfig::load(cli.config.as_deref())
        .map_err(|e| format!("Error loading configuration: {}", e))?;
    if let Some(ms) = cli.poll_interval_ms {
        config.stability.poll_interval_ms = ms;
    }
    if let Some(checks) = cli.stable_checks {
        config.stability.required_stable_checks = checks;
    }
    if let Some(attempts) = cli.max_attempts {
        config.stability.max_attempts = attempts;
    }

    let policy = config.stability.to_policy();
    let ignore = config
        .ignore
        .compile()
        .map_err(|e| format!("Error compiling ignore rules: {}", e))?;

    let processor = Arc::new(FileProcessor::new(watch_dir.clone(), policy, ignore));
    let watcher = DirectoryWatcher::new(watch_dir.clone(), processor).map_err(|e| e.to_string())?;

    OutputFormatter::info(&format!("Monitoring folder: {}", watch_dir.display()));

    // The watch loop gets its own thread; per-file work is dispatched to
    // further workers from there. Joining keeps the process alive until
    // the loop terminates.
    let handle = thread::spawn(move || watcher.run());
    match handle.join() {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err("Watcher thread panicked".to_string()),
    }
}

/// The invoking user's Downloads folder.
fn default_watch_dir() -> Result<PathBuf, String> {
    let home = std::env::var("HOME")
        .map_err(|_| "HOME is not set; pass the directory to watch explicitly".to_string())?;
    Ok(PathBuf::from(home).join("Downloads"))
}
