//! tidywatch - automatic sorting for a watched directory
//!
//! This library watches a single directory for newly created files and
//! moves each one into a category subfolder chosen by its extension,
//! waiting for files to finish being written and renaming around
//! destination collisions so nothing is lost or overwritten.

pub mod cli;
pub mod collision;
pub mod config;
pub mod file_category;
pub mod output;
pub mod processor;
pub mod stability;
pub mod watcher;

pub use config::{CompiledIgnoreRules, ConfigError, IgnoreRules, WatchConfig};
pub use file_category::Category;
pub use processor::{FileProcessor, Outcome, ProcessError, SkipReason};
pub use stability::StabilityPolicy;
pub use watcher::{DirectoryWatcher, StopHandle, WatchError};

pub use cli::{Cli, run};
