/// Per-file processing pipeline.
///
/// Each newly created path runs through: regular-file guard, ignore rules,
/// stability wait, classification, destination-directory creation,
/// collision resolution, and the move itself. Every failure is contained
/// here; a bad file must never take the watch loop down with it.
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::collision::resolve_collision;
use crate::config::CompiledIgnoreRules;
use crate::file_category::Category;
use crate::output::OutputFormatter;
use crate::stability::StabilityPolicy;

/// Errors that can occur while processing a single file.
#[derive(Debug)]
pub enum ProcessError {
    /// Failed to create the category directory.
    DirectoryCreation {
        path: PathBuf,
        source: io::Error,
    },
    /// Failed to move the file to its resolved destination.
    Move {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },
}

impl std::fmt::Display for ProcessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DirectoryCreation { path, source } => {
                write!(
                    f,
                    "Error creating directory {}: {}",
                    path.display(),
                    source
                )
            }
            Self::Move { from, to, source } => {
                write!(
                    f,
                    "Error moving file {} to {}: {}",
                    from.display(),
                    to.display(),
                    source
                )
            }
        }
    }
}

impl std::error::Error for ProcessError {}

/// Why a path left the pipeline without being moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Not a regular file: a directory, a vanished path, or a path already
    /// moved by an earlier notification.
    NotRegularFile,
    /// Matched an ignore rule.
    Ignored,
    /// The size never settled within the attempt budget.
    Unstable,
}

/// What happened to a path that went through the pipeline.
#[derive(Debug)]
pub enum Outcome {
    /// The file was moved; `created_dir` is set when this call created the
    /// category directory.
    Moved {
        from: PathBuf,
        to: PathBuf,
        created_dir: Option<PathBuf>,
    },
    /// The path was skipped without touching it.
    Skipped(SkipReason),
    /// Processing was abandoned; the file remains at its original path.
    Failed(ProcessError),
}

/// Moves newly created files into category subfolders of the watch root.
pub struct FileProcessor {
    watch_root: PathBuf,
    stability: StabilityPolicy,
    ignore: CompiledIgnoreRules,
    /// Serializes collision resolution and the move so two files aimed at
    /// the same destination cannot both observe it as free.
    move_lock: Mutex<()>,
}

impl FileProcessor {
    /// Creates a processor rooted at the watched directory.
    pub fn new(
        watch_root: PathBuf,
        stability: StabilityPolicy,
        ignore: CompiledIgnoreRules,
    ) -> Self {
        Self {
            watch_root,
            stability,
            ignore,
            move_lock: Mutex::new(()),
        }
    }

    /// Runs the pipeline for one path, reports the outcome, and returns it.
    ///
    /// Never panics and never propagates an error to the caller; failures
    /// are reported and folded into the returned [`Outcome`].
    pub fn process_file(&self, path: &Path) -> Outcome {
        let outcome = self.run_pipeline(path);
        self.report(path, &outcome);
        outcome
    }

    fn run_pipeline(&self, path: &Path) -> Outcome {
        // Directories and vanished paths are skipped silently. This also
        // keeps our own category subfolders out of the pipeline.
        if !path.is_file() {
            return Outcome::Skipped(SkipReason::NotRegularFile);
        }

        if !self.ignore.should_process(path) {
            return Outcome::Skipped(SkipReason::Ignored);
        }

        if !self.stability.is_stable(path) {
            return Outcome::Skipped(SkipReason::Unstable);
        }

        let extension = file_extension(path);
        let category = Category::for_extension(&extension);
        let target_dir = self.watch_root.join(category.dir_name());

        let created_dir = match ensure_directory(&target_dir) {
            Ok(created) => created,
            Err(e) => return Outcome::Failed(e),
        };

        let file_name = match path.file_name() {
            Some(name) => name,
            None => return Outcome::Skipped(SkipReason::NotRegularFile),
        };
        let desired = target_dir.join(file_name);

        // Hold the lock across resolve + rename; the resolved path must
        // still be free when the rename lands.
        let _guard = self
            .move_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let destination = resolve_collision(&desired);
        if let Err(e) = fs::rename(path, &destination) {
            return Outcome::Failed(ProcessError::Move {
                from: path.to_path_buf(),
                to: destination,
                source: e,
            });
        }

        Outcome::Moved {
            from: path.to_path_buf(),
            to: destination,
            created_dir,
        }
    }

    fn report(&self, path: &Path, outcome: &Outcome) {
        match outcome {
            Outcome::Moved {
                from,
                to,
                created_dir,
            } => {
                if let Some(dir) = created_dir {
                    OutputFormatter::info(&format!("Created directory: {}", dir.display()));
                }
                OutputFormatter::success(&format!(
                    "Moved file {} to {}",
                    from.display(),
                    to.display()
                ));
            }
            Outcome::Skipped(SkipReason::Unstable) => {
                OutputFormatter::warning(&format!(
                    "File {} is not stable. Skipping processing.",
                    path.display()
                ));
            }
            Outcome::Skipped(_) => {}
            Outcome::Failed(e) => {
                OutputFormatter::error(&e.to_string());
            }
        }
    }
}

/// Creates `dir` if absent, returning the path when this call created it.
/// A concurrent creation ("already exists") counts as success.
fn ensure_directory(dir: &Path) -> Result<Option<PathBuf>, ProcessError> {
    match fs::create_dir(dir) {
        Ok(()) => Ok(Some(dir.to_path_buf())),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(None),
        Err(e) => Err(ProcessError::DirectoryCreation {
            path: dir.to_path_buf(),
            source: e,
        }),
    }
}

/// Extension without the leading dot, lowercased; empty for dotless names.
fn file_extension(path: &Path) -> String {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}
