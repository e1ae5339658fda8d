//! Collision-safe destination naming.
//!
//! A proposed destination path is only a proposal until the filesystem
//! proves it unique. When the desired name is taken, a second-granularity
//! timestamp is appended to the file stem. Two collisions inside the same
//! clock second would regenerate an identical candidate, so instead of
//! spinning until the clock advances the suffix is widened with a counter.

use std::path::{Path, PathBuf};

/// Timestamp format for collision suffixes: sortable, second granularity.
const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Returns `desired` unchanged if nothing exists there, otherwise the first
/// available `base_<timestamp><ext>` / `base_<timestamp>_<n><ext>` variant.
///
/// Probing is read-only. The caller is responsible for keeping the
/// check-then-move sequence atomic with respect to competing moves into the
/// same directory.
pub fn resolve_collision(desired: &Path) -> PathBuf {
    let timestamp = chrono::Local::now().format(TIMESTAMP_FORMAT).to_string();
    resolve_with_timestamp(desired, &timestamp)
}

fn resolve_with_timestamp(desired: &Path, timestamp: &str) -> PathBuf {
    if !desired.exists() {
        return desired.to_path_buf();
    }

    let parent = desired.parent().map(Path::to_path_buf).unwrap_or_default();
    let file_name = desired
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let (base, extension) = split_at_last_dot(&file_name);

    let mut candidate = parent.join(format!("{}_{}{}", base, timestamp, extension));
    let mut counter = 2u32;
    while candidate.exists() {
        candidate = parent.join(format!("{}_{}_{}{}", base, timestamp, counter, extension));
        counter += 1;
    }
    candidate
}

/// Splits a filename at its last dot. The extension keeps the dot; a
/// dotless name yields an empty extension so no trailing dot is produced.
fn split_at_last_dot(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(index) => file_name.split_at(index),
        None => (file_name, ""),
    }
}
