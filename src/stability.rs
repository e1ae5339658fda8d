//! Write-in-progress detection for newly created files.
//!
//! Creation notifications fire when a file is opened for writing, often long
//! before a large download finishes. Before a file is touched its size is
//! polled at a fixed interval until it holds still for a required number of
//! consecutive readings, with a cap on total readings so a file that never
//! settles is eventually given up on.

use std::fs;
use std::io;
use std::path::Path;
use std::thread;
use std::time::Duration;

/// Tuning for the size-polling stability check.
#[derive(Debug, Clone, Copy)]
pub struct StabilityPolicy {
    /// Delay between consecutive size readings.
    pub poll_interval: Duration,
    /// Consecutive unchanged readings required to declare the file stable.
    pub required_stable_checks: u32,
    /// Total readings to take before giving up.
    pub max_attempts: u32,
}

impl Default for StabilityPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(1000),
            required_stable_checks: 3,
            max_attempts: 10,
        }
    }
}

impl StabilityPolicy {
    /// Polls the file's size until it is unchanged for
    /// `required_stable_checks` consecutive readings.
    ///
    /// Returns `false` when the size is still changing after `max_attempts`
    /// readings, or as soon as a size read fails (file deleted mid-check,
    /// permission error). A zero-byte file that never grows counts as
    /// stable: an unchanging size is indistinguishable from "finished".
    pub fn is_stable(&self, path: &Path) -> bool {
        self.poll(|| fs::metadata(path).map(|m| m.len()), thread::sleep)
    }

    /// Polling loop with the size read and the wait injected, so tests can
    /// count readings exactly without touching a clock.
    fn poll<R, S>(&self, mut read_size: R, mut sleep: S) -> bool
    where
        R: FnMut() -> io::Result<u64>,
        S: FnMut(Duration),
    {
        let mut previous_size: Option<u64> = None;
        let mut stable_count = 0;
        let mut attempts = 0;

        while attempts < self.max_attempts {
            let current_size = match read_size() {
                Ok(size) => size,
                Err(_) => return false,
            };

            if previous_size == Some(current_size) {
                stable_count += 1;
                if stable_count >= self.required_stable_checks {
                    return true;
                }
            } else {
                stable_count = 0;
            }

            previous_size = Some(current_size);
            sleep(self.poll_interval);
            attempts += 1;
        }

        false
    }
}
