//! Creation-event watch loop.
//!
//! Subscribes to filesystem notifications for the immediate children of the
//! watch root and hands each newly created entry to the file processor on
//! its own worker thread, so one file's stability wait does not delay the
//! next notification. The loop runs until a stop signal arrives or the
//! watch root itself stops being a directory.

use notify::{Event, EventKind, RecursiveMode, Watcher};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use crate::output::OutputFormatter;
use crate::processor::FileProcessor;

/// Errors that can occur while setting up or running the watch loop.
#[derive(Debug)]
pub enum WatchError {
    /// The watch target does not exist or is not a directory.
    NotADirectory(PathBuf),
    /// The notification backend could not be initialized or registered.
    Setup(notify::Error),
    /// The watch root stopped being a directory while watching.
    Invalidated(PathBuf),
    /// The notification channel closed without a stop signal.
    ChannelClosed,
}

impl std::fmt::Display for WatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotADirectory(path) => {
                write!(f, "Watch target is not a directory: {}", path.display())
            }
            Self::Setup(source) => write!(f, "Could not start watching: {}", source),
            Self::Invalidated(path) => {
                write!(f, "Watched directory is no longer valid: {}", path.display())
            }
            Self::ChannelClosed => write!(f, "Watch notification channel closed unexpectedly"),
        }
    }
}

impl std::error::Error for WatchError {}

/// Message on the watch channel: a filesystem notification or an external
/// shutdown request.
enum WatchSignal {
    Notification(notify::Result<Event>),
    Stop,
}

/// Requests a clean shutdown of a running watch loop.
///
/// The signal travels through the same channel as notifications, so it
/// interrupts the loop's blocking receive. Stopping a loop that already
/// ended is a no-op.
#[derive(Clone)]
pub struct StopHandle {
    tx: Sender<WatchSignal>,
}

impl StopHandle {
    /// Asks the watch loop to exit after the event it is currently handling.
    pub fn stop(&self) {
        let _ = self.tx.send(WatchSignal::Stop);
    }
}

/// Long-lived watch loop over a single root directory.
pub struct DirectoryWatcher {
    root: PathBuf,
    processor: Arc<FileProcessor>,
    tx: Sender<WatchSignal>,
    rx: Receiver<WatchSignal>,
}

impl DirectoryWatcher {
    /// Creates a watcher for `root`, which must already exist and be a
    /// directory.
    pub fn new(root: PathBuf, processor: Arc<FileProcessor>) -> Result<Self, WatchError> {
        if !root.is_dir() {
            return Err(WatchError::NotADirectory(root));
        }
        let (tx, rx) = mpsc::channel();
        Ok(Self {
            root,
            processor,
            tx,
            rx,
        })
    }

    /// Returns a handle for interrupting [`run`](Self::run) from another
    /// thread.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            tx: self.tx.clone(),
        }
    }

    /// Blocks on the notification channel until stopped or invalidated.
    ///
    /// Returns `Ok(())` on an external stop and
    /// [`WatchError::Invalidated`] when the watch root disappears.
    /// Per-file failures never end the loop; the processor contains and
    /// reports them. Backend notification errors are reported and the loop
    /// continues.
    pub fn run(&self) -> Result<(), WatchError> {
        let forward = self.tx.clone();
        let mut backend = notify::recommended_watcher(move |event: notify::Result<Event>| {
            // The loop may already be gone during shutdown; drop the event.
            let _ = forward.send(WatchSignal::Notification(event));
        })
        .map_err(WatchError::Setup)?;

        backend
            .watch(&self.root, RecursiveMode::NonRecursive)
            .map_err(WatchError::Setup)?;

        loop {
            match self.rx.recv() {
                Ok(WatchSignal::Stop) => return Ok(()),
                Ok(WatchSignal::Notification(Ok(event))) => self.dispatch(event),
                Ok(WatchSignal::Notification(Err(e))) => {
                    OutputFormatter::error(&format!("Error in file watcher: {}", e));
                }
                Err(_) => return Err(WatchError::ChannelClosed),
            }

            // Counterpart of re-arming a watch registration: a root that is
            // no longer a directory ends the loop for good.
            if !self.root.is_dir() {
                return Err(WatchError::Invalidated(self.root.clone()));
            }
        }
    }

    /// Hands each created path to the processor on its own worker thread.
    /// Rename, modify, and delete notifications are ignored.
    fn dispatch(&self, event: Event) {
        if !matches!(event.kind, EventKind::Create(_)) {
            return;
        }
        for path in event.paths {
            let processor = Arc::clone(&self.processor);
            thread::spawn(move || {
                processor.process_file(&path);
            });
        }
    }
}
