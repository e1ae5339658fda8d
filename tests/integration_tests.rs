/// Integration tests for tidywatch
///
/// These tests exercise the complete pipeline the watcher drives for each
/// newly created file, plus a live watch loop round-trip.
///
/// Test categories:
/// 1. Classification and destination layout
/// 2. Collision handling
/// 3. Skips: ignore rules, non-regular paths, unstable files
/// 4. Live directory watching and shutdown
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tempfile::TempDir;
use tidywatch::config::IgnoreRules;
use tidywatch::processor::{FileProcessor, Outcome, SkipReason};
use tidywatch::stability::StabilityPolicy;
use tidywatch::watcher::DirectoryWatcher;

// ============================================================================
// Test Utilities
// ============================================================================

/// A test fixture that sets up a temporary watch root and a processor
/// tuned for fast polling.
struct TestFixture {
    temp_dir: TempDir,
}

impl TestFixture {
    /// Create a new test fixture with a temporary watch root.
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        TestFixture { temp_dir }
    }

    /// Get the path of the watch root.
    fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a file with content in the watch root.
    fn create_file(&self, name: &str, content: &[u8]) {
        let file_path = self.path().join(name);
        let mut file = File::create(&file_path).expect("Failed to create file");
        file.write_all(content)
            .expect("Failed to write file content");
    }

    /// Create a subdirectory in the watch root.
    fn create_subdir(&self, name: &str) {
        fs::create_dir(self.path().join(name)).expect("Failed to create subdirectory");
    }

    /// A processor over this root with a millisecond-scale stability check.
    fn processor(&self) -> FileProcessor {
        let stability = StabilityPolicy {
            poll_interval: Duration::from_millis(1),
            required_stable_checks: 2,
            max_attempts: 5,
        };
        let ignore = IgnoreRules::default()
            .compile()
            .expect("default ignore rules compile");
        FileProcessor::new(self.path().to_path_buf(), stability, ignore)
    }

    /// Run a file dropped in the watch root through the pipeline.
    fn process(&self, name: &str) -> Outcome {
        self.processor().process_file(&self.path().join(name))
    }

    /// Assert that a directory exists under the watch root.
    fn assert_dir_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(
            path.exists() && path.is_dir(),
            "Directory should exist: {}",
            path.display()
        );
    }

    /// Assert that a file exists at the given relative path.
    fn assert_file_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(
            path.exists() && path.is_file(),
            "File should exist: {}",
            path.display()
        );
    }

    /// Assert that a file does NOT exist at the given relative path.
    fn assert_file_not_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(!path.exists(), "File should not exist: {}", path.display());
    }

    /// Names of the entries inside a category directory.
    fn list_dir(&self, rel_path: &str) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.path().join(rel_path))
            .expect("Failed to read directory")
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

/// Wait for a condition with a deadline, polling in small steps.
fn wait_until<F: Fn() -> bool>(timeout: Duration, condition: F) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(20));
    }
    condition()
}

// ============================================================================
// Test Suite 1: Classification and Destination Layout
// ============================================================================

#[test]
fn test_image_is_moved_into_images() {
    let fixture = TestFixture::new();
    fixture.create_file("photo.JPG", b"image bytes");

    fixture.process("photo.JPG");

    fixture.assert_dir_exists("images");
    fixture.assert_file_exists("images/photo.JPG");
    fixture.assert_file_not_exists("photo.JPG");
}

#[test]
fn test_every_category_gets_its_own_subfolder() {
    let fixture = TestFixture::new();
    let files = [
        ("report.pdf", "documents"),
        ("clip.mkv", "videos"),
        ("song.mp3", "music"),
        ("bundle.zip", "archives"),
        ("setup.exe", "programs"),
    ];
    for (name, _) in &files {
        fixture.create_file(name, b"payload");
    }

    for (name, _) in &files {
        fixture.process(name);
    }

    for (name, category) in &files {
        fixture.assert_file_exists(&format!("{}/{}", category, name));
        fixture.assert_file_not_exists(name);
    }
}

#[test]
fn test_unknown_extension_goes_to_others() {
    let fixture = TestFixture::new();
    fixture.create_file("data.xyz", b"payload");

    fixture.process("data.xyz");

    fixture.assert_file_exists("others/data.xyz");
}

#[test]
fn test_extensionless_file_goes_to_others() {
    let fixture = TestFixture::new();
    fixture.create_file("README", b"hello");

    fixture.process("README");

    fixture.assert_file_exists("others/README");
}

#[test]
fn test_content_is_preserved_across_the_move() {
    let fixture = TestFixture::new();
    fixture.create_file("notes.txt", b"important notes");

    fixture.process("notes.txt");

    let moved = fs::read(fixture.path().join("documents/notes.txt")).unwrap();
    assert_eq!(moved, b"important notes");
}

// ============================================================================
// Test Suite 2: Collision Handling
// ============================================================================

#[test]
fn test_colliding_names_never_overwrite() {
    let fixture = TestFixture::new();
    let processor = fixture.processor();

    // Three files with the same name arrive one after another, well within
    // the same clock second. A timestamp-only suffix would stall on the
    // second collision; the suffix widens with a counter instead.
    for content in [&b"first"[..], b"second", b"third"] {
        fixture.create_file("report.pdf", content);
        let outcome = processor.process_file(&fixture.path().join("report.pdf"));
        assert!(
            matches!(outcome, Outcome::Moved { .. }),
            "Expected a move, got {:?}",
            outcome
        );
    }

    let names = fixture.list_dir("documents");
    assert_eq!(names.len(), 3, "All three files should survive: {:?}", names);
    assert!(names.contains(&"report.pdf".to_string()));

    let mut contents: Vec<Vec<u8>> = names
        .iter()
        .map(|name| fs::read(fixture.path().join("documents").join(name)).unwrap())
        .collect();
    contents.sort();
    assert_eq!(contents, vec![b"first".to_vec(), b"second".to_vec(), b"third".to_vec()]);
}

#[test]
fn test_collision_suffix_keeps_the_extension() {
    let fixture = TestFixture::new();
    let processor = fixture.processor();

    for _ in 0..2 {
        fixture.create_file("report.pdf", b"data");
        processor.process_file(&fixture.path().join("report.pdf"));
    }

    let renamed: Vec<String> = fixture
        .list_dir("documents")
        .into_iter()
        .filter(|name| name != "report.pdf")
        .collect();
    assert_eq!(renamed.len(), 1);
    assert!(renamed[0].starts_with("report_"));
    assert!(renamed[0].ends_with(".pdf"));
}

// ============================================================================
// Test Suite 3: Skips
// ============================================================================

#[test]
fn test_category_subfolder_is_not_reprocessed() {
    let fixture = TestFixture::new();
    fixture.create_subdir("images");

    let outcome = fixture.process("images");

    assert!(matches!(
        outcome,
        Outcome::Skipped(SkipReason::NotRegularFile)
    ));
    fixture.assert_dir_exists("images");
}

#[test]
fn test_already_moved_path_is_a_no_op() {
    let fixture = TestFixture::new();
    fixture.create_file("photo.jpg", b"image");
    fixture.process("photo.jpg");

    // A second notification for the now-vanished source path.
    let outcome = fixture.process("photo.jpg");

    assert!(matches!(
        outcome,
        Outcome::Skipped(SkipReason::NotRegularFile)
    ));
    fixture.assert_file_exists("images/photo.jpg");
}

#[test]
fn test_partial_download_artifacts_are_left_alone() {
    let fixture = TestFixture::new();
    fixture.create_file("movie.mkv.crdownload", b"partial");
    fixture.create_file(".DS_Store", b"droppings");

    assert!(matches!(
        fixture.process("movie.mkv.crdownload"),
        Outcome::Skipped(SkipReason::Ignored)
    ));
    assert!(matches!(
        fixture.process(".DS_Store"),
        Outcome::Skipped(SkipReason::Ignored)
    ));

    fixture.assert_file_exists("movie.mkv.crdownload");
    fixture.assert_file_exists(".DS_Store");
}

#[test]
fn test_zero_byte_file_is_stable_and_moved() {
    let fixture = TestFixture::new();
    fixture.create_file("empty.txt", b"");

    fixture.process("empty.txt");

    fixture.assert_file_exists("documents/empty.txt");
}

#[test]
fn test_file_growing_past_the_attempt_budget_stays_put() {
    let fixture = TestFixture::new();
    fixture.create_file("big.iso", b"start");

    let stability = StabilityPolicy {
        poll_interval: Duration::from_millis(30),
        required_stable_checks: 2,
        max_attempts: 4,
    };
    let ignore = IgnoreRules::default().compile().unwrap();
    let processor = FileProcessor::new(fixture.path().to_path_buf(), stability, ignore);

    let grow_path = fixture.path().join("big.iso");
    let writer = thread::spawn(move || {
        for i in 0..60u32 {
            let mut data = fs::read(&grow_path).unwrap_or_default();
            data.extend_from_slice(format!("chunk {}", i).as_bytes());
            let _ = fs::write(&grow_path, data);
            thread::sleep(Duration::from_millis(5));
        }
    });

    let outcome = processor.process_file(&fixture.path().join("big.iso"));
    writer.join().expect("writer thread panicked");

    assert!(matches!(outcome, Outcome::Skipped(SkipReason::Unstable)));
    fixture.assert_file_exists("big.iso");
}

// ============================================================================
// Test Suite 4: Live Watching
// ============================================================================

#[test]
fn test_watcher_moves_a_dropped_file_end_to_end() {
    let fixture = TestFixture::new();
    let processor = Arc::new(fixture.processor());
    let watcher = DirectoryWatcher::new(fixture.path().to_path_buf(), processor)
        .expect("watcher setup");
    let stop = watcher.stop_handle();

    let handle = thread::spawn(move || watcher.run());
    // Give the notification backend a moment to arm.
    thread::sleep(Duration::from_millis(200));

    fixture.create_file("photo.jpg", b"image bytes");

    let moved = fixture.path().join("images").join("photo.jpg");
    assert!(
        wait_until(Duration::from_secs(5), || moved.is_file()),
        "File should have been picked up and moved by the watcher"
    );
    fixture.assert_file_not_exists("photo.jpg");

    stop.stop();
    let result = handle.join().expect("watcher thread panicked");
    assert!(result.is_ok(), "Stop should end the loop cleanly");
}

#[test]
fn test_watcher_ignores_subdirectory_creation() {
    let fixture = TestFixture::new();
    let processor = Arc::new(fixture.processor());
    let watcher = DirectoryWatcher::new(fixture.path().to_path_buf(), processor)
        .expect("watcher setup");
    let stop = watcher.stop_handle();

    let handle = thread::spawn(move || watcher.run());
    thread::sleep(Duration::from_millis(200));

    fixture.create_subdir("incoming");
    // Nothing observable should happen; give the loop time to mishandle it.
    thread::sleep(Duration::from_millis(300));

    fixture.assert_dir_exists("incoming");

    stop.stop();
    let result = handle.join().expect("watcher thread panicked");
    assert!(result.is_ok());
}

#[test]
fn test_watcher_terminates_when_the_root_vanishes() {
    let outer = TestFixture::new();
    let root = outer.path().join("inbox");
    fs::create_dir(&root).expect("Failed to create watch root");

    let stability = StabilityPolicy {
        poll_interval: Duration::from_millis(1),
        required_stable_checks: 2,
        max_attempts: 5,
    };
    let ignore = IgnoreRules::default().compile().unwrap();
    let processor = Arc::new(FileProcessor::new(root.clone(), stability, ignore));
    let watcher = DirectoryWatcher::new(root.clone(), processor).expect("watcher setup");
    let stop = watcher.stop_handle();

    let handle = thread::spawn(move || watcher.run());
    thread::sleep(Duration::from_millis(200));

    fs::remove_dir_all(&root).expect("Failed to remove watch root");

    let finished = wait_until(Duration::from_secs(5), || handle.is_finished());
    if !finished {
        // Keep the test from hanging; the assertion below will then fail
        // with the real story.
        stop.stop();
    }
    let result = handle.join().expect("watcher thread panicked");
    assert!(
        matches!(result, Err(tidywatch::watcher::WatchError::Invalidated(_))),
        "Expected invalidation, got {:?}",
        result
    );
}
