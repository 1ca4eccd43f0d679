//! Integration tests for junksweep
//!
//! These exercise scan → clean → rescan workflows against temporary directories,
//! with a fake platform standing in for elevation checks, trash purging and
//! files that cannot be removed.

use junksweep::{
    CancelToken, CleanError, Cleaner, FailureKind, LocationEntry, Platform, ProgressEvent,
    Registry, ScanResult, Scanner, ToleratedFailure,
};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use tempfile::TempDir;

fn create_test_dir() -> TempDir {
    tempfile::tempdir().unwrap()
}

#[derive(Default)]
struct TestPlatform {
    elevated: bool,
    locked: Vec<PathBuf>,
    purges: AtomicUsize,
}

impl Platform for TestPlatform {
    fn is_elevated(&self) -> bool {
        self.elevated
    }

    fn purge_trash(&self, entry: &LocationEntry) -> Result<(), ToleratedFailure> {
        self.purges.fetch_add(1, Ordering::SeqCst);
        for path in &entry.paths {
            if path.exists() {
                for child in fs::read_dir(path).unwrap().flatten() {
                    let _ = fs::remove_file(child.path());
                }
            }
        }
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        if self.locked.iter().any(|p| p == path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "The process cannot access the file because it is being used by another process",
            ));
        }
        fs::remove_file(path)
    }
}

fn scan(registry: &Registry) -> (ScanResult, Vec<ProgressEvent>) {
    let (tx, rx) = mpsc::channel();
    let result = Scanner::new(4).scan(registry, &tx, &CancelToken::new());
    drop(tx);
    (result, rx.iter().collect())
}

fn write_file(path: &Path, len: usize) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, vec![b'x'; len]).unwrap();
}

/// Three user locations and one system location, each with some content.
fn fixture(root: &Path) -> Registry {
    write_file(&root.join("temp/a.tmp"), 1000);
    write_file(&root.join("temp/nested/b.tmp"), 24);
    write_file(&root.join("browser/chrome/cache_0"), 4096);
    write_file(&root.join("browser/edge/cache_1"), 512);
    write_file(&root.join("logs/system.log"), 300);

    Registry::from_entries(vec![
        LocationEntry::directory("temp", vec![root.join("temp")]),
        LocationEntry::directory(
            "browser",
            vec![
                root.join("browser/chrome"),
                root.join("browser/edge"),
                root.join("browser/firefox"),
            ],
        ),
        LocationEntry::directory("logs", vec![root.join("logs")]).elevated(),
        LocationEntry::trash("trash", vec![root.join("trash")]),
    ])
    .unwrap()
}

#[test]
fn test_single_location_scan_clean_rescan() {
    let temp_dir = create_test_dir();
    let location = temp_dir.path().join("testA");
    write_file(&location.join("file.bin"), 1024);

    let registry =
        Registry::from_entries(vec![LocationEntry::directory("temp", vec![location.clone()])])
            .unwrap();

    let (before, _) = scan(&registry);
    assert_eq!(before.get("temp"), Some(1024));
    assert_eq!(before.len(), 1);

    let cleaner = Cleaner::new(Arc::new(TestPlatform::default()));
    cleaner.clean_one(&registry, "temp").unwrap();

    let (after, _) = scan(&registry);
    assert_eq!(after.get("temp"), Some(0));
    assert!(location.exists());
}

#[test]
fn test_scan_key_set_matches_registry() {
    let temp_dir = create_test_dir();
    let registry = fixture(temp_dir.path());

    let (result, _) = scan(&registry);
    let registry_labels: Vec<&str> = registry.labels().collect();
    let result_labels: Vec<&str> = result.labels().collect();
    assert_eq!(registry_labels, result_labels);

    assert_eq!(result.get("temp"), Some(1024));
    assert_eq!(result.get("browser"), Some(4608));
    assert_eq!(result.get("logs"), Some(300));
    assert_eq!(result.get("trash"), Some(0));
}

#[test]
fn test_missing_location_scans_as_zero() {
    let temp_dir = create_test_dir();
    let registry = Registry::from_entries(vec![LocationEntry::directory(
        "ghost",
        vec![temp_dir.path().join("never-created")],
    )])
    .unwrap();

    let (result, events) = scan(&registry);
    assert_eq!(result.get("ghost"), Some(0));
    assert!(!result.cancelled);
    assert_eq!(events.last().unwrap().percent, 100);
}

#[test]
fn test_progress_is_monotonic_and_finishes_at_100() {
    let temp_dir = create_test_dir();
    let registry = fixture(temp_dir.path());

    let (_, events) = scan(&registry);
    assert_eq!(events.len(), registry.len() + 1);
    assert!(events.windows(2).all(|w| w[0].percent <= w[1].percent));
    assert_eq!(events.last().unwrap(), &ProgressEvent::new(100, "Scan complete"));
}

#[test]
fn test_clean_one_leaves_other_locations_untouched() {
    let temp_dir = create_test_dir();
    let registry = fixture(temp_dir.path());
    let (before, _) = scan(&registry);

    let cleaner = Cleaner::new(Arc::new(TestPlatform::default()));
    let report = cleaner.clean_one(&registry, "browser").unwrap();
    assert_eq!(report.bytes_freed, 4608);

    let (after, _) = scan(&registry);
    assert_eq!(after.get("browser"), Some(0));
    for label in ["temp", "logs", "trash"] {
        assert_eq!(after.get(label), before.get(label), "{} changed", label);
    }
}

#[test]
fn test_clean_all_without_elevation_is_refused_and_changes_nothing() {
    let temp_dir = create_test_dir();
    let registry = fixture(temp_dir.path());
    let (before, _) = scan(&registry);

    let platform = Arc::new(TestPlatform::default());
    let cleaner = Cleaner::new(platform.clone());
    match cleaner.clean_all(&registry) {
        Err(CleanError::NotAuthorized { labels }) => assert_eq!(labels, vec!["logs".to_string()]),
        other => panic!("expected NotAuthorized, got {:?}", other.map(|r| r.files_removed)),
    }

    let (after, _) = scan(&registry);
    for location in before.iter() {
        assert_eq!(after.get(&location.label), Some(location.bytes));
    }
    assert_eq!(platform.purges.load(Ordering::SeqCst), 0);
}

#[test]
fn test_clean_all_elevated_empties_every_location() {
    let temp_dir = create_test_dir();
    let registry = fixture(temp_dir.path());
    write_file(&temp_dir.path().join("trash/old.doc"), 77);

    let platform = Arc::new(TestPlatform {
        elevated: true,
        ..Default::default()
    });
    let report = Cleaner::new(platform.clone()).clean_all(&registry).unwrap();

    assert_eq!(report.locations.len(), 4);
    assert_eq!(report.trash_purged, 1);
    assert!(report.failures.is_empty());
    assert_eq!(platform.purges.load(Ordering::SeqCst), 1);

    let (after, _) = scan(&registry);
    assert_eq!(after.total_bytes(), 0);
}

#[test]
fn test_locked_file_survives_and_is_reported() {
    let temp_dir = create_test_dir();
    let registry = fixture(temp_dir.path());
    let locked = temp_dir.path().join("temp/nested/b.tmp");

    let platform = Arc::new(TestPlatform {
        elevated: true,
        locked: vec![locked.clone()],
        ..Default::default()
    });
    let report = Cleaner::new(platform).clean_all(&registry).unwrap();

    assert_eq!(report.failure_count(), 1);
    assert_eq!(report.failures[0].path, locked);
    assert_eq!(report.failures[0].kind, FailureKind::DeleteDenied);
    assert!(locked.exists());
    assert!(!temp_dir.path().join("temp/a.tmp").exists());

    let (after, _) = scan(&registry);
    assert_eq!(after.get("temp"), Some(24));
    assert_eq!(after.get("browser"), Some(0));
    assert_eq!(after.get("logs"), Some(0));
}

#[test]
fn test_repeated_clean_never_increases_sizes() {
    let temp_dir = create_test_dir();
    let registry = fixture(temp_dir.path());
    let cleaner = Cleaner::new(Arc::new(TestPlatform {
        elevated: true,
        ..Default::default()
    }));

    cleaner.clean_all(&registry).unwrap();
    let (first, _) = scan(&registry);
    let second_report = cleaner.clean_all(&registry).unwrap();
    let (second, _) = scan(&registry);

    assert!(second_report.failures.is_empty());
    assert_eq!(second_report.files_removed, 0);
    for location in second.iter() {
        assert!(location.bytes <= first.get(&location.label).unwrap());
    }
}

#[test]
fn test_background_scan_handle() {
    let temp_dir = create_test_dir();
    let registry = fixture(temp_dir.path());

    let handle = Scanner::new(2).spawn(registry.clone());
    let mut percents = Vec::new();
    let result = handle.wait_with(|event| percents.push(event.percent)).unwrap();

    assert_eq!(result.len(), registry.len());
    assert_eq!(percents.last(), Some(&100));
    assert_eq!(result.get("temp"), Some(1024));
}

#[cfg(unix)]
#[test]
fn test_symlinked_directory_is_unlinked_not_followed() {
    let temp_dir = create_test_dir();
    let outside = create_test_dir();
    write_file(&outside.path().join("precious.txt"), 10);

    let location = temp_dir.path().join("cache");
    fs::create_dir_all(&location).unwrap();
    std::os::unix::fs::symlink(outside.path(), location.join("link")).unwrap();

    let registry =
        Registry::from_entries(vec![LocationEntry::directory("cache", vec![location.clone()])])
            .unwrap();
    Cleaner::new(Arc::new(TestPlatform::default()))
        .clean_all(&registry)
        .unwrap();

    assert!(outside.path().join("precious.txt").exists());
    assert!(fs::symlink_metadata(location.join("link")).is_err());
}

#[cfg(unix)]
#[test]
fn test_symlinked_location_root_scans_and_cleans_the_target() {
    let temp_dir = create_test_dir();
    let real = temp_dir.path().join("real");
    write_file(&real.join("cache.bin"), 1024);
    let link = temp_dir.path().join("tmp");
    std::os::unix::fs::symlink(&real, &link).unwrap();

    let registry =
        Registry::from_entries(vec![LocationEntry::directory("temp", vec![link.clone()])])
            .unwrap();

    let (before, _) = scan(&registry);
    assert_eq!(before.get("temp"), Some(1024));

    let report = Cleaner::new(Arc::new(TestPlatform {
        elevated: true,
        ..Default::default()
    }))
    .clean_all(&registry)
    .unwrap();
    assert_eq!(report.files_removed, 1);
    assert!(report.failures.is_empty());

    let (after, _) = scan(&registry);
    assert_eq!(after.get("temp"), Some(0));
    assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
}
