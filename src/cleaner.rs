//! Clean engine
//!
//! Deletes the contents of registry locations. Directory locations are emptied
//! file by file, then directory by directory, leaving the location root in place.
//! Trash locations are handed to the platform's empty-trash command. Items that
//! cannot be removed are recorded in the report and skipped; the only condition
//! that stops a clean outright is a missing elevation, checked before anything
//! is touched.

use crate::cancel::CancelToken;
use crate::config::{Config, ExclusionSet};
use crate::error::{CleanError, FailureKind, ToleratedFailure};
use crate::platform::Platform;
use crate::registry::{LocationEntry, LocationKind, Registry};
use crate::utils;
use serde::Serialize;
use std::cell::RefCell;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Outcome of one clean call.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanReport {
    /// Labels that were processed, in order.
    pub locations: Vec<String>,
    pub files_removed: usize,
    pub dirs_removed: usize,
    pub bytes_freed: u64,
    pub trash_purged: usize,
    pub failures: Vec<ToleratedFailure>,
    pub cancelled: bool,
    pub dry_run: bool,
}

impl CleanReport {
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    pub fn failures_of(&self, kind: FailureKind) -> impl Iterator<Item = &ToleratedFailure> {
        self.failures.iter().filter(move |f| f.kind == kind)
    }

    fn record(&mut self, failure: ToleratedFailure) {
        debug!(
            path = %failure.path.display(),
            kind = failure.kind.as_str(),
            message = %failure.message,
            "skipping entry that could not be removed"
        );
        self.failures.push(failure);
    }
}

pub struct Cleaner {
    platform: Arc<dyn Platform>,
    exclusions: ExclusionSet,
    cancel: CancelToken,
    dry_run: bool,
}

impl Cleaner {
    pub fn new(platform: Arc<dyn Platform>) -> Self {
        Self {
            platform,
            exclusions: ExclusionSet::default(),
            cancel: CancelToken::new(),
            dry_run: false,
        }
    }

    pub fn from_config(platform: Arc<dyn Platform>, config: &Config) -> Self {
        Self::new(platform).with_exclusions(config.exclusion_set())
    }

    pub fn with_exclusions(mut self, exclusions: ExclusionSet) -> Self {
        self.exclusions = exclusions;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Count what would be removed without deleting or purging anything.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Clean every location in the registry.
    pub fn clean_all(&self, registry: &Registry) -> Result<CleanReport, CleanError> {
        let entries: Vec<&LocationEntry> = registry.iter().collect();
        self.clean_entries(&entries)
    }

    /// Clean the single location named `label`.
    pub fn clean_one(&self, registry: &Registry, label: &str) -> Result<CleanReport, CleanError> {
        let entry = registry
            .get(label)
            .ok_or_else(|| CleanError::UnknownLabel(label.to_string()))?;
        self.clean_entries(&[entry])
    }

    fn authorize(&self, entries: &[&LocationEntry]) -> Result<(), CleanError> {
        if self.dry_run {
            return Ok(());
        }

        let labels: Vec<String> = entries
            .iter()
            .filter(|e| e.requires_elevation)
            .map(|e| e.label.clone())
            .collect();

        if labels.is_empty() || self.platform.is_elevated() {
            Ok(())
        } else {
            Err(CleanError::NotAuthorized { labels })
        }
    }

    fn clean_entries(&self, entries: &[&LocationEntry]) -> Result<CleanReport, CleanError> {
        self.authorize(entries)?;

        let mut report = CleanReport {
            dry_run: self.dry_run,
            ..Default::default()
        };

        for entry in entries {
            if self.cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            match entry.kind {
                LocationKind::Directory => {
                    for path in &entry.paths {
                        self.clean_directory(path, &mut report);
                    }
                }
                LocationKind::Trash => self.purge_trash(entry, &mut report),
            }
            report.locations.push(entry.label.clone());
        }

        info!(
            locations = report.locations.len(),
            files = report.files_removed,
            dirs = report.dirs_removed,
            bytes = report.bytes_freed,
            failures = report.failure_count(),
            dry_run = report.dry_run,
            cancelled = report.cancelled,
            "clean finished"
        );
        Ok(report)
    }

    fn purge_trash(&self, entry: &LocationEntry, report: &mut CleanReport) {
        if self.dry_run {
            return;
        }
        match self.platform.purge_trash(entry) {
            Ok(()) => report.trash_purged += 1,
            Err(failure) => report.record(failure),
        }
    }

    /// Remove everything below `root`, keeping `root` itself.
    ///
    /// A symlinked root is followed, matching the scan; entries below it are not.
    fn clean_directory(&self, root: &Path, report: &mut CleanReport) {
        match fs::metadata(root) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                report.record(ToleratedFailure::new(
                    root,
                    FailureKind::PathUnreadable,
                    "location is not a directory",
                ));
                return;
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => return,
            Err(e) => {
                let kind = FailureKind::from_delete_error(&e);
                report.record(ToleratedFailure::from_io(root, kind, &e));
                return;
            }
        }

        // Directories that still hold something we could not or would not remove.
        let blocked: RefCell<HashSet<PathBuf>> = RefCell::new(HashSet::new());
        let block_ancestors = |path: &Path| {
            let mut blocked = blocked.borrow_mut();
            for ancestor in path.ancestors().skip(1) {
                if ancestor == root
                    || !ancestor.starts_with(root)
                    || !blocked.insert(ancestor.to_path_buf())
                {
                    break;
                }
            }
        };

        // Pre-order walk so excluded directories are pruned before descent. Files go
        // first; directories are removed afterwards, deepest first.
        let mut dirs: Vec<PathBuf> = Vec::new();
        let walker = WalkDir::new(root)
            .min_depth(1)
            .follow_links(false)
            .follow_root_links(true)
            .into_iter()
            .filter_entry(|e| {
                let skip = self.exclusions.is_excluded(e.path())
                    || (e.file_type().is_dir() && utils::is_windows_reparse_point(e.path()));
                if skip {
                    block_ancestors(e.path());
                }
                !skip
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().unwrap_or(root).to_path_buf();
                    let message = e.to_string();
                    block_ancestors(&path);
                    blocked.borrow_mut().insert(path.clone());
                    report.record(ToleratedFailure::new(path, FailureKind::PathUnreadable, message));
                    continue;
                }
            };

            let path = entry.path();
            if entry.file_type().is_dir() {
                dirs.push(path.to_path_buf());
                continue;
            }

            let len = match entry.metadata() {
                Ok(meta) if meta.is_file() => meta.len(),
                _ => 0,
            };
            if self.dry_run {
                report.files_removed += 1;
                report.bytes_freed += len;
                continue;
            }
            match self.platform.remove_file(path) {
                Ok(()) => {
                    report.files_removed += 1;
                    report.bytes_freed += len;
                }
                // Already gone, e.g. removed by its owner between listing and deletion.
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    block_ancestors(path);
                    report.record(ToleratedFailure::from_io(
                        path,
                        FailureKind::from_delete_error(&e),
                        &e,
                    ));
                }
            }
        }

        for dir in dirs.iter().rev() {
            if blocked.borrow().contains(dir) {
                continue;
            }
            if self.dry_run {
                report.dirs_removed += 1;
                continue;
            }
            match self.platform.remove_dir(dir) {
                Ok(()) => report.dirs_removed += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    block_ancestors(dir);
                    report.record(ToleratedFailure::from_io(
                        dir.as_path(),
                        FailureKind::from_delete_error(&e),
                        &e,
                    ));
                }
            }
        }
    }
}
