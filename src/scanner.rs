//! Scan engine
//!
//! Computes the recursive byte size of every registry location on a bounded
//! worker pool. Progress is reported in registry order; the final result is a
//! label → size mapping that always covers every label in the registry.

use crate::cancel::CancelToken;
use crate::config::{Config, ExclusionSet};
use crate::registry::{LocationEntry, Registry};
use crate::scan_events::{ProgressEvent, ScanEvent};
use crate::utils;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io;
use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

pub const DEFAULT_WORKERS: usize = 4;

/// Size of one location after a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationSize {
    pub label: String,
    pub bytes: u64,
    /// Entries that could not be statted or enumerated; they contributed 0.
    pub unreadable: usize,
    #[serde(skip)]
    measured: bool,
}

impl LocationSize {
    fn pending(label: &str) -> Self {
        Self {
            label: label.to_string(),
            bytes: 0,
            unreadable: 0,
            measured: false,
        }
    }
}

/// Sizes for every location in a registry, in registry order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanResult {
    pub locations: Vec<LocationSize>,
    /// Set when the scan was cancelled before every location was measured.
    pub cancelled: bool,
    pub scanned_at: DateTime<Utc>,
}

impl ScanResult {
    pub fn get(&self, label: &str) -> Option<u64> {
        self.locations
            .iter()
            .find(|l| l.label == label)
            .map(|l| l.bytes)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.locations.iter().map(|l| l.label.as_str())
    }

    pub fn total_bytes(&self) -> u64 {
        self.locations.iter().map(|l| l.bytes).sum()
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LocationSize> {
        self.locations.iter()
    }
}

/// Byte total for one directory tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirSize {
    pub bytes: u64,
    pub unreadable: usize,
}

#[derive(Debug, Clone)]
pub struct Scanner {
    workers: usize,
    exclusions: ExclusionSet,
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new(DEFAULT_WORKERS)
    }
}

impl Scanner {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
            exclusions: ExclusionSet::default(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.scan.workers).with_exclusions(config.exclusion_set())
    }

    pub fn with_exclusions(mut self, exclusions: ExclusionSet) -> Self {
        self.exclusions = exclusions;
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Scan every location, sending progress to `progress`.
    pub fn scan(
        &self,
        registry: &Registry,
        progress: &Sender<ProgressEvent>,
        cancel: &CancelToken,
    ) -> ScanResult {
        self.scan_with(registry, cancel, &|event| {
            let _ = progress.send(event);
        })
    }

    /// Scan every location, handing each progress event to `on_progress`.
    ///
    /// Events are produced on a single thread in registry order, so the callback
    /// never runs concurrently with itself.
    pub fn scan_with(
        &self,
        registry: &Registry,
        cancel: &CancelToken,
        on_progress: &(dyn Fn(ProgressEvent) + Sync),
    ) -> ScanResult {
        let total = registry.len();
        let mut slots: Vec<LocationSize> = registry
            .iter()
            .map(|e| LocationSize::pending(&e.label))
            .collect();

        let submit = |index: usize, entry: &LocationEntry| {
            on_progress(ProgressEvent::new(
                ProgressEvent::percent_of(index, total),
                format!("Scanning {}...", entry.label),
            ));
        };

        // Each task owns one disjoint slot; the scope join is the only barrier.
        let tasks = registry.iter().zip(slots.iter_mut()).enumerate();
        let exclusions = &self.exclusions;

        match rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("junksweep-scan-{}", i))
            .build()
        {
            Ok(pool) => pool.scope(move |s| {
                for (index, (entry, slot)) in tasks {
                    if cancel.is_cancelled() {
                        break;
                    }
                    submit(index, entry);
                    s.spawn(move |_| {
                        // Queued tasks re-check so cancellation is not delayed by a full queue.
                        if !cancel.is_cancelled() {
                            measure_into(entry, exclusions, slot);
                        }
                    });
                }
            }),
            Err(e) => {
                warn!(error = %e, "could not build scan worker pool; scanning sequentially");
                for (index, (entry, slot)) in tasks {
                    if cancel.is_cancelled() {
                        break;
                    }
                    submit(index, entry);
                    measure_into(entry, &self.exclusions, slot);
                }
            }
        }

        let cancelled = slots.iter().any(|s| !s.measured);
        let status = if cancelled { "Scan cancelled" } else { "Scan complete" };
        on_progress(ProgressEvent::new(100, status));

        let result = ScanResult {
            locations: slots,
            cancelled,
            scanned_at: Utc::now(),
        };
        info!(
            locations = result.len(),
            total_bytes = result.total_bytes(),
            cancelled,
            "scan finished"
        );
        result
    }

    /// Run a scan on a background thread.
    ///
    /// The returned handle yields [`ScanEvent::Progress`] messages followed by exactly
    /// one [`ScanEvent::Finished`].
    pub fn spawn(self, registry: Registry) -> ScanHandle {
        let (tx, rx) = mpsc::channel();
        let cancel = CancelToken::new();
        let job = Arc::new(ScanJob {
            scanner: self,
            registry,
            cancel: cancel.clone(),
            tx,
        });

        let worker = Arc::clone(&job);
        let thread = match thread::Builder::new()
            .name("junksweep-scan".to_string())
            .spawn(move || worker.run())
        {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!(error = %e, "could not start scan thread; scanning inline");
                job.run();
                None
            }
        };

        ScanHandle {
            events: rx,
            cancel,
            thread,
        }
    }
}

struct ScanJob {
    scanner: Scanner,
    registry: Registry,
    cancel: CancelToken,
    tx: Sender<ScanEvent>,
}

impl ScanJob {
    fn run(&self) {
        let result = self.scanner.scan_with(&self.registry, &self.cancel, &|event| {
            let _ = self.tx.send(ScanEvent::Progress(event));
        });
        let _ = self.tx.send(ScanEvent::Finished(result));
    }
}

/// Caller side of a background scan.
#[derive(Debug)]
pub struct ScanHandle {
    events: Receiver<ScanEvent>,
    cancel: CancelToken,
    thread: Option<JoinHandle<()>>,
}

impl ScanHandle {
    pub fn events(&self) -> &Receiver<ScanEvent> {
        &self.events
    }

    /// Stop before the next location starts.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Block until the scan finishes, discarding progress.
    pub fn wait(self) -> Option<ScanResult> {
        self.wait_with(|_| {})
    }

    /// Block until the scan finishes, passing each progress event to `on_progress`.
    ///
    /// Returns `None` only if the scan thread died without reporting.
    pub fn wait_with(mut self, mut on_progress: impl FnMut(&ProgressEvent)) -> Option<ScanResult> {
        let mut finished = None;
        while let Ok(event) = self.events.recv() {
            match event {
                ScanEvent::Progress(p) => on_progress(&p),
                ScanEvent::Finished(result) => {
                    finished = Some(result);
                    break;
                }
            }
        }
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                warn!("scan thread panicked");
            }
        }
        finished
    }
}

fn measure_into(entry: &LocationEntry, exclusions: &ExclusionSet, slot: &mut LocationSize) {
    for path in &entry.paths {
        let size = dir_size(path, exclusions);
        slot.bytes += size.bytes;
        slot.unreadable += size.unreadable;
    }
    slot.measured = true;
    debug!(
        label = %entry.label,
        bytes = slot.bytes,
        unreadable = slot.unreadable,
        "location measured"
    );
}

/// Sum the sizes of every regular file under `root`.
///
/// A symlinked root is followed; symlinks below it are not, and Windows reparse
/// points are not entered. A missing root (or dangling root link) is simply empty;
/// anything else that cannot be read is counted and skipped.
pub fn dir_size(root: &Path, exclusions: &ExclusionSet) -> DirSize {
    let mut size = DirSize::default();

    match std::fs::metadata(root) {
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => return size,
        Err(e) => {
            debug!(path = %root.display(), error = %e, "location unreadable");
            size.unreadable += 1;
            return size;
        }
    }

    let walker = WalkDir::new(root)
        .follow_links(false)
        .follow_root_links(true)
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0
                || !(exclusions.is_excluded(e.path())
                    || (e.file_type().is_dir() && utils::is_windows_reparse_point(e.path())))
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!(error = %e, "skipping unreadable entry");
                size.unreadable += 1;
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        match entry.metadata() {
            Ok(meta) => size.bytes += meta.len(),
            Err(e) => {
                debug!(path = %entry.path().display(), error = %e, "skipping unreadable file");
                size.unreadable += 1;
            }
        }
    }

    size
}
