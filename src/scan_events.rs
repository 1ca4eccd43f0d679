//! Messages a running scan sends to its caller.

use crate::scanner::ScanResult;
use serde::Serialize;

/// Latest scan progress: percent complete (0-100) and a status line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressEvent {
    pub percent: u8,
    pub status: String,
}

impl ProgressEvent {
    pub fn new(percent: u8, status: impl Into<String>) -> Self {
        Self {
            percent: percent.min(100),
            status: status.into(),
        }
    }

    /// Percent for the `started`-th location (zero-based) out of `total`.
    pub fn percent_of(started: usize, total: usize) -> u8 {
        if total == 0 {
            return 100;
        }
        ((started.min(total) * 100) / total) as u8
    }
}

/// Everything a background scan emits, in order: progress, then exactly one result.
#[derive(Debug, Clone)]
pub enum ScanEvent {
    Progress(ProgressEvent),
    Finished(ScanResult),
}
