//! junksweep library crate
//!
//! Scans a fixed registry of OS cache, log and trash locations and cleans them.
//! The CLI in `main.rs` is one caller; any front end can drive the engines
//! through [`scanner::Scanner`] and [`cleaner::Cleaner`].

pub mod cancel;
pub mod cleaner;
pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod platform;
pub mod progress;
pub mod registry;
pub mod scan_events;
pub mod scanner;
pub mod size;
pub mod theme;
#[cfg(all(unix, not(target_os = "macos")))]
pub mod trash_ops;
pub mod utils;

pub use cancel::CancelToken;
pub use cleaner::{CleanReport, Cleaner};
pub use error::{CleanError, FailureKind, RegistryError, ToleratedFailure};
pub use platform::{Platform, SystemPlatform};
pub use registry::{LocationEntry, LocationKind, Registry};
pub use scan_events::{ProgressEvent, ScanEvent};
pub use scanner::{ScanHandle, ScanResult, Scanner};
