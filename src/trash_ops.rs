//! Thin wrapper around the `trash` crate, used when no empty-trash command is installed.
//!
//! Panics from the dependency are turned into errors so a clean can record a
//! tolerated failure instead of tearing down the whole run.

use anyhow::{anyhow, Result};
use std::any::Any;

fn panic_payload_to_string(panic_payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic_payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic_payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn catch_trash_panic<R>(f: impl FnOnce() -> Result<R>) -> Result<R> {
    match std::panic::catch_unwind(std::panic::AssertUnwindSafe(f)) {
        Ok(r) => r,
        Err(panic_payload) => {
            let msg = panic_payload_to_string(panic_payload);
            Err(anyhow!("trash operation panicked: {msg}"))
        }
    }
}

/// Permanently delete every item in the user's trash. Returns the number purged.
pub fn purge_everything() -> Result<usize> {
    catch_trash_panic(|| {
        let items = trash::os_limited::list()?;
        let count = items.len();
        if count > 0 {
            trash::os_limited::purge_all(items)?;
        }
        Ok(count)
    })
}
