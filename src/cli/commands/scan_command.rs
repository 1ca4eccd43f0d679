//! Scan command feature.
//!
//! This module owns and handles the "junksweep scan" command behavior.

use anyhow::Context;

use crate::config::Config;
use crate::output::{self, OutputMode};
use crate::progress;
use crate::registry::Registry;
use crate::scanner::{ScanResult, Scanner};

/// Run a scan on a background thread, rendering progress unless quiet.
pub(crate) fn run_scan(config: &Config, registry: &Registry, mode: OutputMode) -> anyhow::Result<ScanResult> {
    let handle = Scanner::from_config(config).spawn(registry.clone());

    let result = if mode == OutputMode::Quiet {
        handle.wait()
    } else {
        let pb = progress::create_scan_progress_bar();
        let result = handle.wait_with(|event| progress::apply_event(&pb, event));
        pb.finish_and_clear();
        result
    };

    result.context("scan thread stopped without reporting a result")
}

pub(crate) fn handle_scan(config: &Config, json: bool, mode: OutputMode) -> anyhow::Result<()> {
    let registry = Registry::detect()?;

    if json {
        let result = run_scan(config, &registry, OutputMode::Quiet)?;
        return output::print_json(&result);
    }

    let result = run_scan(config, &registry, mode)?;
    output::print_scan(&result, &registry, mode);
    Ok(())
}
