//! Clean command feature.
//!
//! This module owns and handles the "junksweep clean" command behavior.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use super::scan_command::run_scan;
use crate::cleaner::Cleaner;
use crate::config::Config;
use crate::error::CleanError;
use crate::output::{self, OutputMode};
use crate::platform::SystemPlatform;
use crate::progress;
use crate::registry::Registry;
use crate::theme::Theme;

fn read_line_from_stdin() -> io::Result<String> {
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;
    Ok(input)
}

fn confirm(prompt: &str) -> io::Result<bool> {
    print!("{} [y/N]: ", prompt);
    let answer = read_line_from_stdin()?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// Resolve a user-typed label to the registry's spelling.
fn resolve_label<'a>(registry: &'a Registry, wanted: &str) -> Option<&'a str> {
    registry
        .labels()
        .find(|l| *l == wanted)
        .or_else(|| registry.labels().find(|l| l.eq_ignore_ascii_case(wanted)))
}

pub(crate) fn handle_clean(
    config: &Config,
    label: Option<&str>,
    all: bool,
    yes: bool,
    dry_run: bool,
    json: bool,
    mode: OutputMode,
) -> anyhow::Result<()> {
    let registry = Registry::detect()?;

    let target = match (all, label) {
        (true, _) => None,
        (false, Some(wanted)) => match resolve_label(&registry, wanted) {
            Some(found) => Some(found.to_string()),
            None => {
                eprintln!("{}", Theme::error(&format!("No location named '{}'.", wanted)));
                eprintln!("Run 'junksweep list' to see the available locations.");
                return Err(CleanError::UnknownLabel(wanted.to_string()).into());
            }
        },
        (false, None) => {
            eprintln!("No location specified. Use --all or give a location label.");
            eprintln!("Run 'junksweep clean --help' for more information.");
            return Ok(());
        }
    };

    if json && !yes && !dry_run {
        anyhow::bail!("--json cannot prompt for confirmation; pass --yes or --dry-run");
    }
    if !yes && !dry_run {
        let what = target.as_deref().unwrap_or("every location");
        if !confirm(&format!("Permanently delete the contents of {}?", what))? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let cleaner = Cleaner::from_config(Arc::new(SystemPlatform::new()), config).dry_run(dry_run);

    let spinner = if mode != OutputMode::Quiet && !json {
        Some(progress::create_spinner(if dry_run { "Counting..." } else { "Cleaning..." }))
    } else {
        None
    };
    let outcome = match &target {
        Some(label) => cleaner.clean_one(&registry, label),
        None => cleaner.clean_all(&registry),
    };
    if let Some(sp) = spinner {
        sp.finish_and_clear();
    }

    let report = match outcome {
        Ok(report) => report,
        Err(err @ CleanError::NotAuthorized { .. }) => {
            eprintln!("{}", Theme::error(&err.to_string()));
            eprintln!("Nothing was deleted. Re-run from an elevated (administrator/root) shell.");
            return Err(err.into());
        }
        Err(err) => return Err(err.into()),
    };

    if json {
        return output::print_json(&report);
    }
    output::print_clean_report(&report, mode);

    if !dry_run && mode != OutputMode::Quiet {
        let refreshed = run_scan(config, &registry, mode)?;
        output::print_scan(&refreshed, &registry, mode);
    }
    Ok(())
}
