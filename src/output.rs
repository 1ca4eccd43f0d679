use crate::cleaner::CleanReport;
use crate::registry::{LocationKind, Registry};
use crate::scanner::ScanResult;
use crate::size::format_size;
use crate::theme::Theme;
use anyhow::Result;
use serde::Serialize;

const LABEL_WIDTH: usize = 24;
const SIZE_WIDTH: usize = 12;

/// Output verbosity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Only errors.
    Quiet,
    /// Tables and summaries.
    Normal,
    /// Also location paths and individual failures.
    Verbose,
}

impl OutputMode {
    pub fn from_flags(verbose: u8, quiet: bool) -> Self {
        if quiet {
            OutputMode::Quiet
        } else if verbose > 0 {
            OutputMode::Verbose
        } else {
            OutputMode::Normal
        }
    }
}

fn pad(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        text.to_string()
    } else {
        format!("{}{}", text, " ".repeat(width - len))
    }
}

/// One line of the scan table: label padded, size right-aligned.
pub fn scan_row(label: &str, bytes: u64) -> String {
    format!(
        "{}  {:>width$}",
        pad(label, LABEL_WIDTH),
        format_size(bytes),
        width = SIZE_WIDTH
    )
}

pub fn print_scan(result: &ScanResult, registry: &Registry, mode: OutputMode) {
    if mode == OutputMode::Quiet {
        return;
    }

    println!();
    println!("{}", Theme::header("Junk scan results"));
    println!("{}", Theme::divider_bold(LABEL_WIDTH + SIZE_WIDTH + 2));

    for location in result.iter() {
        let row = scan_row(&location.label, location.bytes);
        if location.bytes == 0 {
            println!("{}", Theme::muted(&row));
        } else {
            println!("{}", row);
        }

        if mode == OutputMode::Verbose {
            if let Some(entry) = registry.get(&location.label) {
                for path in &entry.paths {
                    println!("    {}", Theme::muted(&path.display().to_string()));
                }
            }
            if location.unreadable > 0 {
                println!(
                    "    {}",
                    Theme::warning(&format!("{} entries could not be read", location.unreadable))
                );
            }
        }
    }

    println!("{}", Theme::divider(LABEL_WIDTH + SIZE_WIDTH + 2));
    println!(
        "{}",
        Theme::size(&scan_row("Total", result.total_bytes()))
    );
    if result.cancelled {
        println!("{}", Theme::warning("Scan was cancelled; some sizes are incomplete."));
    }
}

pub fn print_clean_report(report: &CleanReport, mode: OutputMode) {
    if mode == OutputMode::Quiet {
        return;
    }

    println!();
    let verb = if report.dry_run { "Would remove" } else { "Removed" };
    println!(
        "{}",
        Theme::success(&format!(
            "{} {} files and {} folders ({})",
            verb,
            report.files_removed,
            report.dirs_removed,
            format_size(report.bytes_freed)
        ))
    );
    if report.trash_purged > 0 {
        println!("{}", Theme::success("Trash emptied"));
    }

    if !report.failures.is_empty() {
        println!(
            "{}",
            Theme::warning(&format!(
                "{} items could not be removed and were skipped",
                report.failures.len()
            ))
        );
        if mode == OutputMode::Verbose {
            for failure in &report.failures {
                println!(
                    "    {} ({}): {}",
                    failure.path.display(),
                    failure.kind.as_str(),
                    Theme::muted(&failure.message)
                );
            }
        }
    }

    if report.cancelled {
        println!("{}", Theme::warning("Clean was cancelled before every location was processed."));
    }
}

pub fn print_registry(registry: &Registry) {
    for entry in registry {
        let mut tags = Vec::new();
        if entry.kind == LocationKind::Trash {
            tags.push("trash");
        }
        if entry.requires_elevation {
            tags.push("admin");
        }
        let suffix = if tags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", tags.join(", "))
        };
        println!("{}{}", Theme::header(&entry.label), Theme::muted(&suffix));
        for path in &entry.paths {
            println!("    {}", path.display());
        }
    }
}

/// Print any serializable value as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_mode_from_flags() {
        assert_eq!(OutputMode::from_flags(0, true), OutputMode::Quiet);
        assert_eq!(OutputMode::from_flags(2, false), OutputMode::Verbose);
        assert_eq!(OutputMode::from_flags(0, false), OutputMode::Normal);
    }

    #[test]
    fn test_scan_row_alignment() {
        let row = scan_row("Temp", 1024);
        assert!(row.starts_with("Temp "));
        assert!(row.ends_with("1.00 KB"));
        assert_eq!(row.chars().count(), LABEL_WIDTH + 2 + SIZE_WIDTH);
    }

    #[test]
    fn test_scan_result_serializes_labels_and_bytes() {
        let registry = Registry::from_entries(vec![crate::registry::LocationEntry::directory(
            "temp",
            vec![],
        )])
        .unwrap();
        let (tx, _rx) = std::sync::mpsc::channel();
        let result = crate::scanner::Scanner::new(1).scan(
            &registry,
            &tx,
            &crate::cancel::CancelToken::new(),
        );

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["locations"][0]["label"], "temp");
        assert_eq!(json["locations"][0]["bytes"], 0);
        assert_eq!(json["cancelled"], false);
    }
}
