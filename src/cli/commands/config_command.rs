//! Config command feature.
//!
//! This module owns and handles the "junksweep config" command behavior.

use crate::config::Config;
use crate::theme::Theme;

pub(crate) fn handle_config(config: &Config, show: bool, path: bool, reset: bool) -> anyhow::Result<()> {
    if reset {
        let defaults = Config::default();
        defaults.save()?;
        println!(
            "{}",
            Theme::success(&format!("Configuration reset: {}", Config::config_path()?.display()))
        );
        return Ok(());
    }

    if path {
        println!("{}", Config::config_path()?.display());
        return Ok(());
    }

    if show {
        println!("{}", Theme::header("Current Configuration"));
        println!("{}", Theme::divider_bold(40));
        println!("Scan workers: {}", config.scan.workers);
        println!("Exclusions:");
        if config.exclusions.patterns.is_empty() {
            println!("  (none)");
        } else {
            for pattern in &config.exclusions.patterns {
                println!("  {}", pattern);
            }
        }
        return Ok(());
    }

    println!("Use --show, --path or --reset. Run 'junksweep config --help' for details.");
    Ok(())
}
