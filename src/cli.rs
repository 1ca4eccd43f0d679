use clap::{ArgAction, Parser, Subcommand};

use crate::config::Config;
use crate::output::OutputMode;

pub mod commands;

#[derive(Parser)]
#[command(name = "junksweep")]
#[command(version)]
#[command(about = "Measure and clean OS caches, logs and the trash")]
#[command(
    long_about = "junksweep measures a fixed set of well-known cache, log and trash \
    locations and can empty them.\n\n\
    Examples:\n  \
    junksweep scan                     # Show the size of every location\n  \
    junksweep clean --all -y           # Clean every location without confirmation\n  \
    junksweep clean \"Browser cache\"    # Clean a single location\n  \
    junksweep clean --all --dry-run    # Show what would be removed"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase output verbosity (-v, -vv for more)
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Number of locations to measure concurrently
    #[arg(long, global = true)]
    pub workers: Option<usize>,

    /// Glob pattern to leave untouched (repeatable)
    #[arg(long, global = true, value_name = "PATTERN")]
    pub exclude: Vec<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Measure every location (read-only)
    #[command(visible_alias = "s")]
    Scan {
        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete the contents of one location or all of them
    #[command(visible_alias = "c")]
    Clean {
        /// Label of the location to clean (see `junksweep list`)
        #[arg(conflicts_with = "all", required_unless_present = "all")]
        label: Option<String>,

        /// Clean every location
        #[arg(short = 'a', long)]
        all: bool,

        /// Skip confirmation prompt
        #[arg(short = 'y', long = "yes")]
        yes: bool,

        /// Count what would be removed without deleting anything
        #[arg(long)]
        dry_run: bool,

        /// Output the clean report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the locations and the paths they cover
    #[command(visible_alias = "l")]
    List,

    /// View or reset configuration
    Config {
        /// Print the effective configuration
        #[arg(long)]
        show: bool,

        /// Print the configuration file path
        #[arg(long)]
        path: bool,

        /// Write the default configuration to disk
        #[arg(long)]
        reset: bool,
    },
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn output_mode(&self) -> OutputMode {
        OutputMode::from_flags(self.verbose, self.quiet)
    }

    pub fn run(self) -> anyhow::Result<()> {
        let output_mode = self.output_mode();
        let mut config = Config::load();
        config.apply_cli_overrides(self.workers, &self.exclude);

        match self.command {
            Commands::Scan { json } => commands::scan_command::handle_scan(&config, json, output_mode),
            Commands::Clean {
                label,
                all,
                yes,
                dry_run,
                json,
            } => commands::clean_command::handle_clean(
                &config,
                label.as_deref(),
                all,
                yes,
                dry_run,
                json,
                output_mode,
            ),
            Commands::List => commands::list_command::handle_list(),
            Commands::Config { show, path, reset } => {
                commands::config_command::handle_config(&config, show, path, reset)
            }
        }
    }
}
