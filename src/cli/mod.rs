//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Serial and concurrent test-suite scheduler
#[derive(Parser, Debug)]
#[command(name = "suite-scheduler")]
#[command(author = "hephaex@gmail.com")]
#[command(version)]
#[command(about = "Run test suites serially or on a bounded/unbounded worker pool")]
#[command(long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (defaults to the standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Enable verbose output (same as --log-level debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a generated sample suite
    Run(RunArgs),

    /// Show or create configuration
    Config(ConfigArgs),
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Suite name
    #[arg(long, default_value = "sample")]
    pub name: String,

    /// Number of generated tests
    #[arg(short, long, default_value = "10")]
    pub tests: usize,

    /// Make every n-th test fail (0 = never)
    #[arg(long, default_value = "0")]
    pub fail_every: usize,

    /// Maximum random latency per test in milliseconds
    #[arg(long, default_value = "100")]
    pub max_delay_ms: u64,

    /// Run tests in parallel
    #[arg(short, long)]
    pub parallel: bool,

    /// Force serial execution, overriding configuration
    #[arg(long, conflicts_with = "parallel")]
    pub serial: bool,

    /// Worker count when parallel (absent or <= 0 = unbounded)
    #[arg(short, long, allow_negative_numbers = true)]
    pub workers: Option<i64>,

    /// Give up waiting for running tests after this many seconds
    #[arg(long)]
    pub drain_timeout: Option<u64>,

    /// Number of suite runs
    #[arg(short, long)]
    pub rounds: Option<u32>,

    /// Skip tests by name (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub skip: Vec<String>,

    /// Output format (table, json, json-pretty, csv, summary)
    #[arg(short, long)]
    pub format: Option<String>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

/// Arguments for configuration management
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show effective configuration and environment overrides
    Show,

    /// Write a configuration file with default values
    Init {
        /// Output path (.yaml/.yml or .json)
        #[arg(default_value = "suite-scheduler.yaml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_args() {
        let args = Args::parse_from([
            "suite-scheduler",
            "run",
            "--tests",
            "25",
            "--parallel",
            "--workers",
            "4",
            "--skip",
            "sample_001,sample_002",
        ]);
        match args.command {
            Command::Run(run) => {
                assert_eq!(run.tests, 25);
                assert!(run.parallel);
                assert_eq!(run.workers, Some(4));
                assert_eq!(run.skip, vec!["sample_001", "sample_002"]);
                assert_eq!(run.rounds, None);
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_negative_workers_accepted() {
        let args = Args::parse_from(["suite-scheduler", "run", "-p", "-w", "-1"]);
        match args.command {
            Command::Run(run) => assert_eq!(run.workers, Some(-1)),
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_serial_conflicts_with_parallel() {
        let result = Args::try_parse_from(["suite-scheduler", "run", "--serial", "--parallel"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_config_init() {
        let args = Args::parse_from(["suite-scheduler", "config", "init", "out.json", "--force"]);
        match args.command {
            Command::Config(ConfigArgs {
                action: ConfigAction::Init { path, force },
            }) => {
                assert_eq!(path, PathBuf::from("out.json"));
                assert!(force);
            }
            _ => panic!("Expected Config Init command"),
        }
    }
}
