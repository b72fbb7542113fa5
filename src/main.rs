//! Suite Scheduler CLI
//!
//! Runs generated test suites through the serial or concurrent scheduler.
//!
//! ## Usage
//!
//! ```bash
//! # Run 20 sample tests one after another
//! suite-scheduler run --tests 20
//!
//! # Run them on a fixed pool of 4 workers, failing every 5th test
//! suite-scheduler run --tests 20 --parallel --workers 4 --fail-every 5
//!
//! # Unbounded pool, 3 rounds, give up draining after 10 seconds
//! suite-scheduler run --parallel --rounds 3 --drain-timeout 10
//!
//! # Inspect or create configuration
//! suite-scheduler config show
//! suite-scheduler config init suite-scheduler.yaml
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

mod cli;

use cli::{Args, Command, ConfigAction, ConfigArgs, RunArgs};
use suite_scheduler::config::{find_config, AppConfig, EnvConfig};
use suite_scheduler::driver::{SampleSuite, SuiteRunner};
use suite_scheduler::models::{ExecutionMode, SuiteSummary};
use suite_scheduler::output::{OutputFormat, ResultFormatter};
use suite_scheduler::utils::{init_logger, LogLevel};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let env = EnvConfig::load();
    let config = load_config(&args, &env)?;

    let level = if args.verbose {
        LogLevel::Debug
    } else {
        match &args.log_level {
            Some(level) => LogLevel::from_str(level)
                .ok_or_else(|| anyhow::anyhow!("Unknown log level: {level}"))?,
            None => config.log_level(),
        }
    };
    init_logger(level)?;

    match args.command {
        Command::Run(run_args) => run_suite(run_args, config).await,
        Command::Config(config_args) => {
            manage_config(config_args, &config, &env)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Defaults, then the config file, then environment overrides
fn load_config(args: &Args, env: &EnvConfig) -> Result<AppConfig> {
    let path = args
        .config
        .clone()
        .or_else(|| env.config_file.clone().map(Into::into))
        .or_else(find_config);

    let mut config = match &path {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => AppConfig::default(),
    };
    config.merge_env(env)?;

    Ok(config)
}

/// Apply command-line flags on top of the loaded configuration
fn apply_run_args(args: &RunArgs, config: &mut AppConfig) -> Result<()> {
    if args.parallel {
        config.scheduler.mode = ExecutionMode::Parallel;
    }
    if args.serial {
        config.scheduler.mode = ExecutionMode::Serial;
    }
    if let Some(workers) = args.workers {
        config.scheduler.worker_count = Some(workers);
    }
    if let Some(secs) = args.drain_timeout {
        config.scheduler.drain_timeout_secs = Some(secs);
    }
    if let Some(rounds) = args.rounds {
        config.rounds = rounds;
    }
    if let Some(format) = &args.format {
        config.format = format.clone();
    }
    config.validate()
}

async fn run_suite(args: RunArgs, mut config: AppConfig) -> Result<ExitCode> {
    apply_run_args(&args, &mut config)?;

    let suite = SampleSuite::new(args.tests)
        .fail_every(args.fail_every)
        .max_delay_ms(args.max_delay_ms)
        .build(&args.name)
        .with_config(config.scheduler.clone());

    info!(
        "Running {} ({} tests, {}, {} rounds)",
        suite.name(),
        suite.len(),
        config.scheduler,
        config.rounds
    );

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received; cancelling drain");
            interrupt.cancel();
        }
    });

    let runner = SuiteRunner::new(suite)
        .with_skip(args.skip.iter().cloned())
        .with_cancellation(cancel);

    let mut formatter = ResultFormatter::new(config.output_format());
    if args.no_color || config.output_format() != OutputFormat::Table {
        formatter = formatter.no_color();
    }

    let summaries = runner.run_rounds(config.rounds).await?;
    for summary in &summaries {
        println!("{}", formatter.format_summary(summary)?);
    }

    if summaries.iter().all(SuiteSummary::is_success) {
        Ok(ExitCode::SUCCESS)
    } else {
        debug!("At least one round failed or was interrupted");
        Ok(ExitCode::FAILURE)
    }
}

fn manage_config(args: ConfigArgs, config: &AppConfig, env: &EnvConfig) -> Result<()> {
    match args.action {
        ConfigAction::Show => {
            println!("Effective Configuration:");
            println!(
                "{}",
                serde_yaml::to_string(config).context("Failed to serialize config")?
            );
            if env.has_any() {
                env.print_summary();
            }
        }
        ConfigAction::Init { path, force } => {
            if path.exists() && !force {
                anyhow::bail!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                );
            }
            AppConfig::default().save(&path)?;
            println!("Wrote default configuration to {}", path.display());
        }
    }
    Ok(())
}
