//! Operator CLI for the retention subsystem.
//!
//! Builds the same components as the server against the configured
//! database and acts once, without starting the background timer.

use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};

use og_api::{bootstrap, telemetry};
use og_core::clock::{Clock, SystemClock};
use og_core::errors::CleanupError;
use og_core::services::run_preflight;
use og_shared::AppConfig;

#[derive(Debug, Parser)]
#[command(name = "og_ops", version, about = "OtpGate data retention operations")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show the active policy and run pre-flight checks without deleting anything
    Status,
    /// Print the retention policy in plain words
    Describe,
    /// Run one cleanup cycle now
    Run {
        /// Confirm that only expired OTPs and aged logs may be deleted
        #[arg(long)]
        confirm: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = AppConfig::load().context("loading configuration")?;
    telemetry::init_tracing(&config.logging)?;

    let components = bootstrap::build(&config).await?;
    let scheduler = &components.scheduler;

    let code = match cli.command {
        Command::Describe => {
            println!("{}", scheduler.describe().await);
            ExitCode::SUCCESS
        }
        Command::Status => {
            let snapshot = scheduler.policy().read().await.snapshot();
            let report =
                run_preflight(&snapshot, components.otp_service.as_ref(), SystemClock.now()).await;
            println!("{}", scheduler.describe().await);
            println!("{}", serde_json::to_string_pretty(&report)?);
            if report.passed {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Command::Run { confirm } => match scheduler.run_once(confirm).await {
            Ok(record) => {
                println!("{}", serde_json::to_string_pretty(&record)?);
                ExitCode::SUCCESS
            }
            Err(CleanupError::ConfirmationRequired) => {
                eprintln!("Refusing to run without --confirm");
                ExitCode::from(2)
            }
            Err(err @ CleanupError::SafetyVerificationFailed { .. }) => {
                eprintln!("{}", err);
                if let Some(record) = scheduler.last_run().await {
                    println!("{}", serde_json::to_string_pretty(&record)?);
                }
                ExitCode::FAILURE
            }
            Err(err) => {
                eprintln!("{}", err);
                ExitCode::FAILURE
            }
        },
    };

    components.pool.close().await;
    Ok(code)
}
