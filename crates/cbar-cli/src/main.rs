//! cbar CLI - Command-line driver for call barring sessions
//!
//! Runs a barring session against the configured command channel, the same
//! way a settings screen would: query, set, cancel all, change password.

mod commands;
mod config;
mod output;

use anyhow::{Context, Result};
use cbar_core::Direction;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::commands::set::SetTarget;
use crate::commands::Driver;
use crate::config::Config;
use crate::output::{OutputContext, OutputFormat};

#[derive(Parser)]
#[command(name = "cbar-cli")]
#[command(author, version, about = "Call barring CLI")]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "CBAR_CONFIG")]
    config: Option<PathBuf>,

    /// Session state file (JSON); loaded on start and saved on exit
    #[arg(short, long, env = "CBAR_STATE")]
    state: Option<PathBuf>,

    /// Channel reply timeout in milliseconds (0 waits forever)
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum)]
    output: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Minimal output (for scripting)
    #[arg(short, long)]
    quiet: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the status of every barring category
    Query {
        /// Ignore cached state and scan the network
        #[arg(long)]
        refresh: bool,
    },

    /// Activate a barring category, or deactivate a direction
    Set {
        /// Direction: outgoing (out) or incoming (in)
        direction: Direction,

        /// Category (baoc, baoic, baoicxh, baic, baicr) or "off"
        target: SetTarget,

        /// Barring password
        #[arg(short, long)]
        password: String,
    },

    /// Deactivate all call barring
    CancelAll {
        /// Barring password
        #[arg(short, long)]
        password: String,
    },

    /// Change the barring password
    ChangePassword {
        /// Current password
        #[arg(long)]
        old: String,

        /// New password
        #[arg(long)]
        new: String,

        /// Confirmation of the new password (defaults to --new)
        #[arg(long)]
        confirm: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();

    // Load config file
    let config = if let Some(config_path) = &cli.config {
        Config::load_from(config_path)?
    } else {
        Config::load().unwrap_or_default()
    };

    // Merge CLI args with config
    let merged = config.merge_with_args(
        cli.output.map(OutputFormat::as_str),
        cli.state.as_deref(),
        cli.timeout_ms,
        cli.no_color,
    );

    let ctx = OutputContext::new(
        OutputFormat::from_config(&merged.output),
        merged.no_color,
        cli.quiet,
    );

    let channel =
        cbar_ril::create_channel(&merged.channel).context("Failed to create command channel")?;
    let driver = Driver::spawn(channel, merged.session.clone(), merged.state.clone())?;

    match &cli.command {
        Commands::Query { refresh } => {
            commands::query(driver, *refresh, &ctx).await?;
        }

        Commands::Set {
            direction,
            target,
            password,
        } => {
            commands::set(driver, *direction, *target, password, &ctx).await?;
        }

        Commands::CancelAll { password } => {
            commands::cancel_all(driver, password, &ctx).await?;
        }

        Commands::ChangePassword { old, new, confirm } => {
            commands::change_password(driver, old, new, confirm.as_deref(), &ctx).await?;
        }
    }

    Ok(())
}
