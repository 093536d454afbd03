// Copyright (c) 2025 - Cowboy AI, Inc.
//! monsync
//!
//! Synchronizes monitoring zones, hosts and certificates with the fleet
//! topology described in the private data repository.
//!
//! ```text
//! monsync [-d] [--dry-run] [-c <conf>] <certs|conf|cleanup>
//! ```
//!
//! `RUST_LOG` directives are honored on top of the `--debug` level.

use anyhow::{Context, Result};
use clap::Parser;
use monsync::{Action, App, RunConfig};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONF: &str = "/etc/monsync/conf.toml";

#[derive(Debug, Parser)]
#[command(name = "monsync", version, about)]
struct Cli {
    /// Program action
    #[arg(value_enum)]
    action: Action,

    /// Enable debug mode
    #[arg(short, long)]
    debug: bool,

    /// Report what would change without modifying anything
    #[arg(long)]
    dry_run: bool,

    /// Path to the configuration file
    #[arg(short, long, env = "MONSYNC_CONF", default_value = DEFAULT_CONF)]
    conf: PathBuf,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.debug { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .init();

    let config = RunConfig::load(&cli.conf)
        .with_context(|| format!("failed to load configuration {}", cli.conf.display()))?;

    let app = App::new(config, cli.dry_run);
    app.run(cli.action)
        .await
        .with_context(|| format!("{} action failed", cli.action))?;

    Ok(())
}
