//! HITL MCP gateway.
//!
//! Main entry point for the `hitl` binary.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{config, serve};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// HITL MCP gateway - human-in-the-loop tools for MCP clients
#[derive(Parser, Debug)]
#[command(name = "hitl")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file (default: ./hitl.toml when present)
    #[arg(short, long, global = true, env = "HITL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the gateway (default)
    Serve(serve::ServeArgs),

    /// Configuration management
    Config(config::ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.log_json);

    let ctx = commands::Context {
        config_path: cli.config,
        verbose: cli.verbose,
    };

    match cli.command {
        Some(Commands::Serve(args)) => serve::run(args, &ctx).await,
        Some(Commands::Config(args)) => config::run(args, &ctx),
        None => serve::run(serve::ServeArgs::default(), &ctx).await,
    }
}

/// Console logging; `RUST_LOG` replaces the default filter when set.
fn init_tracing(verbose: bool, json: bool) {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::prelude::*;

    let default_filter = if verbose {
        "hitl=debug,hitl_auth=debug,hitl_client=debug,hitl_config=debug,hitl_server=debug,hitl_tools=debug,tower_http=debug,info"
    } else {
        "hitl=info,hitl_auth=info,hitl_client=info,hitl_server=info,hitl_tools=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();
    }
}
