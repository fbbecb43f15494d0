//! Config command - inspect and initialize configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, bail};
use clap::{Args, Subcommand};

use hitl_config::{HitlConfig, PROJECT_CONFIG_FILE, load_config};

use super::Context;

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the resolved configuration (file + environment)
    Show,

    /// Validate the resolved configuration
    Check,

    /// Write a config file with defaults
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Run the config command.
pub fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => {
            let loaded = load_config(ctx.config_path.as_deref())?;
            if let Some(path) = &loaded.source {
                println!("# source: {}", path.display());
            }
            print!("{}", loaded.config.to_toml()?);
            Ok(())
        }
        ConfigCommand::Check => {
            let loaded = load_config(ctx.config_path.as_deref())?;
            loaded.config.validate().context("invalid configuration")?;
            let source = loaded
                .source
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "defaults".to_string());
            println!(
                "Configuration OK ({source}, strategy: {})",
                loaded.config.auth.strategy
            );
            Ok(())
        }
        ConfigCommand::Init { force } => {
            let path = ctx
                .config_path
                .clone()
                .unwrap_or_else(|| PathBuf::from(PROJECT_CONFIG_FILE));
            init_config(&path, force)?;
            println!("Wrote {}", path.display());
            Ok(())
        }
    }
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    let contents = HitlConfig::default().to_toml()?;
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}
