use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use targeting_engine::catalog::Catalog;
use targeting_engine::cli::{handle_command, Command};
use targeting_engine::config::PresetOnPublisherChange;
use targeting_engine::settings::SettingsLoader;
use targeting_engine::submit::TracingSink;

#[derive(ClapParser, Debug)]
#[command(name = "targeting-engine")]
#[command(version)]
#[command(about = "Capability-gated targeting configuration engine")]
struct Args {
    /// Catalog file to use instead of the built-in catalog
    #[arg(short, long, global = true)]
    catalog: Option<PathBuf>,

    /// Publisher selected when a form starts
    #[arg(short, long, global = true)]
    publisher: Option<String>,

    /// Preset handling on publisher change: "keep" or "reset-to-default"
    #[arg(long, global = true, value_parser = parse_policy)]
    preset_policy: Option<PresetOnPublisherChange>,

    /// Enable verbose logging (to stderr)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

fn parse_policy(s: &str) -> Result<PresetOnPublisherChange, String> {
    PresetOnPublisherChange::parse(s)
        .ok_or_else(|| format!("unknown preset policy '{}', expected keep or reset-to-default", s))
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr; stdout carries command output
    let level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut settings = SettingsLoader::new().load()?;
    if let Some(path) = args.catalog {
        settings.catalog_path = Some(path);
    }
    if let Some(publisher) = args.publisher {
        settings.default_publisher = publisher;
    }
    if let Some(policy) = args.preset_policy {
        settings.preset_on_publisher_change = policy;
    }
    debug!("Settings: {:?}", settings);

    let catalog = match &settings.catalog_path {
        Some(path) => {
            info!("Loading catalog from {:?}", path);
            Catalog::from_path(path).with_context(|| format!("loading catalog {:?}", path))?
        }
        None => Catalog::builtin()?,
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let ok = handle_command(
        &args.command,
        Arc::new(catalog),
        &settings,
        &mut TracingSink,
        &mut out,
    )?;

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}
