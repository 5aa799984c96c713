// WireGuard AllowedIPs inventory sync tool

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use wg_inventory_sync::{config::load_config, resolver::SystemDns, service::Systemctl, sync};

#[derive(Parser)]
#[command(name = "wg-inventory-sync")]
#[command(
    about = "Sync a WireGuard profile's AllowedIPs with config and inventory hosts",
    long_about = None
)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "/etc/wg-inventory-sync/config.toml")]
    config: PathBuf,

    /// Force debug logging regardless of the configured level
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args.config)
        .with_context(|| format!("cannot load config file {}", args.config.display()))?;

    let log_level = if args.debug {
        "debug"
    } else {
        config.log_level.as_str()
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    log::info!("Starting wg-inventory-sync");
    log::debug!("Configuration: {:?}", config);

    let dns = SystemDns::new();
    if let Err(err) = sync::run(&config, &dns, &Systemctl).await {
        log::error!("sync failed: {:#}", err);
        std::process::exit(1);
    }

    Ok(())
}
