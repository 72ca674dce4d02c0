use std::path::PathBuf;

use clap::Parser;

use kiosk_sync::config::{SyncConfig, load_sources};
use kiosk_sync::db::connect_destination;
use kiosk_sync::sync::{ExtractOptions, PgDestination, PgScanSource, SyncOrchestrator};

#[derive(Parser, Debug)]
#[command(
    name = "kiosk-sync",
    about = "Copy recent scan events from every kiosk database into the consolidated store"
)]
struct Args {
    /// JSON file listing the kiosk sources. Overrides SYNC_SOURCES_PATH.
    #[arg(long)]
    sources: Option<PathBuf>,

    /// Do not apply destination migrations before loading.
    #[arg(long)]
    skip_migrations: bool,

    /// Print the cycle report as JSON on stdout.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    kiosk_sync::init_logger();

    let args = Args::parse();
    let mut config = SyncConfig::from_env()?;
    if let Some(path) = args.sources {
        config.sources_path = path;
    }

    let sources = load_sources(&config.sources_path)?;
    log::info!(
        "loaded {} sources from {}",
        sources.len(),
        config.sources_path.display()
    );

    let pool = connect_destination(&config).await?;
    if !args.skip_migrations {
        kiosk_sync::sync::run_migrations(&pool).await?;
    }

    let orchestrator = SyncOrchestrator::new(
        PgScanSource,
        PgDestination::new(pool.clone()),
        ExtractOptions::from(&config),
    );
    let report = orchestrator.run_cycle(&sources).await;

    for failed in report.failed_sources() {
        log::warn!("{} did not sync this cycle", failed.source);
    }
    log::info!("\n{}", report);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    pool.close().await;
    Ok(())
}
