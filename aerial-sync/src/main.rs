//! aerial-sync - playlist ingestion service
//!
//! Runs one refresh: validates the configured account, downloads and
//! parses the playlist, and replaces the local catalog. Progress from the
//! pipeline is logged as it arrives on the event bus.

use anyhow::Result;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use aerial_common::db::{account, init_database};
use aerial_common::events::{AerialEvent, EventBus};
use aerial_sync::config::SyncConfig;
use aerial_sync::refresh::RefreshOrchestrator;

#[tokio::main]
async fn main() -> Result<()> {
    let config = SyncConfig::load(&aerial_common::config::config_file_path())?;

    // Initialize tracing
    let level = config.log_level.parse().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting aerial-sync");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let root_folder = aerial_common::config::resolve_root_folder(None);
    std::fs::create_dir_all(&root_folder)?;

    let db_path = config
        .database_path
        .clone()
        .unwrap_or_else(|| root_folder.join("aerial.db"));
    info!("Database: {}", db_path.display());

    let pool = init_database(&db_path).await?;

    // Config/env credentials win; otherwise resume the stored account.
    let credentials = match config.credentials() {
        Some(credentials) => credentials,
        None => account::load_account(&pool).await?.ok_or_else(|| {
            anyhow::anyhow!(
                "No credentials configured and no stored account. \
                 Set AERIAL_SERVER, AERIAL_USERNAME and AERIAL_PASSWORD, \
                 or fill in {}",
                aerial_common::config::config_file_path().display()
            )
        })?,
    };

    let event_bus = EventBus::new(100);

    let mut rx = event_bus.subscribe();
    let printer = tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            match event {
                AerialEvent::RefreshStageChanged {
                    new_stage, status, ..
                } => {
                    info!(stage = ?new_stage, "{}", status.message);
                }
                AerialEvent::RefreshProgress { message, .. } => {
                    info!("{}", message);
                }
                AerialEvent::RefreshCompleted { .. } => break,
            }
        }
    });

    let orchestrator = RefreshOrchestrator::new(pool, event_bus.clone());
    let status = orchestrator.run(credentials).await;

    // The printer exits on the terminal event; wait so nothing is lost.
    let _ = printer.await;

    if !status.success {
        anyhow::bail!("Refresh failed: {}", status.message);
    }

    Ok(())
}
