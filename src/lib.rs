use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use log::warn;

pub mod classifier;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod identity;
pub mod notify;
pub mod probe;
pub mod remote;
pub mod sampler;
pub mod session;
pub mod taxonomy;
mod utils;

use config::RulesStore;
use db::Database;
use error::PetError;
use identity::Identity;
use notify::Notifier;
use probe::{ActivityProbe, OsaScriptProbe};
use remote::LeaderboardClient;
use sampler::PetController;
use session::Session;

/// Entry point for the daemon. Wires the injected capabilities together,
/// restores the last session (with day rollover), starts the sampler loops
/// and runs until interrupted.
pub async fn run() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    log::info!("Dinopet starting up...");

    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("dinopet");
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

    let database = Database::new(data_dir.join("dinopet.sqlite3"))?;
    let rules = Arc::new(RulesStore::new(data_dir.join("rules.json"))?);
    let identity = Identity::load_or_create(&data_dir.join("identity.json"))?;

    let now = Utc::now();
    let mut session = match database.load_snapshot().await {
        Ok(Some(session)) => session,
        Ok(None) => Session::new(now),
        Err(err) => {
            // A corrupt snapshot must never take the pet down with it.
            if err.downcast_ref::<PetError>().is_some() {
                warn!("{err:#}; starting from a fresh session");
            } else {
                warn!("failed to load snapshot ({err:#}); starting fresh");
            }
            Session::new(now)
        }
    };
    session.mark_resumed(now);
    if let Some(summary) = session.rollover_if_new_day(now) {
        log::info!(
            "new day: yesterday earned {:.1} dumplings over {:.0} productive minutes",
            summary.session_earned,
            summary.productive_secs / 60.0
        );
        database.insert_day_summary(&summary).await?;
    }

    let notifier: Arc<dyn Notifier> = if cfg!(target_os = "macos") {
        Arc::new(notify::OsaScriptNotifier::new())
    } else {
        Arc::new(notify::LogNotifier)
    };
    let probe: Arc<dyn ActivityProbe> = Arc::new(OsaScriptProbe::new());

    let leaderboard = std::env::var("DINOPET_LEADERBOARD_URL")
        .ok()
        .filter(|url| !url.is_empty())
        .map(|url| Arc::new(LeaderboardClient::new(url)));

    let balance = session.ledger.balance;
    let controller = PetController::new(
        session,
        database,
        rules,
        notifier.clone(),
        probe,
        leaderboard,
        identity.clone(),
    );

    controller.start().await;
    notifier.notify(&notify::welcome(&identity.username, balance));

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    log::info!("shutdown requested");
    controller.shutdown().await;

    Ok(())
}
