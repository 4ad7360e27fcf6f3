//! Runs one update cycle: fetch every feed and notify subscribers of new items.
//!
//! Meant to be started periodically by an external scheduler (cron, systemd
//! timer). Overlapping runs are not guarded against.

use tracing::{error, info};

use rssbot::{Config, Database, DeliveryGate, HttpFeedFetcher, TelegramClient, UpdateOrchestrator};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let config = match Config::load_with_env("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    if let Err(e) = rssbot::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        rssbot::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = run(config).await {
        error!("Update failed: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> rssbot::Result<()> {
    config.validate()?;

    let db = Database::connect(&config.database.path).await?;
    let fetcher = HttpFeedFetcher::new(&config.fetch)?;
    let client = TelegramClient::new(&config.telegram)?;
    let gate = DeliveryGate::from_config(client, &config.delivery);

    let mut orchestrator = UpdateOrchestrator::new(&db, &fetcher, gate);
    let report = orchestrator.run_cycle().await?;

    info!(
        feeds = report.feeds,
        updated = report.updated,
        unchanged = report.unchanged,
        fetch_failures = report.fetch_failures,
        store_failures = report.store_failures,
        new_items = report.new_items,
        messages_sent = report.messages_sent,
        delivery_failures = report.delivery_failures,
        "Update finished"
    );

    Ok(())
}
