use tracing::{error, info};

use rssbot::{BotRunner, Config, Database, TelegramClient};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Load configuration
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

    // Initialize logging
    if let Err(e) = rssbot::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        rssbot::logging::init_console_only(&config.logging.level);
    }

    info!("Starting RSS Bot with logging level {}", config.logging.level);

    if let Err(e) = run(config).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> rssbot::Result<()> {
    config.validate()?;

    let db = Database::connect(&config.database.path).await?;
    let client = TelegramClient::new(&config.telegram)?;

    let me = client.get_me().await?;
    info!(
        "Authorized as @{}",
        me.username.as_deref().unwrap_or("unknown")
    );

    BotRunner::new(client, db, config.telegram.poll_timeout_secs)
        .run()
        .await
}
