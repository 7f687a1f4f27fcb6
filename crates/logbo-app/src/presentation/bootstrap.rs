use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::application::config::BotConfig;
use crate::presentation::state::{BotContext, Repositories};
use logbo_domain::history::ClaimHistoryRepository;
use logbo_domain::social::SocialGateway;
use logbo_domain::streak::StreakRepository;
use logbo_infrastructure::config::TimeoutConfig;
use logbo_infrastructure::misskey::MisskeyClient;
use logbo_infrastructure::persistence::{
    repositories::{SqliteClaimHistoryRepository, SqliteStreakRepository},
    Database,
};

/// File and console logging, or console only when the log directory is
/// unusable.
pub fn init_logging(log_dir: &Path) {
    match logbo_infrastructure::logging::init_logger(log_dir.to_path_buf()) {
        Ok(_) => {
            info!("📝 File logging initialized at: {}", log_dir.display());
        }
        Err(e) => {
            eprintln!("⚠️  Failed to initialize file logging: {}", e);
            eprintln!("   Falling back to console logging only");
            logbo_infrastructure::logging::init_console_logger();
        }
    }
}

pub async fn build_context(config: BotConfig) -> Result<BotContext> {
    let startup_started_at = Instant::now();
    let timeouts = TimeoutConfig::default();
    let calendar = config.settings.calendar()?;

    let db_path = config.db_path_str()?.to_string();
    info!("Database path: {}", db_path);

    info!("🔌 Connecting to database...");
    let started_at = Instant::now();
    let database = Database::new(&db_path).await?;
    info!(
        "✓ Database connection established ({}ms)",
        started_at.elapsed().as_millis()
    );

    info!("🔄 Running migrations...");
    let started_at = Instant::now();
    database.run_migrations().await?;
    info!(
        "✓ Migrations completed ({}ms)",
        started_at.elapsed().as_millis()
    );

    let pool = Arc::new(database.pool().clone());
    let repositories = Repositories {
        streaks: Arc::new(SqliteStreakRepository::new(pool.clone())) as Arc<dyn StreakRepository>,
        history: Arc::new(SqliteClaimHistoryRepository::new(pool))
            as Arc<dyn ClaimHistoryRepository>,
    };
    let records = repositories.streaks.count().await?;
    info!("✓ Repositories ready ({} streak records)", records);

    let client = MisskeyClient::with_timeouts(&config.misskey_url, &config.misskey_token, &timeouts)
        .context("Failed to create Misskey client")?;
    let gateway = Arc::new(client) as Arc<dyn SocialGateway>;

    info!("🤖 Resolving bot identity...");
    let started_at = Instant::now();
    let bot = gateway
        .whoami()
        .await
        .context("Failed to resolve the bot account (check MISSKEY_TOKEN)")?;
    info!(
        bot_id = %bot.id,
        username = %bot.username,
        "✓ Bot identity resolved ({}ms)",
        started_at.elapsed().as_millis()
    );

    info!(
        utc_offset_hours = config.settings.utc_offset_hours,
        cutover_hour = config.settings.cutover_hour,
        locale = config.settings.locale.as_str(),
        "Bonus day rolls over at {:02}:00 (UTC{:+})",
        config.settings.cutover_hour,
        config.settings.utc_offset_hours
    );

    info!(
        "✅ Startup finished ({}ms)",
        startup_started_at.elapsed().as_millis()
    );

    Ok(BotContext {
        config,
        timeouts,
        database: Arc::new(database),
        repositories,
        gateway,
        bot,
        calendar,
    })
}
