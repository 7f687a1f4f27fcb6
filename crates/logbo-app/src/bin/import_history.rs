//! One-shot backfill: replays the bot's past claim receipts into the claim
//! history table. Uses the same environment and settings file as `logbo`.

use anyhow::{Context, Result};
use tracing::info;

use logbo_lib::application::config::BotConfig;
use logbo_lib::presentation::bootstrap::{build_context, init_logging};

#[tokio::main]
async fn main() -> Result<()> {
    let config = BotConfig::from_env().context("Invalid configuration")?;
    init_logging(&config.log_dir);

    info!("📥 Starting history import...");
    let context = build_context(config).await?;

    let summary = context
        .history_importer()
        .run(&context.bot)
        .await
        .context("History import failed")?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    context.database.pool().close().await;

    Ok(())
}
