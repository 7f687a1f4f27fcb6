use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use logbo_lib::application::config::BotConfig;
use logbo_lib::application::services::SystemClock;
use logbo_lib::presentation::bootstrap::{build_context, init_logging};

/// Events buffered between the stream reader and the processor.
const EVENT_BUFFER: usize = 256;

#[tokio::main]
async fn main() -> Result<()> {
    let config = BotConfig::from_env().context("Invalid configuration")?;
    init_logging(&config.log_dir);

    info!("🚀 logbo starting...");
    let context = build_context(config).await?;

    let processor = Arc::new(context.event_processor(Arc::new(SystemClock)));
    let stream = context.stream()?;

    let (tx, rx) = mpsc::channel(EVENT_BUFFER);
    let stream_task = tokio::spawn(stream.run(tx));
    let processor_task = tokio::spawn(processor.run(rx));

    info!(bot_id = %context.bot.id, "Listening for mentions and timeline notes");

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for shutdown signal")?;
            info!("Shutdown requested");
        }
        _ = processor_task => {
            warn!("Event loop ended unexpectedly");
        }
    }

    stream_task.abort();
    context.database.pool().close().await;
    info!("👋 logbo stopped");

    Ok(())
}
