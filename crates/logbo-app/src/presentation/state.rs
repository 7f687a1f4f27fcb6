use std::sync::Arc;
use std::time::Duration;

use crate::application::config::BotConfig;
use crate::application::services::{
    Clock, EventGate, EventProcessor, HistoryImporter, ReplyRenderer, StreakLedger,
};
use logbo_domain::calendar::BonusCalendar;
use logbo_domain::history::ClaimHistoryRepository;
use logbo_domain::social::{BotIdentity, SocialGateway};
use logbo_domain::streak::StreakRepository;
use logbo_infrastructure::config::TimeoutConfig;
use logbo_infrastructure::misskey::MisskeyStream;
use logbo_infrastructure::persistence::Database;

pub struct Repositories {
    pub streaks: Arc<dyn StreakRepository>,
    pub history: Arc<dyn ClaimHistoryRepository>,
}

/// Everything built once at startup and shared by the workflows: the bot's
/// identity, the store and the remote instance.
pub struct BotContext {
    pub config: BotConfig,
    pub timeouts: TimeoutConfig,
    pub database: Arc<Database>,
    pub repositories: Repositories,
    pub gateway: Arc<dyn SocialGateway>,
    pub bot: BotIdentity,
    pub calendar: BonusCalendar,
}

impl BotContext {
    pub fn event_processor(&self, clock: Arc<dyn Clock>) -> EventProcessor {
        let settings = &self.config.settings;

        let ledger = Arc::new(StreakLedger::new(
            self.repositories.streaks.clone(),
            self.calendar,
        ));
        let gate = EventGate::new(
            self.bot.clone(),
            settings.triggers.clone(),
            self.gateway.clone(),
            settings.dedup_retention_minutes,
        );
        let renderer = ReplyRenderer::new(
            settings.locale,
            settings.visibility_policy,
            settings.ranking_size,
        );

        EventProcessor::new(
            gate,
            ledger,
            self.gateway.clone(),
            renderer,
            clock,
            settings.ranking_size,
        )
    }

    pub fn history_importer(&self) -> HistoryImporter {
        HistoryImporter::new(
            self.gateway.clone(),
            self.repositories.history.clone(),
            self.calendar,
            Duration::from_millis(self.config.settings.import_page_delay_ms),
        )
    }

    pub fn stream(&self) -> anyhow::Result<MisskeyStream> {
        MisskeyStream::new(
            &self.config.misskey_url,
            &self.config.misskey_token,
            &self.timeouts,
        )
    }
}
