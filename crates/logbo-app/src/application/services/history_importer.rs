use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::reply_renderer::ReplyRenderer;
use logbo_domain::calendar::BonusCalendar;
use logbo_domain::history::ClaimHistoryRepository;
use logbo_domain::shared::{DomainError, NoteId, UserId};
use logbo_domain::social::{BotIdentity, PostedNote, SocialGateway};

pub const IMPORT_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub pages: usize,
    pub scanned: usize,
    pub receipts: usize,
    pub imported: usize,
    pub duplicates: usize,
    pub unresolved: usize,
    /// Receipts whose history insert failed; the import moves on past them.
    pub failed: usize,
}

/// Replays the bot's own claim receipts into the claim history log.
pub struct HistoryImporter {
    gateway: Arc<dyn SocialGateway>,
    history: Arc<dyn ClaimHistoryRepository>,
    calendar: BonusCalendar,
    page_size: u32,
    page_delay: Duration,
}

impl HistoryImporter {
    pub fn new(
        gateway: Arc<dyn SocialGateway>,
        history: Arc<dyn ClaimHistoryRepository>,
        calendar: BonusCalendar,
        page_delay: Duration,
    ) -> Self {
        Self {
            gateway,
            history,
            calendar,
            page_size: IMPORT_PAGE_SIZE,
            page_delay,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Walk every note of `bot`, newest first, until an empty page.
    pub async fn run(&self, bot: &BotIdentity) -> Result<ImportSummary, DomainError> {
        let mut summary = ImportSummary::default();
        let mut until_id: Option<NoteId> = None;

        loop {
            let notes = self
                .gateway
                .list_notes(&bot.id, until_id.clone(), self.page_size)
                .await?;

            let Some(last) = notes.last() else {
                break;
            };
            until_id = Some(last.id.clone());
            summary.pages += 1;

            for note in &notes {
                self.import_note(bot, note, &mut summary).await;
            }

            info!(
                page = summary.pages,
                scanned = summary.scanned,
                imported = summary.imported,
                "Imported page"
            );

            if !self.page_delay.is_zero() {
                tokio::time::sleep(self.page_delay).await;
            }
        }

        info!(
            pages = summary.pages,
            scanned = summary.scanned,
            receipts = summary.receipts,
            imported = summary.imported,
            duplicates = summary.duplicates,
            unresolved = summary.unresolved,
            failed = summary.failed,
            "History import finished"
        );

        Ok(summary)
    }

    async fn import_note(
        &self,
        bot: &BotIdentity,
        note: &PostedNote,
        summary: &mut ImportSummary,
    ) {
        summary.scanned += 1;

        if !ReplyRenderer::is_claim_receipt(&note.text) {
            return;
        }
        summary.receipts += 1;

        let Some(user_id) = receipt_target(bot, note) else {
            debug!(note_id = %note.id, "Receipt has no resolvable user");
            summary.unresolved += 1;
            return;
        };

        let day = self.calendar.day_of(note.created_at);
        match self.history.record(user_id, day).await {
            Ok(true) => summary.imported += 1,
            Ok(false) => summary.duplicates += 1,
            Err(e) => {
                warn!(
                    note_id = %note.id,
                    user_id = %user_id,
                    day = %day,
                    error = %e.format_with_code(),
                    "Failed to record claim history"
                );
                summary.failed += 1;
            }
        }
    }
}

/// The user a receipt was addressed to: the replied-to author, else the
/// first mentioned account other than the bot.
fn receipt_target<'a>(bot: &BotIdentity, note: &'a PostedNote) -> Option<&'a UserId> {
    note.reply_user_id
        .as_ref()
        .filter(|user| **user != bot.id)
        .or_else(|| note.mentions.iter().find(|user| **user != bot.id))
}
