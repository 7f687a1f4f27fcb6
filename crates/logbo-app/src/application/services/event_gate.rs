use chrono::{DateTime, Duration, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use logbo_domain::feed::{FeedChannel, FeedEvent, Trigger, TriggerPhrases, TriggerSet};
use logbo_domain::shared::{NoteId, UserId};
use logbo_domain::social::{BotIdentity, SocialGateway};

// One year.
const MAX_RETENTION_MINUTES: u64 = 525_600;

/// Why an event never reached a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Authored by the bot itself.
    OwnNote,
    /// Timeline copy of a note that mentions the bot; the mention channel owns it.
    OwnedByMentionChannel,
    /// No trigger phrase routed on this channel.
    NoTrigger,
    /// Older than the dedup retention window, so a replay could no longer be told apart.
    Stale,
    /// Note id already admitted from either channel.
    Duplicate,
}

impl DropReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DropReason::OwnNote => "own_note",
            DropReason::OwnedByMentionChannel => "owned_by_mention_channel",
            DropReason::NoTrigger => "no_trigger",
            DropReason::Stale => "stale",
            DropReason::Duplicate => "duplicate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Dropped(DropReason),
    Admitted(TriggerSet),
}

/// Decides whether a feed event reaches any workflow.
///
/// Admission marks the note id as handled with an atomic insert-if-absent,
/// so two deliveries of the same note (either channel, any order) can never
/// both be admitted. Notes older than the retention window are refused
/// outright: their ids may already have been pruned.
pub struct EventGate {
    bot: BotIdentity,
    phrases: TriggerPhrases,
    gateway: Arc<dyn SocialGateway>,
    seen: DashMap<NoteId, DateTime<Utc>>,
    retention: Duration,
}

impl EventGate {
    pub fn new(
        bot: BotIdentity,
        phrases: TriggerPhrases,
        gateway: Arc<dyn SocialGateway>,
        retention_minutes: u64,
    ) -> Self {
        Self {
            bot,
            phrases,
            gateway,
            seen: DashMap::new(),
            retention: Duration::minutes(retention_minutes.min(MAX_RETENTION_MINUTES) as i64),
        }
    }

    pub fn admit(&self, event: &FeedEvent, now: DateTime<Utc>) -> GateDecision {
        if event.author.id == self.bot.id {
            return GateDecision::Dropped(DropReason::OwnNote);
        }

        if event.channel == FeedChannel::Timeline && event.mentions(&self.bot.id) {
            return GateDecision::Dropped(DropReason::OwnedByMentionChannel);
        }

        let detected = self.phrases.detect(&event.text);
        // Follow and ranking requests must be addressed to the bot.
        let triggers = match event.channel {
            FeedChannel::Mention => detected,
            FeedChannel::Timeline => detected.only(Trigger::Claim),
        };
        if triggers.is_empty() {
            return GateDecision::Dropped(DropReason::NoTrigger);
        }

        if event.created_at < now - self.retention {
            return GateDecision::Dropped(DropReason::Stale);
        }

        self.prune(now);

        match self.seen.entry(event.id.clone()) {
            Entry::Occupied(_) => GateDecision::Dropped(DropReason::Duplicate),
            Entry::Vacant(slot) => {
                // Kept at least until the note itself leaves the window.
                slot.insert(now.max(event.created_at));
                GateDecision::Admitted(triggers)
            }
        }
    }

    /// Whether `user_id` may claim right now. Any failure of the relationship
    /// query counts as not eligible.
    pub async fn check_eligibility(&self, user_id: &UserId) -> bool {
        match self.gateway.is_followed_by(user_id).await {
            Ok(eligible) => eligible,
            Err(e) => {
                warn!(
                    user_id = %user_id,
                    error = %e.format_with_code(),
                    "Relationship check failed; treating user as not following"
                );
                false
            }
        }
    }

    fn prune(&self, now: DateTime<Utc>) {
        let cutoff = now - self.retention;
        let before = self.seen.len();
        self.seen.retain(|_, seen_at| *seen_at >= cutoff);
        let pruned = before.saturating_sub(self.seen.len());
        if pruned > 0 {
            debug!(pruned, "Pruned handled note ids");
        }
    }

    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }
}
