use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::feed::Visibility;
use crate::shared::{DomainError, NoteId, UserId};

/// The bot's own account on the instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotIdentity {
    pub id: UserId,
    pub username: String,
}

/// Reaction placed on the triggering note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reaction {
    Accepted,
    Rejected,
}

impl Reaction {
    pub fn emoji(&self) -> &'static str {
        match self {
            Reaction::Accepted => "⭕",
            Reaction::Rejected => "❌",
        }
    }
}

/// Rendered reply ready to post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingReply {
    pub reply_to: NoteId,
    pub text: String,
    pub visibility: Visibility,
    /// Recipients for `Visibility::Specified` replies.
    pub visible_user_ids: Vec<UserId>,
}

/// One of the bot's own past notes, as listed for the backfill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostedNote {
    pub id: NoteId,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub reply_user_id: Option<UserId>,
    pub mentions: Vec<UserId>,
}

/// Remote social platform operations the bot depends on.
#[async_trait]
pub trait SocialGateway: Send + Sync {
    async fn whoami(&self) -> Result<BotIdentity, DomainError>;

    /// Whether `user_id` currently follows the bot.
    async fn is_followed_by(&self, user_id: &UserId) -> Result<bool, DomainError>;

    async fn follow(&self, user_id: &UserId) -> Result<(), DomainError>;

    async fn react(&self, note_id: &NoteId, reaction: Reaction) -> Result<(), DomainError>;

    async fn post_reply(&self, reply: &OutgoingReply) -> Result<NoteId, DomainError>;

    /// Notes authored by `user_id`, newest first, strictly older than `until_id`.
    async fn list_notes(
        &self,
        user_id: &UserId,
        until_id: Option<NoteId>,
        limit: u32,
    ) -> Result<Vec<PostedNote>, DomainError>;
}
