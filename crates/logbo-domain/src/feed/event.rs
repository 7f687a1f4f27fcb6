use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::shared::{NoteId, UserId};

/// Live subscription an event was observed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FeedChannel {
    /// Notifications addressed to the bot.
    Mention,
    /// Home/hybrid timeline of accounts the bot follows.
    Timeline,
}

impl FeedChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedChannel::Mention => "mention",
            FeedChannel::Timeline => "timeline",
        }
    }
}

impl fmt::Display for FeedChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Home,
    Followers,
    Specified,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Home => "home",
            Visibility::Followers => "followers",
            Visibility::Specified => "specified",
        }
    }

    /// Unknown hints fall back to public.
    pub fn from_hint(hint: &str) -> Self {
        match hint {
            "home" => Visibility::Home,
            "followers" => Visibility::Followers,
            "specified" => Visibility::Specified,
            _ => Visibility::Public,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: UserId,
    pub username: String,
    /// `None` for accounts on the bot's own instance.
    pub host: Option<String>,
}

impl Author {
    /// Full handle, `user@host` for remote accounts.
    pub fn acct(&self) -> String {
        match self.host.as_deref() {
            Some(host) if !host.is_empty() => format!("{}@{}", self.username, host),
            _ => self.username.clone(),
        }
    }
}

/// One note delivered by a live subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedEvent {
    pub id: NoteId,
    pub channel: FeedChannel,
    pub author: Author,
    pub text: String,
    pub mentions: Vec<UserId>,
    pub created_at: DateTime<Utc>,
    pub reply_id: Option<NoteId>,
    pub visibility: Visibility,
}

impl FeedEvent {
    pub fn mentions(&self, user_id: &UserId) -> bool {
        self.mentions.iter().any(|m| m == user_id)
    }
}
