// Shared fakes for application service tests.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use mockall::mock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use super::event_processor::Clock;
use logbo_domain::calendar::BonusDay;
use logbo_domain::feed::{Author, FeedChannel, FeedEvent, Visibility};
use logbo_domain::history::ClaimHistoryRepository;
use logbo_domain::shared::{DomainError, NoteId, UserId};
use logbo_domain::social::{BotIdentity, OutgoingReply, PostedNote, Reaction, SocialGateway};
use logbo_domain::streak::{RankingEntry, StreakRecord, StreakRepository};

mock! {
    pub Gateway {}

    #[async_trait]
    impl SocialGateway for Gateway {
        async fn whoami(&self) -> Result<BotIdentity, DomainError>;
        async fn is_followed_by(&self, user_id: &UserId) -> Result<bool, DomainError>;
        async fn follow(&self, user_id: &UserId) -> Result<(), DomainError>;
        async fn react(&self, note_id: &NoteId, reaction: Reaction) -> Result<(), DomainError>;
        async fn post_reply(&self, reply: &OutgoingReply) -> Result<NoteId, DomainError>;
        async fn list_notes(
            &self,
            user_id: &UserId,
            until_id: Option<NoteId>,
            limit: u32,
        ) -> Result<Vec<PostedNote>, DomainError>;
    }
}

/// Insertion-ordered in-memory ledger store.
pub struct InMemoryStreakRepository {
    records: tokio::sync::RwLock<Vec<StreakRecord>>,
    saves: AtomicUsize,
    fail_saves: AtomicBool,
}

impl InMemoryStreakRepository {
    pub fn new() -> Self {
        Self {
            records: tokio::sync::RwLock::new(Vec::new()),
            saves: AtomicUsize::new(0),
            fail_saves: AtomicBool::new(false),
        }
    }

    pub async fn get(&self, user_id: &UserId) -> Option<StreakRecord> {
        let records = self.records.read().await;
        records.iter().find(|r| r.user_id() == user_id).cloned()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl StreakRepository for InMemoryStreakRepository {
    async fn find(&self, user_id: &UserId) -> Result<Option<StreakRecord>, DomainError> {
        // Yield so unsynchronised callers would interleave here.
        tokio::task::yield_now().await;
        Ok(self.get(user_id).await)
    }

    async fn save(&self, record: &StreakRecord) -> Result<(), DomainError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(DomainError::Repository("disk full".to_string()));
        }

        let mut records = self.records.write().await;
        match records.iter_mut().find(|r| r.user_id() == record.user_id()) {
            Some(existing) => *existing = record.clone(),
            None => records.push(record.clone()),
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn top(&self, limit: u32) -> Result<Vec<RankingEntry>, DomainError> {
        let mut records = self.records.read().await.clone();
        records.sort_by(|a, b| {
            b.consecutive_days()
                .cmp(&a.consecutive_days())
                .then(b.total_days().cmp(&a.total_days()))
        });

        Ok(records
            .into_iter()
            .take(limit as usize)
            .map(|r| RankingEntry {
                display_label: r.display_label().to_string(),
                consecutive_days: r.consecutive_days(),
                total_days: r.total_days(),
            })
            .collect())
    }

    async fn count(&self) -> Result<u64, DomainError> {
        Ok(self.records.read().await.len() as u64)
    }
}

pub struct InMemoryHistoryRepository {
    days: tokio::sync::RwLock<HashMap<UserId, Vec<BonusDay>>>,
    failing: Mutex<Option<UserId>>,
}

impl InMemoryHistoryRepository {
    pub fn new() -> Self {
        Self {
            days: tokio::sync::RwLock::new(HashMap::new()),
            failing: Mutex::new(None),
        }
    }

    /// Make every insert for `user_id` fail.
    pub fn fail_for(&self, user_id: &str) {
        *self.failing.lock().unwrap() = Some(UserId::from_string(user_id));
    }
}

#[async_trait]
impl ClaimHistoryRepository for InMemoryHistoryRepository {
    async fn record(&self, user_id: &UserId, day: BonusDay) -> Result<bool, DomainError> {
        if self.failing.lock().unwrap().as_ref() == Some(user_id) {
            return Err(DomainError::Repository("database is locked".to_string()));
        }

        let mut days = self.days.write().await;
        let entry = days.entry(user_id.clone()).or_default();
        if entry.contains(&day) {
            return Ok(false);
        }
        entry.push(day);
        Ok(true)
    }

    async fn days_for(&self, user_id: &UserId) -> Result<Vec<BonusDay>, DomainError> {
        let days = self.days.read().await;
        let mut result = days.get(user_id).cloned().unwrap_or_default();
        result.sort();
        Ok(result)
    }
}

/// Clock pinned to one instant, movable by tests.
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap() = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

pub fn bot() -> BotIdentity {
    BotIdentity {
        id: UserId::from_string("bot-1"),
        username: "logbo".to_string(),
    }
}

/// Local, public note without mentions.
pub fn event(id: &str, channel: FeedChannel, author: &str, text: &str) -> FeedEvent {
    FeedEvent {
        id: NoteId::from_string(id),
        channel,
        author: Author {
            id: UserId::from_string(author),
            username: author.to_string(),
            host: None,
        },
        text: text.to_string(),
        mentions: Vec::new(),
        created_at: Utc.with_ymd_and_hms(2024, 6, 1, 3, 0, 0).unwrap(),
        reply_id: None,
        visibility: Visibility::Public,
    }
}
