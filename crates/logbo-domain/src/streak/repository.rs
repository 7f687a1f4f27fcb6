use async_trait::async_trait;

use super::{RankingEntry, StreakRecord};
use crate::shared::{DomainError, UserId};

#[async_trait]
pub trait StreakRepository: Send + Sync {
    async fn find(&self, user_id: &UserId) -> Result<Option<StreakRecord>, DomainError>;

    /// Insert or replace the whole record in one statement.
    async fn save(&self, record: &StreakRecord) -> Result<(), DomainError>;

    /// At most `limit` entries ordered by consecutive days, then total days,
    /// both descending; ties keep insertion order.
    async fn top(&self, limit: u32) -> Result<Vec<RankingEntry>, DomainError>;

    async fn count(&self) -> Result<u64, DomainError>;
}
