use async_trait::async_trait;

use crate::calendar::BonusDay;
use crate::shared::{DomainError, UserId};

/// Append-only audit log of claim days, filled by the backfill job.
///
/// Unique per `(user, day)`. The live claim path never reads it.
#[async_trait]
pub trait ClaimHistoryRepository: Send + Sync {
    /// Returns `true` when a new row was written, `false` for a duplicate.
    async fn record(&self, user_id: &UserId, day: BonusDay) -> Result<bool, DomainError>;

    async fn days_for(&self, user_id: &UserId) -> Result<Vec<BonusDay>, DomainError>;
}
