use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use logbo_domain::calendar::{BonusCalendar, BonusDay};
use logbo_domain::shared::{DomainError, UserId};
use logbo_domain::streak::{ClaimOutcome, Ranking, StreakRecord, StreakRepository};

/// Owns the per-user streak records and serialises claims per user.
///
/// The lock for a user covers find, compute and save only; callers do their
/// remote I/O (relationship check, reactions, replies) outside of it.
pub struct StreakLedger {
    repo: Arc<dyn StreakRepository>,
    calendar: BonusCalendar,
    locks: DashMap<UserId, Arc<Mutex<()>>>,
}

impl StreakLedger {
    pub fn new(repo: Arc<dyn StreakRepository>, calendar: BonusCalendar) -> Self {
        Self {
            repo,
            calendar,
            locks: DashMap::new(),
        }
    }

    fn lock_for(&self, user_id: &UserId) -> Arc<Mutex<()>> {
        self.locks
            .entry(user_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Give back this claim's handle and drop the map entry if nobody else
    /// holds it. `lock_for` clones under the same shard lock, so an entry is
    /// never removed while another claim has a copy.
    fn release(&self, user_id: &UserId, lock: Arc<Mutex<()>>) {
        drop(lock);
        self.locks.remove_if(user_id, |_, held| Arc::strong_count(held) == 1);
    }

    /// Credit `user_id` for the bonus day containing `now`, at most once per day.
    pub async fn claim(
        &self,
        user_id: &UserId,
        display_label: &str,
        now: DateTime<Utc>,
    ) -> Result<ClaimOutcome, DomainError> {
        let today = self.calendar.day_of(now);

        let lock = self.lock_for(user_id);
        let result = {
            let _guard = lock.lock().await;
            self.claim_locked(user_id, display_label, today).await
        };
        self.release(user_id, lock);

        result
    }

    async fn claim_locked(
        &self,
        user_id: &UserId,
        display_label: &str,
        today: BonusDay,
    ) -> Result<ClaimOutcome, DomainError> {
        let Some(mut record) = self.repo.find(user_id).await? else {
            let record =
                StreakRecord::first_claim(user_id.clone(), display_label.to_string(), today);
            self.repo.save(&record).await?;
            debug!(user_id = %user_id, day = %today, "First claim recorded");
            return Ok(record.outcome(false));
        };

        if today < record.last_claim_day() {
            warn!(
                user_id = %user_id,
                today = %today,
                last_claim_day = %record.last_claim_day(),
                "Claim day is before the last recorded claim; treating as already claimed"
            );
        }

        let (outcome, changed) = record.claim(display_label, today);
        if changed {
            self.repo.save(&record).await?;
        }

        debug!(
            user_id = %user_id,
            day = %today,
            already_claimed = outcome.already_claimed_today,
            consecutive = outcome.consecutive_days,
            total = outcome.total_days,
            "Claim processed"
        );

        Ok(outcome)
    }

    #[cfg(test)]
    fn tracked_locks(&self) -> usize {
        self.locks.len()
    }

    /// Leaderboard of at most `n` entries.
    pub async fn top_n(&self, n: u32) -> Result<Ranking, DomainError> {
        let entries = self.repo.top(n).await?;
        Ok(Ranking::from_entries(entries))
    }
}
