use async_trait::async_trait;
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::persistence::SqliteRepositoryBase;
use logbo_domain::calendar::BonusDay;
use logbo_domain::history::ClaimHistoryRepository;
use logbo_domain::shared::{DomainError, UserId};

pub struct SqliteClaimHistoryRepository {
    base: SqliteRepositoryBase,
}

impl SqliteClaimHistoryRepository {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self {
            base: SqliteRepositoryBase::new(pool),
        }
    }
}

#[async_trait]
impl ClaimHistoryRepository for SqliteClaimHistoryRepository {
    async fn record(&self, user_id: &UserId, day: BonusDay) -> Result<bool, DomainError> {
        let query = "INSERT OR IGNORE INTO logbo_history (user_id, logbo_date) VALUES (?1, ?2)";

        let result = self
            .base
            .execute(
                sqlx::query(query)
                    .bind(user_id.as_str())
                    .bind(day.to_string()),
                "Record claim history",
            )
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn days_for(&self, user_id: &UserId) -> Result<Vec<BonusDay>, DomainError> {
        let query =
            "SELECT logbo_date FROM logbo_history WHERE user_id = ?1 ORDER BY logbo_date ASC";

        let rows: Vec<(String,)> = self
            .base
            .fetch_all(
                sqlx::query_as(query).bind(user_id.as_str()),
                "List claim history",
            )
            .await?;

        rows.into_iter()
            .map(|(day,)| {
                BonusDay::parse(&day).map_err(|e| DomainError::Repository(e.to_string()))
            })
            .collect()
    }
}
