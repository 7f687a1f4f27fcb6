use async_trait::async_trait;
use sqlx::{FromRow, SqlitePool};
use std::sync::Arc;

use crate::persistence::SqliteRepositoryBase;
use logbo_domain::calendar::BonusDay;
use logbo_domain::shared::{DomainError, UserId};
use logbo_domain::streak::{RankingEntry, StreakRecord, StreakRepository};

#[derive(FromRow)]
struct StreakRow {
    user_id: String,
    username: Option<String>,
    total_days: i64,
    consecutive_days: i64,
    last_logbo_date: Option<String>,
}

impl StreakRow {
    fn into_record(self) -> Result<StreakRecord, DomainError> {
        let last_day = self.last_logbo_date.as_deref().ok_or_else(|| {
            DomainError::Repository(format!("Record {} has no last claim date", self.user_id))
        })?;
        let last_day = BonusDay::parse(last_day)
            .map_err(|e| DomainError::Repository(format!("Record {}: {}", self.user_id, e)))?;

        let user_id = UserId::from_string(&self.user_id);
        let label = self.username.unwrap_or_else(|| self.user_id.clone());

        StreakRecord::restore(
            user_id,
            label,
            to_days(self.total_days),
            to_days(self.consecutive_days),
            last_day,
        )
        .map_err(|e| DomainError::Repository(e.to_string()))
    }
}

#[derive(FromRow)]
struct RankingRow {
    username: String,
    consecutive_days: i64,
    total_days: i64,
}

impl RankingRow {
    fn into_entry(self) -> RankingEntry {
        RankingEntry {
            display_label: self.username,
            consecutive_days: to_days(self.consecutive_days),
            total_days: to_days(self.total_days),
        }
    }
}

fn to_days(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

pub struct SqliteStreakRepository {
    base: SqliteRepositoryBase,
}

impl SqliteStreakRepository {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self {
            base: SqliteRepositoryBase::new(pool),
        }
    }
}

#[async_trait]
impl StreakRepository for SqliteStreakRepository {
    async fn find(&self, user_id: &UserId) -> Result<Option<StreakRecord>, DomainError> {
        let query = "SELECT user_id, username, total_days, consecutive_days, last_logbo_date FROM logbo_records WHERE user_id = ?1";

        let row: Option<StreakRow> = self
            .base
            .fetch_optional(
                sqlx::query_as(query).bind(user_id.as_str()),
                "Find streak record",
            )
            .await?;

        row.map(|r| r.into_record()).transpose()
    }

    async fn save(&self, record: &StreakRecord) -> Result<(), DomainError> {
        let query = r#"
            INSERT INTO logbo_records (user_id, username, total_days, consecutive_days, last_logbo_date)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(user_id) DO UPDATE SET
                username = ?2,
                total_days = ?3,
                consecutive_days = ?4,
                last_logbo_date = ?5
        "#;

        self.base
            .execute(
                sqlx::query(query)
                    .bind(record.user_id().as_str())
                    .bind(record.display_label())
                    .bind(i64::from(record.total_days()))
                    .bind(i64::from(record.consecutive_days()))
                    .bind(record.last_claim_day().to_string()),
                "Save streak record",
            )
            .await?;

        Ok(())
    }

    async fn top(&self, limit: u32) -> Result<Vec<RankingEntry>, DomainError> {
        // rowid follows insertion order, which keeps ties stable between calls.
        let query = r#"
            SELECT
                COALESCE(username, user_id) AS username,
                consecutive_days,
                total_days
            FROM logbo_records
            ORDER BY consecutive_days DESC, total_days DESC, rowid ASC
            LIMIT ?1
        "#;

        let rows: Vec<RankingRow> = self
            .base
            .fetch_all(
                sqlx::query_as(query).bind(i64::from(limit)),
                "Load ranking",
            )
            .await?;

        Ok(rows.into_iter().map(|r| r.into_entry()).collect())
    }

    async fn count(&self) -> Result<u64, DomainError> {
        let count: i64 = self
            .base
            .fetch_scalar(
                sqlx::query_scalar("SELECT COUNT(*) FROM logbo_records"),
                "Count streak records",
            )
            .await?;

        Ok(count.max(0) as u64)
    }
}
