use logbo_domain::shared::DomainError;
use sqlx::query::{Query, QueryAs, QueryScalar};
use sqlx::sqlite::{SqliteArguments, SqliteQueryResult, SqliteRow};
use sqlx::{FromRow, Sqlite, SqlitePool};
use std::sync::Arc;

use super::ResultExt;

/// Shared plumbing for SQLite repositories: owns the pool and maps every
/// sqlx error to `DomainError::Repository` with the operation name attached.
#[derive(Clone)]
pub struct SqliteRepositoryBase {
    pool: Arc<SqlitePool>,
}

impl SqliteRepositoryBase {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn execute<'q>(
        &self,
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
        context: &str,
    ) -> Result<SqliteQueryResult, DomainError> {
        query.execute(self.pool()).await.map_repo_error(context)
    }

    pub async fn fetch_optional<'q, O>(
        &self,
        query: QueryAs<'q, Sqlite, O, SqliteArguments<'q>>,
        context: &str,
    ) -> Result<Option<O>, DomainError>
    where
        O: Send + Unpin + for<'r> FromRow<'r, SqliteRow>,
    {
        query.fetch_optional(self.pool()).await.map_repo_error(context)
    }

    pub async fn fetch_all<'q, O>(
        &self,
        query: QueryAs<'q, Sqlite, O, SqliteArguments<'q>>,
        context: &str,
    ) -> Result<Vec<O>, DomainError>
    where
        O: Send + Unpin + for<'r> FromRow<'r, SqliteRow>,
    {
        query.fetch_all(self.pool()).await.map_repo_error(context)
    }

    pub async fn fetch_scalar<'q, O>(
        &self,
        query: QueryScalar<'q, Sqlite, O, SqliteArguments<'q>>,
        context: &str,
    ) -> Result<O, DomainError>
    where
        O: Send + Unpin,
        (O,): for<'r> FromRow<'r, SqliteRow>,
    {
        query.fetch_one(self.pool()).await.map_repo_error(context)
    }
}
