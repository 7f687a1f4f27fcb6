use sqlx::SqlitePool;

use logbo_infrastructure::persistence::Database;

/// Fresh in-memory database with every migration applied.
pub async fn setup_in_memory_db() -> SqlitePool {
    let db = Database::in_memory().await.expect("open in-memory db");
    db.run_migrations().await.expect("run migrations");
    db.pool().clone()
}
