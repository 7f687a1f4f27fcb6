pub mod history_repo;
pub mod streak_repo;

pub use history_repo::SqliteClaimHistoryRepository;
pub use streak_repo::SqliteStreakRepository;
