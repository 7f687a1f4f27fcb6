mod aggregate;
mod ranking;
mod repository;


pub use aggregate::{ClaimOutcome, StreakRecord};
pub use ranking::{Ranking, RankingEntry};
pub use repository::StreakRepository;
