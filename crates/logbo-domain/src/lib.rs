// Domain layer - Pure business logic
// No dependencies on infrastructure or presentation layers

pub mod calendar;
pub mod feed;
pub mod history;
pub mod reply;
pub mod shared;
pub mod social;
pub mod streak;

// Re-exports for convenience
pub use calendar::{BonusCalendar, BonusDay};
pub use shared::{DomainError, NoteId, UserId};
