mod event;
mod triggers;

pub use event::{Author, FeedChannel, FeedEvent, Visibility};
pub use triggers::{Trigger, TriggerPhrases, TriggerSet};
