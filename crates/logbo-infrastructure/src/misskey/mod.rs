//! Misskey adapter: the HTTP API behind `SocialGateway` and the streaming
//! connection that produces `FeedEvent`s.

mod client;
mod stream;
pub mod types;

pub use client::{ApiError, MisskeyClient};
pub use stream::{streaming_url, MisskeyStream};
