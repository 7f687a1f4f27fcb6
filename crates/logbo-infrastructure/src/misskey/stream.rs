use anyhow::{anyhow, bail, Context, Result};
use futures::{SinkExt, StreamExt};
use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use url::Url;
use uuid::Uuid;

use super::types::NoteDto;
use crate::config::{BackoffConfig, TimeoutConfig};
use logbo_domain::feed::{FeedChannel, FeedEvent};

const MAIN_CHANNEL: &str = "main";
const TIMELINE_CHANNEL: &str = "homeTimeline";

#[derive(Debug, Deserialize)]
struct Frame {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    body: Value,
}

#[derive(Debug, Deserialize)]
struct ChannelMessage {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    body: Value,
}

/// Channel ids for one connection; regenerated on every reconnect.
#[derive(Debug, Clone)]
struct Subscriptions {
    main_id: String,
    timeline_id: String,
}

impl Subscriptions {
    fn fresh() -> Self {
        Self {
            main_id: Uuid::new_v4().to_string(),
            timeline_id: Uuid::new_v4().to_string(),
        }
    }

    fn connect_messages(&self) -> [String; 2] {
        [
            connect_message(MAIN_CHANNEL, &self.main_id),
            connect_message(TIMELINE_CHANNEL, &self.timeline_id),
        ]
    }

    /// Map a channel frame to a feed event. `mention` on main and `note` on
    /// the home timeline are the only message kinds the bot consumes.
    fn parse(&self, text: &str) -> Result<Option<FeedEvent>> {
        let frame: Frame = serde_json::from_str(text).context("Malformed frame")?;
        if frame.kind != "channel" {
            return Ok(None);
        }

        let message: ChannelMessage =
            serde_json::from_value(frame.body).context("Malformed channel message")?;

        let channel = if message.id == self.main_id && message.kind == "mention" {
            FeedChannel::Mention
        } else if message.id == self.timeline_id && message.kind == "note" {
            FeedChannel::Timeline
        } else {
            return Ok(None);
        };

        let note: NoteDto = serde_json::from_value(message.body)
            .with_context(|| format!("Malformed note on {}", channel.as_str()))?;

        Ok(Some(note.into_feed_event(channel)))
    }
}

fn connect_message(channel: &str, id: &str) -> String {
    json!({
        "type": "connect",
        "body": { "channel": channel, "id": id }
    })
    .to_string()
}

/// Build `ws(s)://host/streaming?i=token` from the instance origin.
pub fn streaming_url(origin: &str, token: &str) -> Result<Url> {
    let mut url = Url::parse(origin).with_context(|| format!("Invalid origin URL: {}", origin))?;

    let scheme = match url.scheme() {
        "https" | "wss" => "wss",
        "http" | "ws" => "ws",
        other => bail!("Unsupported origin scheme: {}", other),
    };
    url.set_scheme(scheme)
        .map_err(|_| anyhow!("Cannot switch {} to {}", origin, scheme))?;

    url = url.join("streaming").context("Invalid streaming path")?;
    url.query_pairs_mut().clear().append_pair("i", token);

    Ok(url)
}

enum SessionEnd {
    /// The socket closed after a successful subscribe.
    Disconnected,
    /// Nobody is listening for events any more.
    ReceiverClosed,
}

/// Long-lived streaming connection that feeds mention and timeline notes
/// into a channel, reconnecting with exponential backoff.
pub struct MisskeyStream {
    url: Url,
    connect_timeout: Duration,
    reconnect: BackoffConfig,
}

impl MisskeyStream {
    pub fn new(origin: &str, token: &str, timeouts: &TimeoutConfig) -> Result<Self> {
        Ok(Self {
            url: streaming_url(origin, token)?,
            connect_timeout: timeouts.stream_connect,
            reconnect: timeouts.stream_reconnect,
        })
    }

    fn host(&self) -> &str {
        self.url.host_str().unwrap_or("?")
    }

    /// Run until the receiving side of `events` is dropped.
    pub async fn run(self, events: mpsc::Sender<FeedEvent>) {
        let mut delay = self.reconnect.initial;

        loop {
            match self.session(&events).await {
                Ok(SessionEnd::ReceiverClosed) => {
                    info!("Event receiver closed, stopping stream for {}", self.host());
                    return;
                }
                Ok(SessionEnd::Disconnected) => {
                    warn!("Stream for {} disconnected", self.host());
                    delay = self.reconnect.initial;
                }
                Err(e) => {
                    warn!("Stream for {} failed: {:#}", self.host(), e);
                }
            }

            if events.is_closed() {
                return;
            }

            info!("Reconnecting to {} in {:?}", self.host(), delay);
            sleep(delay).await;
            delay = self.reconnect.next(delay);
        }
    }

    async fn session(&self, events: &mpsc::Sender<FeedEvent>) -> Result<SessionEnd> {
        let (ws_stream, _) = timeout(self.connect_timeout, connect_async(self.url.as_str()))
            .await
            .map_err(|_| anyhow!("Connect timed out after {:?}", self.connect_timeout))?
            .context("WebSocket handshake failed")?;

        let (mut write, mut read) = ws_stream.split();
        let subscriptions = Subscriptions::fresh();

        for message in subscriptions.connect_messages() {
            write
                .send(Message::Text(message))
                .await
                .context("Failed to subscribe")?;
        }

        info!(
            "Connected to {} (main={}, homeTimeline={})",
            self.host(),
            subscriptions.main_id,
            subscriptions.timeline_id
        );

        while let Some(message) = read.next().await {
            match message {
                Ok(Message::Text(text)) => match subscriptions.parse(&text) {
                    Ok(Some(event)) => {
                        debug!(
                            "{} note {} from {}",
                            event.channel.as_str(),
                            event.id,
                            event.author.acct()
                        );
                        if events.send(event).await.is_err() {
                            return Ok(SessionEnd::ReceiverClosed);
                        }
                    }
                    Ok(None) => {}
                    Err(e) => warn!("Skipping frame: {:#}", e),
                },
                Ok(Message::Close(frame)) => {
                    debug!("Close frame: {:?}", frame);
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("WebSocket error: {}", e);
                    break;
                }
            }
        }

        Ok(SessionEnd::Disconnected)
    }
}
