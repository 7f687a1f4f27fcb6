use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use logbo_domain::feed::{Author, FeedChannel, FeedEvent, Visibility};
use logbo_domain::shared::{NoteId, UserId};
use logbo_domain::social::{BotIdentity, PostedNote};

/// Response of the `i` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct MeDto {
    pub id: String,
    pub username: String,
}

impl From<MeDto> for BotIdentity {
    fn from(me: MeDto) -> Self {
        BotIdentity {
            id: UserId::from(me.id),
            username: me.username,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserLiteDto {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub host: Option<String>,
}

/// Relationship as seen from the bot: `is_followed` means the user follows the bot.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationDto {
    pub id: String,
    #[serde(default)]
    pub is_following: bool,
    #[serde(default)]
    pub is_followed: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteDto {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub user_id: String,
    pub user: UserLiteDto,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub mentions: Option<Vec<String>>,
    #[serde(default)]
    pub visibility: Option<String>,
    #[serde(default)]
    pub reply_id: Option<String>,
    #[serde(default)]
    pub reply: Option<Box<NoteDto>>,
}

impl NoteDto {
    pub fn into_feed_event(self, channel: FeedChannel) -> FeedEvent {
        FeedEvent {
            id: NoteId::from(self.id),
            channel,
            author: Author {
                id: UserId::from(self.user_id),
                username: self.user.username,
                host: self.user.host,
            },
            text: self.text.unwrap_or_default(),
            mentions: self
                .mentions
                .unwrap_or_default()
                .into_iter()
                .map(UserId::from)
                .collect(),
            created_at: self.created_at,
            reply_id: self.reply_id.map(NoteId::from),
            visibility: self
                .visibility
                .as_deref()
                .map(Visibility::from_hint)
                .unwrap_or_default(),
        }
    }

    pub fn into_posted_note(self) -> PostedNote {
        PostedNote {
            id: NoteId::from(self.id),
            text: self.text.unwrap_or_default(),
            created_at: self.created_at,
            reply_user_id: self.reply.map(|r| UserId::from(r.user_id)),
            mentions: self
                .mentions
                .unwrap_or_default()
                .into_iter()
                .map(UserId::from)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedNoteDto {
    pub created_note: CreatedNoteIdDto,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatedNoteIdDto {
    pub id: String,
}

/// Body of `notes/create`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNoteRequest<'a> {
    pub text: &'a str,
    pub reply_id: &'a str,
    pub visibility: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub visible_user_ids: Vec<&'a str>,
}

/// Error envelope returned by the API on 4xx/5xx.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorEnvelope {
    pub error: ApiErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub code: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const MENTION_NOTE: &str = r#"{
        "id": "9t0abc",
        "createdAt": "2024-06-01T21:15:00.000Z",
        "userId": "u-remote",
        "user": { "id": "u-remote", "username": "alice", "host": "remote.example" },
        "text": "@logbo ログボ",
        "mentions": ["bot-1"],
        "visibility": "specified",
        "replyId": null
    }"#;

    #[test]
    fn test_note_into_feed_event() {
        let note: NoteDto = serde_json::from_str(MENTION_NOTE).unwrap();
        let event = note.into_feed_event(FeedChannel::Mention);

        assert_eq!(event.id.as_str(), "9t0abc");
        assert_eq!(event.author.acct(), "alice@remote.example");
        assert_eq!(event.visibility, Visibility::Specified);
        assert!(event.mentions(&UserId::from_string("bot-1")));
        assert!(event.reply_id.is_none());
    }

    #[test]
    fn test_note_without_text_or_mentions() {
        let json = r#"{
            "id": "n1",
            "createdAt": "2024-06-01T00:00:00Z",
            "userId": "u1",
            "user": { "id": "u1", "username": "bob", "host": null },
            "text": null
        }"#;
        let event = serde_json::from_str::<NoteDto>(json)
            .unwrap()
            .into_feed_event(FeedChannel::Timeline);

        assert_eq!(event.text, "");
        assert!(event.mentions.is_empty());
        assert_eq!(event.author.acct(), "bob");
        assert_eq!(event.visibility, Visibility::Public);
    }

    #[test]
    fn test_posted_note_takes_reply_target() {
        let json = r#"{
            "id": "reply-1",
            "createdAt": "2024-06-01T21:16:00Z",
            "userId": "bot-1",
            "user": { "id": "bot-1", "username": "logbo" },
            "text": "@alice ログインボーナス！",
            "mentions": ["u-remote"],
            "reply": {
                "id": "9t0abc",
                "createdAt": "2024-06-01T21:15:00Z",
                "userId": "u-remote",
                "user": { "id": "u-remote", "username": "alice" }
            }
        }"#;
        let posted = serde_json::from_str::<NoteDto>(json)
            .unwrap()
            .into_posted_note();

        assert_eq!(posted.reply_user_id, Some(UserId::from_string("u-remote")));
        assert_eq!(posted.mentions, vec![UserId::from_string("u-remote")]);
    }

    #[test]
    fn test_create_note_request_omits_empty_recipients() {
        let body = CreateNoteRequest {
            text: "hi",
            reply_id: "n1",
            visibility: "public",
            visible_user_ids: Vec::new(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["replyId"], "n1");
        assert!(json.get("visibleUserIds").is_none());
    }
}
