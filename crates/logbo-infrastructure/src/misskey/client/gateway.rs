use async_trait::async_trait;
use serde_json::json;

use super::MisskeyClient;
use crate::misskey::types::{CreateNoteRequest, CreatedNoteDto, MeDto, NoteDto, RelationDto};
use logbo_domain::feed::Visibility;
use logbo_domain::shared::{DomainError, NoteId, UserId};
use logbo_domain::social::{BotIdentity, OutgoingReply, PostedNote, Reaction, SocialGateway};

fn external(error: anyhow::Error) -> DomainError {
    DomainError::ExternalService(format!("{:#}", error))
}

#[async_trait]
impl SocialGateway for MisskeyClient {
    async fn whoami(&self) -> Result<BotIdentity, DomainError> {
        let me: MeDto = self
            .execute_with_retry("i", move || self.post_json("i", json!({})))
            .await
            .map_err(external)?;

        Ok(me.into())
    }

    async fn is_followed_by(&self, user_id: &UserId) -> Result<bool, DomainError> {
        let relation: RelationDto = self
            .execute_with_retry("users/relation", move || {
                self.post_json("users/relation", json!({ "userId": user_id.as_str() }))
            })
            .await
            .map_err(external)?;

        Ok(relation.is_followed)
    }

    async fn follow(&self, user_id: &UserId) -> Result<(), DomainError> {
        self.post_unit("following/create", json!({ "userId": user_id.as_str() }))
            .await
            .map_err(external)
    }

    async fn react(&self, note_id: &NoteId, reaction: Reaction) -> Result<(), DomainError> {
        self.post_unit(
            "notes/reactions/create",
            json!({ "noteId": note_id.as_str(), "reaction": reaction.emoji() }),
        )
        .await
        .map_err(external)
    }

    async fn post_reply(&self, reply: &OutgoingReply) -> Result<NoteId, DomainError> {
        let visible_user_ids = if reply.visibility == Visibility::Specified {
            reply.visible_user_ids.iter().map(UserId::as_str).collect()
        } else {
            Vec::new()
        };

        let request = CreateNoteRequest {
            text: &reply.text,
            reply_id: reply.reply_to.as_str(),
            visibility: reply.visibility.as_str(),
            visible_user_ids,
        };
        let body = serde_json::to_value(&request)
            .map_err(|e| DomainError::Serialization(e.to_string()))?;

        let created: CreatedNoteDto = self
            .post_json("notes/create", body)
            .await
            .map_err(external)?;

        Ok(NoteId::from(created.created_note.id))
    }

    async fn list_notes(
        &self,
        user_id: &UserId,
        until_id: Option<NoteId>,
        limit: u32,
    ) -> Result<Vec<PostedNote>, DomainError> {
        let mut body = json!({
            "userId": user_id.as_str(),
            "limit": limit,
            "includeReplies": true,
            "withReplies": true,
        });
        if let Some(until_id) = until_id {
            body["untilId"] = json!(until_id.as_str());
        }

        let notes: Vec<NoteDto> = self
            .execute_with_retry("users/notes", move || self.post_json("users/notes", body.clone()))
            .await
            .map_err(external)?;

        Ok(notes.into_iter().map(NoteDto::into_posted_note).collect())
    }
}
