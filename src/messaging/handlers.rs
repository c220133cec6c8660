use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::warn;

use crate::auth::AuthenticatedUser;
use crate::db::models::UserId;
use crate::error::AppError;
use crate::{required_field, AppState};

/// A user id as sent by clients: either a JSON number or a numeric string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum UserIdParam {
    Number(UserId),
    Text(String),
}

impl UserIdParam {
    fn into_id(self, field: &str) -> Result<UserId, AppError> {
        let id = match self {
            UserIdParam::Number(id) => Some(id),
            UserIdParam::Text(text) => text.trim().parse().ok(),
        };
        id.filter(|id| *id >= 1)
            .ok_or_else(|| AppError::ValidationError(format!("{} must be a positive integer", field)))
    }
}

fn parse_user_id(field: &str, value: Option<UserIdParam>) -> Result<UserId, AppError> {
    value
        .ok_or_else(|| AppError::ValidationError(format!("{} is required", field)))?
        .into_id(field)
}

/// Body of a send request. Any sender field a client adds is ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub receiver_id: Option<UserIdParam>,
    pub content: Option<String>,
}

pub async fn send_message(
    user: AuthenticatedUser,
    req: web::Json<SendMessageRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let req = req.into_inner();
    let receiver_id = parse_user_id("receiverId", req.receiver_id)?;
    let content = required_field("content", req.content)?;

    let message = state
        .conversations
        .send(user.id, receiver_id, &content)
        .await
        .map_err(|e| {
            warn!("User {} failed to message user {}: {}", user.id, receiver_id, e);
            AppError::from(e)
        })?;

    Ok(HttpResponse::Created().json(message))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationQuery {
    pub with_user_id: Option<String>,
}

pub async fn list_conversation(
    user: AuthenticatedUser,
    query: web::Query<ConversationQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let counterpart_id = parse_user_id(
        "withUserId",
        query.into_inner().with_user_id.map(UserIdParam::Text),
    )?;

    let messages = state.conversations.conversation(user.id, counterpart_id).await;
    Ok(HttpResponse::Ok().json(messages))
}
