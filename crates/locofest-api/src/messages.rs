use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use locofest_types::api::{Claims, MessageResponse, SendMessageRequest};
use locofest_types::models::{ChannelKind, ChatMessage};
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::{AppState, run_blocking};
use crate::triggers;

const MAX_MESSAGE_LEN: usize = 2000;

#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    50
}

pub async fn send_city_message(
    State(state): State<AppState>,
    Path(city_id): Path<String>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    post_message(state, ChannelKind::CityChat, city_id, claims, req).await
}

pub async fn send_canal_message(
    State(state): State<AppState>,
    Path(calendar_id): Path<String>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    post_message(state, ChannelKind::Canal, calendar_id, claims, req).await
}

pub async fn get_city_messages(
    State(state): State<AppState>,
    Path(city_id): Path<String>,
    Query(query): Query<MessageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    list_messages(state, ChannelKind::CityChat, city_id, query).await
}

pub async fn get_canal_messages(
    State(state): State<AppState>,
    Path(calendar_id): Path<String>,
    Query(query): Query<MessageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    list_messages(state, ChannelKind::Canal, calendar_id, query).await
}

/// Stores the message, then trims the channel back to its window. Authors
/// with an active block on a city chat are turned away.
async fn post_message(
    state: AppState,
    kind: ChannelKind,
    channel_id: String,
    claims: Claims,
    req: SendMessageRequest,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    if req.text.trim().is_empty() || req.text.len() > MAX_MESSAGE_LEN {
        return Err(ApiError::Validation(format!(
            "message text must be 1 to {MAX_MESSAGE_LEN} bytes"
        )));
    }

    let now = Utc::now();
    let message = ChatMessage {
        id: Uuid::new_v4().to_string(),
        channel_id,
        author_id: claims.sub,
        text: req.text,
        sent_at: now,
    };

    let saved = message.clone();
    run_blocking(&state, move |s| {
        if kind == ChannelKind::CityChat {
            let block = s.db.get_block(&saved.author_id, &saved.channel_id.to_lowercase())?;
            if let Some(block) = block.filter(|b| b.blocked_until > now) {
                return Err(ApiError::Forbidden(format!(
                    "blocked in this chat until {}",
                    block.blocked_until
                )));
            }
        }

        s.db.insert_message(kind, &saved)?;
        if let Err(e) = triggers::on_message_created(&s.db, kind, &saved.channel_id, s.chat_window) {
            warn!("Trim of {} {} failed: {:#}", kind, saved.channel_id, e);
        }
        Ok::<_, ApiError>(())
    })
    .await?;

    Ok((StatusCode::CREATED, Json(MessageResponse::from(message))))
}

async fn list_messages(
    state: AppState,
    kind: ChannelKind,
    channel_id: String,
    query: MessageQuery,
) -> Result<Json<Vec<MessageResponse>>, ApiError> {
    let limit = query.limit.min(200);
    let rows = run_blocking(&state, move |s| s.db.get_messages(kind, &channel_id, limit)).await?;
    Ok(Json(rows.into_iter().map(MessageResponse::from).collect()))
}
