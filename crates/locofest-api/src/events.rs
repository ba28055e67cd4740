use std::collections::BTreeMap;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use locofest_types::api::{CalendarResponse, Claims, EventResponse};
use locofest_types::models::{ANALYTICS_COLLECTIONS, Calendar, Event};
use tracing::info;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::{AppState, run_blocking};

/// POST /events: publishes a public event owned by the caller.
pub async fn create_event(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<(StatusCode, Json<EventResponse>), ApiError> {
    let event = Event {
        id: Uuid::new_v4().to_string(),
        calendar_id: None,
        creator_id: Some(claims.sub),
        created_at: Some(Utc::now()),
    };

    let saved = event.clone();
    run_blocking(&state, move |s| s.db.insert_event(&saved)).await?;
    info!("Created public event {}", event.id);

    Ok((StatusCode::CREATED, Json(EventResponse::from(event))))
}

/// POST /private-calendars: opens a private calendar owned by the caller.
pub async fn create_calendar(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<(StatusCode, Json<CalendarResponse>), ApiError> {
    let calendar = Calendar {
        id: Uuid::new_v4().to_string(),
        owner_id: Some(claims.sub),
        user_id: None,
    };

    let saved = calendar.clone();
    run_blocking(&state, move |s| s.db.insert_calendar(&saved)).await?;

    Ok((StatusCode::CREATED, Json(CalendarResponse::from(calendar))))
}

/// POST /private-calendars/{calendar_id}/events: only the calendar's owner
/// may add events.
pub async fn create_calendar_event(
    State(state): State<AppState>,
    Path(calendar_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<(StatusCode, Json<EventResponse>), ApiError> {
    let event = Event {
        id: Uuid::new_v4().to_string(),
        calendar_id: Some(calendar_id.clone()),
        creator_id: Some(claims.sub.clone()),
        created_at: Some(Utc::now()),
    };

    let saved = event.clone();
    run_blocking(&state, move |s| {
        let calendar = s
            .db
            .get_calendar(&calendar_id)?
            .ok_or_else(|| ApiError::NotFound("calendar not found".into()))?;
        if calendar.owner() != Some(claims.sub.as_str()) {
            return Err(ApiError::Forbidden("not the owner of this calendar".into()));
        }
        s.db.insert_event(&saved)?;
        Ok(())
    })
    .await?;

    Ok((StatusCode::CREATED, Json(EventResponse::from(event))))
}

/// POST /events/{event_id}/analytics/{collection}
pub async fn record_event_analytics(
    State(state): State<AppState>,
    Path((event_id, collection)): Path<(String, String)>,
    Extension(claims): Extension<Claims>,
) -> Result<StatusCode, ApiError> {
    record_analytics(state, event_id, None, collection, claims).await
}

/// POST /private-calendars/{calendar_id}/events/{event_id}/analytics/{collection}
pub async fn record_calendar_event_analytics(
    State(state): State<AppState>,
    Path((calendar_id, event_id, collection)): Path<(String, String, String)>,
    Extension(claims): Extension<Claims>,
) -> Result<StatusCode, ApiError> {
    record_analytics(state, event_id, Some(calendar_id), collection, claims).await
}

/// GET /events/{event_id}/analytics: entry count per sub-collection.
pub async fn get_event_analytics(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> Result<Json<BTreeMap<&'static str, usize>>, ApiError> {
    let counts = run_blocking(&state, move |s| {
        if !s.db.event_exists(&event_id, None)? {
            return Err(ApiError::NotFound("event not found".into()));
        }
        Ok(s.db.analytics_counts(&event_id, None)?)
    })
    .await?;

    Ok(Json(counts.into_iter().collect()))
}

async fn record_analytics(
    state: AppState,
    event_id: String,
    calendar_id: Option<String>,
    collection: String,
    claims: Claims,
) -> Result<StatusCode, ApiError> {
    let Some(collection) = ANALYTICS_COLLECTIONS.into_iter().find(|c| *c == collection) else {
        return Err(ApiError::NotFound(format!("unknown analytics collection {collection}")));
    };

    run_blocking(&state, move |s| {
        let calendar_id = calendar_id.as_deref();
        if !s.db.event_exists(&event_id, calendar_id)? {
            return Err(ApiError::NotFound("event not found".into()));
        }
        s.db.insert_analytics(
            collection,
            &Uuid::new_v4().to_string(),
            &event_id,
            calendar_id,
            Some(claims.sub.as_str()),
        )?;
        Ok(())
    })
    .await?;

    Ok(StatusCode::CREATED)
}
