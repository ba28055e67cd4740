use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use locofest_db::Database;
use locofest_policy::{Actor, BlockOutcome, BlockRequest};
use locofest_types::api::{BlockUserRequest, BlockUserResponse, Claims, CreateReportRequest, ReportResponse};
use locofest_types::models::Report;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::claims_from_headers;
use crate::state::{AppState, run_blocking};
use crate::triggers;

fn resolve_actor(db: &Database, caller_id: Option<&str>) -> Result<Option<Actor>, ApiError> {
    let Some(id) = caller_id else {
        return Ok(None);
    };
    Ok(Some(Actor {
        user_id: id.to_string(),
        role: db.get_role(id)?,
    }))
}

/// Resolves both roles, applies the block rules and persists the block.
/// A body that failed to decode is only reported once the caller has passed
/// the identity and role checks.
pub fn issue_block(
    db: &Database,
    caller_id: Option<&str>,
    request: Result<BlockRequest, String>,
    now: DateTime<Utc>,
) -> Result<BlockOutcome, ApiError> {
    let actor = resolve_actor(db, caller_id)?;
    let request = match request {
        Ok(request) => request,
        Err(body_error) => {
            Actor::authorize(actor.as_ref())?;
            return Err(ApiError::Validation(body_error));
        }
    };

    let target = request.validate(actor.as_ref())?;
    let target_role = db.get_role(&target.user_id)?;
    let outcome = target.issue(target_role, now);

    if let BlockOutcome::Issued(record) = &outcome {
        db.upsert_block(record)?;
        info!(
            "{} blocked {} in {} until {}",
            caller_id.unwrap_or_default(),
            record.user_id,
            record.channel_id,
            record.blocked_until
        );
    }
    Ok(outcome)
}

/// POST /block-user-in-city: callable for moderators. Refusing to block
/// another moderator is a normal `{ok: false}` answer, not an error.
pub async fn block_user_in_city(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<BlockUserRequest>, JsonRejection>,
) -> Result<Json<BlockUserResponse>, ApiError> {
    let claims = claims_from_headers(&headers, &state.jwt_secret)?;
    let request = body
        .map(|Json(req)| BlockRequest {
            user_id: req.user_id,
            channel_id: req.city_id,
            minutes: req.minutes,
        })
        .map_err(|rejection| rejection.body_text());
    let now = Utc::now();

    let outcome = run_blocking(&state, move |s| {
        issue_block(&s.db, claims.as_ref().map(|c| c.sub.as_str()), request, now)
    })
    .await?;

    Ok(Json(match outcome {
        BlockOutcome::Issued(record) => BlockUserResponse {
            ok: true,
            reason: None,
            blocked_until: Some(record.blocked_until),
        },
        BlockOutcome::Refused { reason } => BlockUserResponse {
            ok: false,
            reason: Some(reason),
            blocked_until: None,
        },
    }))
}

/// POST /event-reports: files a report and runs the threshold check.
pub async fn create_report(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateReportRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let report = Report {
        id: Uuid::new_v4().to_string(),
        event_id: req.event_id.filter(|id| !id.is_empty()),
        reporter_id: claims.sub,
        created_at: Utc::now(),
    };

    let saved = report.clone();
    run_blocking(&state, move |s| {
        s.db.insert_report(&saved)?;
        // The report is stored either way; a failed check is retried by the
        // next report on the same event.
        if let Err(e) = triggers::on_report_created(&s.db, &s.moderation, saved.event_id.as_deref()) {
            warn!("Report check for {:?} failed: {:#}", saved.event_id, e);
        }
        Ok::<_, ApiError>(())
    })
    .await?;

    Ok((StatusCode::CREATED, Json(ReportResponse::from(report))))
}
