use axum::{
    Extension, Json,
    extract::{Path, State},
};
use chrono::Utc;
use locofest_types::api::{Claims, ProfileResponse, SetRoleRequest};
use tracing::info;

use crate::error::ApiError;
use crate::state::{AppState, run_blocking};

/// PUT /users/me: creates the caller's profile on first sign-in and refreshes
/// the verification flag from the token afterwards. New profiles are
/// standard accounts.
pub async fn register_me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let now = Utc::now();
    let user = run_blocking(&state, move |s| {
        s.db.register_user(&claims.sub, claims.email_verified, Some(now))?;
        s.db.get_user(&claims.sub)?.ok_or(ApiError::Internal)
    })
    .await?;

    Ok(Json(ProfileResponse::from(user)))
}

/// PUT /users/{user_id}/role: boss accounts grant or revoke tiers.
pub async fn set_role(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SetRoleRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let user = run_blocking(&state, move |s| {
        let caller_role = s.db.get_role(&claims.sub)?;
        if !caller_role.is_some_and(|r| r.is_elevated()) {
            return Err(ApiError::Forbidden("only boss accounts can change roles".into()));
        }
        if !s.db.set_role(&user_id, req.role)? {
            return Err(ApiError::NotFound(format!("no profile for user {user_id}")));
        }
        info!("{} set role of {} to {}", claims.sub, user_id, req.role);
        s.db.get_user(&user_id)?.ok_or(ApiError::Internal)
    })
    .await?;

    Ok(Json(ProfileResponse::from(user)))
}
