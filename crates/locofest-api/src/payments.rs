use axum::{Json, extract::State, response::IntoResponse};
use locofest_payments::{CheckoutParams, PaymentsError, SUBSCRIPTION_PAGE_LIMIT, find_subscription_for};
use locofest_types::api::{CancelSubscriptionRequest, CancelSubscriptionResponse, CheckoutRequest};
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;

fn require_uid(uid: Option<String>) -> Result<String, ApiError> {
    uid.filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::Validation("uid is required".into()))
}

/// POST /create-checkout-session: responds with the hosted checkout URL as
/// plain text.
pub async fn create_checkout_session(
    State(state): State<AppState>,
    Json(req): Json<CheckoutRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let uid = require_uid(req.uid)?;

    let params = CheckoutParams {
        price_id: state.checkout.price_id.clone(),
        success_url: state.checkout.success_url.clone(),
        cancel_url: state.checkout.cancel_url.clone(),
        uid,
    };
    let session = state.payments.create_checkout_session(&params).await?;

    session
        .url
        .ok_or_else(|| {
            ApiError::from(PaymentsError::Decode(format!(
                "checkout session {} has no url",
                session.id
            )))
        })
}

/// POST /cancel-subscription: cancels the active subscription tagged with
/// the caller's uid. Only the first page of active subscriptions is searched.
pub async fn cancel_subscription(
    State(state): State<AppState>,
    Json(req): Json<CancelSubscriptionRequest>,
) -> Result<Json<CancelSubscriptionResponse>, ApiError> {
    let uid = require_uid(req.uid)?;

    let subscriptions = state
        .payments
        .list_active_subscriptions(SUBSCRIPTION_PAGE_LIMIT)
        .await?;
    let subscription = find_subscription_for(&subscriptions, &uid)
        .ok_or_else(|| ApiError::NotFound("no subscription found for this user".into()))?;

    state.payments.cancel_subscription(&subscription.id).await?;
    info!("Cancelled subscription {} for {}", subscription.id, uid);

    Ok(Json(CancelSubscriptionResponse { success: true }))
}
