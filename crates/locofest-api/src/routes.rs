use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::events;
use crate::messages;
use crate::middleware::require_auth;
use crate::moderation;
use crate::payments;
use crate::profiles;
use crate::state::AppState;

/// All routes, without the transport layers (CORS, tracing) the server adds.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/create-checkout-session", post(payments::create_checkout_session))
        .route("/cancel-subscription", post(payments::cancel_subscription))
        // Authenticates on its own so an anonymous caller gets the
        // callable's refusal rather than a bare 401 from the layer.
        .route("/block-user-in-city", post(moderation::block_user_in_city))
        .route("/health", get(health));

    let protected_routes = Router::new()
        .route(
            "/city-chats/{city_id}/messages",
            get(messages::get_city_messages).post(messages::send_city_message),
        )
        .route(
            "/private-calendars/{calendar_id}/canal",
            get(messages::get_canal_messages).post(messages::send_canal_message),
        )
        .route("/event-reports", post(moderation::create_report))
        .route("/users/me", put(profiles::register_me))
        .route("/users/{user_id}/role", put(profiles::set_role))
        .route("/events", post(events::create_event))
        .route(
            "/events/{event_id}/analytics",
            get(events::get_event_analytics),
        )
        .route(
            "/events/{event_id}/analytics/{collection}",
            post(events::record_event_analytics),
        )
        .route("/private-calendars", post(events::create_calendar))
        .route(
            "/private-calendars/{calendar_id}/events",
            post(events::create_calendar_event),
        )
        .route(
            "/private-calendars/{calendar_id}/events/{event_id}/analytics/{collection}",
            post(events::record_calendar_event_analytics),
        )
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
