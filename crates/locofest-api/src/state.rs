use std::sync::Arc;

use locofest_db::Database;
use locofest_payments::PaymentsGateway;
use locofest_policy::chat_window::DEFAULT_WINDOW;
use locofest_policy::{ModerationPolicy, RetentionPolicy};
use tracing::error;

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub payments: Arc<dyn PaymentsGateway>,
    pub jwt_secret: String,
    pub checkout: CheckoutConfig,
    pub retention: RetentionPolicy,
    pub moderation: ModerationPolicy,
    pub chat_window: usize,
}

/// Fixed plan the checkout route sells.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    pub price_id: String,
    pub success_url: String,
    pub cancel_url: String,
}

impl AppStateInner {
    /// State with the default retention, moderation and window policies.
    pub fn new(
        db: Database,
        payments: Arc<dyn PaymentsGateway>,
        jwt_secret: String,
        checkout: CheckoutConfig,
    ) -> Self {
        Self {
            db,
            payments,
            jwt_secret,
            checkout,
            retention: RetentionPolicy::default(),
            moderation: ModerationPolicy::default(),
            chat_window: DEFAULT_WINDOW,
        }
    }
}

/// Runs a store operation off the async runtime.
pub async fn run_blocking<F, T, E>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&AppStateInner) -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Into<ApiError> + Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal
        })?
        .map_err(Into::into)
}
