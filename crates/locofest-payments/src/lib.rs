//! Payments adapter: the two subscription operations the backend needs,
//! behind a trait so handlers can be exercised without the provider.

pub mod stripe;

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

pub use stripe::StripeClient;

/// Page size used when looking up a user's subscription. Accounts beyond the
/// first page are not searched.
pub const SUBSCRIPTION_PAGE_LIMIT: u32 = 100;

#[derive(Debug, Error)]
pub enum PaymentsError {
    #[error("payments transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("payments provider error ({status}): {message}")]
    Provider { status: u16, message: String },
    #[error("unexpected payments response: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, PaymentsError>;

#[derive(Debug, Clone)]
pub struct CheckoutParams {
    pub price_id: String,
    pub success_url: String,
    pub cancel_url: String,
    /// Stored in the session metadata so the subscription can be found again.
    pub uid: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Subscription {
    pub id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl Subscription {
    pub fn owner_uid(&self) -> Option<&str> {
        self.metadata.get("uid").map(String::as_str)
    }
}

#[async_trait]
pub trait PaymentsGateway: Send + Sync {
    async fn create_checkout_session(&self, params: &CheckoutParams) -> Result<CheckoutSession>;

    async fn list_active_subscriptions(&self, limit: u32) -> Result<Vec<Subscription>>;

    async fn cancel_subscription(&self, subscription_id: &str) -> Result<()>;
}

/// Linear search for the subscription tagged with `uid`.
pub fn find_subscription_for<'a>(subs: &'a [Subscription], uid: &str) -> Option<&'a Subscription> {
    subs.iter().find(|s| s.owner_uid() == Some(uid))
}
