use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{CheckoutParams, CheckoutSession, PaymentsError, PaymentsGateway, Result, Subscription};

const DEFAULT_API_BASE: &str = "https://api.stripe.com/v1";

/// Minimal Stripe REST client: form-encoded requests, bearer secret key.
#[derive(Clone)]
pub struct StripeClient {
    http: Client,
    secret_key: String,
    api_base: String,
}

#[derive(Deserialize)]
struct ListResponse<T> {
    data: Vec<T>,
    #[serde(default)]
    has_more: bool,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl StripeClient {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self::with_base(secret_key, DEFAULT_API_BASE)
    }

    pub fn with_base(secret_key: impl Into<String>, api_base: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            secret_key: secret_key.into(),
            api_base: api_base.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base.trim_end_matches('/'), path)
    }
}

/// Turns a non-2xx response into `PaymentsError::Provider` with Stripe's own
/// error message when it sent one.
async fn check(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .ok()
        .and_then(|e| e.error.message)
        .unwrap_or(body);
    Err(PaymentsError::Provider {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl PaymentsGateway for StripeClient {
    async fn create_checkout_session(&self, params: &CheckoutParams) -> Result<CheckoutSession> {
        let form = [
            ("mode", "subscription"),
            ("payment_method_types[0]", "card"),
            ("line_items[0][price]", params.price_id.as_str()),
            ("line_items[0][quantity]", "1"),
            ("success_url", params.success_url.as_str()),
            ("cancel_url", params.cancel_url.as_str()),
            ("metadata[uid]", params.uid.as_str()),
        ];

        let resp = self
            .http
            .post(self.url("checkout/sessions"))
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await?;
        let session: CheckoutSession = check(resp).await?.json().await?;
        debug!("Created checkout session {} for {}", session.id, params.uid);
        Ok(session)
    }

    async fn list_active_subscriptions(&self, limit: u32) -> Result<Vec<Subscription>> {
        let limit_param = limit.to_string();
        let resp = self
            .http
            .get(self.url("subscriptions"))
            .bearer_auth(&self.secret_key)
            .query(&[("status", "active"), ("limit", limit_param.as_str())])
            .send()
            .await?;
        let page: ListResponse<Subscription> = check(resp).await?.json().await?;
        if page.has_more {
            warn!("More than {} active subscriptions; only the first page is searched", limit);
        }
        Ok(page.data)
    }

    async fn cancel_subscription(&self, subscription_id: &str) -> Result<()> {
        if subscription_id.is_empty() {
            return Err(PaymentsError::Decode("empty subscription id".into()));
        }
        let resp = self
            .http
            .delete(self.url(&format!("subscriptions/{subscription_id}")))
            .bearer_auth(&self.secret_key)
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_urls_without_double_slashes() {
        let client = StripeClient::with_base("sk_test", "http://localhost:12111/v1/");
        assert_eq!(client.url("subscriptions"), "http://localhost:12111/v1/subscriptions");
        assert_eq!(StripeClient::new("sk").url("checkout/sessions"), "https://api.stripe.com/v1/checkout/sessions");
    }

    #[test]
    fn decodes_subscription_page() {
        let json = r#"{"object":"list","data":[{"id":"sub_1","status":"active","metadata":{}}],"has_more":true}"#;
        let page: ListResponse<Subscription> = serde_json::from_str(json).unwrap();
        assert_eq!(page.data.len(), 1);
        assert!(page.has_more);
    }
}
