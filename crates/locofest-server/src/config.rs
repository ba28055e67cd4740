use std::path::PathBuf;

use anyhow::{Result, bail};

/// JWT secrets that must never reach production.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

/// Upper bound for the sweep interval (one leap year).
const MAX_SWEEP_INTERVAL_HOURS: u64 = 24 * 366;

const DEFAULT_PRICE_ID: &str = "price_1RqDLRC1pv51tIEWYcI7ROms";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub stripe_secret_key: String,
    pub price_id: String,
    pub success_url: String,
    pub cancel_url: String,
    pub sweep_interval_hours: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests need not touch the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let jwt_secret = lookup("LOCOFEST_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("LOCOFEST_JWT_SECRET is unset or still a placeholder");
        }

        let stripe_secret_key = lookup("STRIPE_SECRET_KEY").unwrap_or_default();
        if stripe_secret_key.is_empty() {
            bail!("STRIPE_SECRET_KEY is not set");
        }

        let sweep_interval_hours: u64 = var("LOCOFEST_SWEEP_INTERVAL_HOURS", "24").parse()?;
        if !(1..=MAX_SWEEP_INTERVAL_HOURS).contains(&sweep_interval_hours) {
            bail!(
                "LOCOFEST_SWEEP_INTERVAL_HOURS must be between 1 and {}",
                MAX_SWEEP_INTERVAL_HOURS
            );
        }

        Ok(Self {
            host: var("LOCOFEST_HOST", "0.0.0.0"),
            port: var("LOCOFEST_PORT", "4242").parse()?,
            db_path: var("LOCOFEST_DB_PATH", "locofest.db").into(),
            jwt_secret,
            stripe_secret_key,
            price_id: var("LOCOFEST_PRICE_ID", DEFAULT_PRICE_ID),
            success_url: var("LOCOFEST_SUCCESS_URL", "https://locofest.net/success.html"),
            cancel_url: var("LOCOFEST_CANCEL_URL", "https://locofest.net/cancel.html"),
            sweep_interval_hours,
        })
    }
}
