//! PayPal subscription verification adapter.
//!
//! Implements the `PaymentVerifier` trait against PayPal's REST API:
//! client-credentials OAuth followed by a subscription details lookup.
//!
//! Verification is advisory. The webhook remains the source of truth, so
//! every failure mode here (missing credentials, network trouble, an
//! unexpected response shape) collapses into `VerifiedStatus::Unknown`
//! rather than an error.
//!
//! # Security
//!
//! - Client secret handled via `secrecy::SecretString`
//! - Access tokens cached in memory until shortly before expiry

use std::time::{Duration, Instant};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::ports::{PaymentVerifier, VerifiedStatus};

/// Refresh the cached token this long before PayPal says it expires.
const TOKEN_EXPIRY_MARGIN_SECS: u64 = 60;

/// Per-request deadline. Verification must never stall webhook handling.
const REQUEST_TIMEOUT_SECS: u64 = 5;

/// PayPal API configuration.
#[derive(Clone)]
pub struct PayPalConfig {
    /// REST app client id.
    client_id: String,

    /// REST app client secret.
    client_secret: SecretString,

    /// Base URL (live: https://api-m.paypal.com, sandbox:
    /// https://api-m.sandbox.paypal.com).
    api_base_url: String,
}

impl PayPalConfig {
    /// Create a new PayPal configuration.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: SecretString::new(client_secret.into()),
            api_base_url: "https://api-m.paypal.com".to_string(),
        }
    }

    /// Set a custom API base URL (sandbox or testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}

/// Cached OAuth access token.
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// PayPal implementation of the PaymentVerifier port.
pub struct PayPalVerifier {
    config: PayPalConfig,
    http_client: reqwest::Client,
    token: Mutex<Option<CachedToken>>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct SubscriptionResponse {
    status: String,
}

impl PayPalVerifier {
    /// Create a new verifier with the given configuration.
    pub fn new(config: PayPalConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();

        Self {
            config,
            http_client,
            token: Mutex::new(None),
        }
    }

    /// Returns a valid access token, fetching a fresh one when the cached
    /// token is missing or about to expire.
    async fn access_token(&self) -> Result<String, reqwest::Error> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Instant::now() {
                return Ok(token.access_token.clone());
            }
        }

        let url = format!("{}/v1/oauth2/token", self.config.api_base_url);
        let response: TokenResponse = self
            .http_client
            .post(&url)
            .basic_auth(
                &self.config.client_id,
                Some(self.config.client_secret.expose_secret()),
            )
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let lifetime = response
            .expires_in
            .saturating_sub(TOKEN_EXPIRY_MARGIN_SECS);
        *cached = Some(CachedToken {
            access_token: response.access_token.clone(),
            expires_at: Instant::now() + Duration::from_secs(lifetime),
        });

        Ok(response.access_token)
    }

    async fn fetch_status(&self, subscription_id: &str) -> Result<String, reqwest::Error> {
        let token = self.access_token().await?;
        let url = format!(
            "{}/v1/billing/subscriptions/{}",
            self.config.api_base_url, subscription_id
        );

        let response: SubscriptionResponse = self
            .http_client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response.status)
    }
}

#[async_trait]
impl PaymentVerifier for PayPalVerifier {
    async fn verify_subscription(&self, subscription_id: &str) -> VerifiedStatus {
        match self.fetch_status(subscription_id).await {
            Ok(status) => match status.as_str() {
                "ACTIVE" => VerifiedStatus::Active,
                "APPROVAL_PENDING" | "APPROVED" | "SUSPENDED" | "CANCELLED" | "EXPIRED" => {
                    VerifiedStatus::Inactive
                }
                other => {
                    tracing::warn!(
                        subscription_id,
                        status = other,
                        "Unrecognized subscription status from PayPal"
                    );
                    VerifiedStatus::Unknown
                }
            },
            Err(e) => {
                tracing::warn!(
                    subscription_id,
                    error = %e,
                    "Could not verify subscription with PayPal"
                );
                VerifiedStatus::Unknown
            }
        }
    }
}

/// Verifier used when no PayPal credentials are configured.
///
/// Answers `Unknown` for everything, which the webhook pipeline treats
/// as "apply the event anyway".
pub struct UnconfiguredVerifier;

#[async_trait]
impl PaymentVerifier for UnconfiguredVerifier {
    async fn verify_subscription(&self, _subscription_id: &str) -> VerifiedStatus {
        VerifiedStatus::Unknown
    }
}
