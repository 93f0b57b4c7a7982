//! REST client for the PortOne (Iamport) payment API.
//!
//! Wraps the three calls the ledger needs: token acquisition,
//! transaction lookup, and cancellation. Every PortOne response uses a
//! `{ code, message, response }` envelope where a non-zero `code` is a
//! provider-level rejection.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tokio::sync::Mutex;

use async_trait::async_trait;

use crate::gateway::{GatewayError, PaymentGateway, PaymentState, PaymentVerification};

/// Refresh the cached token this long before it actually expires.
const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;

/// Credentials and endpoint for the PortOne REST API.
#[derive(Debug, Clone)]
pub struct PortOneConfig {
    /// Base URL, e.g. `https://api.iamport.kr`.
    pub base_url: String,
    pub api_key: String,
    pub api_secret: String,
}

impl PortOneConfig {
    /// Load PortOne configuration from environment variables.
    ///
    /// | Env Var              | Required | Default                   |
    /// |----------------------|----------|---------------------------|
    /// | `PORTONE_BASE_URL`   | no       | `https://api.iamport.kr`  |
    /// | `PORTONE_API_KEY`    | **yes**  | --                        |
    /// | `PORTONE_API_SECRET` | **yes**  | --                        |
    ///
    /// # Panics
    ///
    /// Panics if a required variable is missing, so misconfiguration
    /// fails at startup rather than at first payment.
    pub fn from_env() -> Self {
        let base_url = std::env::var("PORTONE_BASE_URL")
            .unwrap_or_else(|_| "https://api.iamport.kr".into());
        let api_key =
            std::env::var("PORTONE_API_KEY").expect("PORTONE_API_KEY must be set");
        let api_secret =
            std::env::var("PORTONE_API_SECRET").expect("PORTONE_API_SECRET must be set");

        Self {
            base_url,
            api_key,
            api_secret,
        }
    }
}

struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// HTTP client for PortOne with access-token caching.
pub struct PortOneClient {
    client: reqwest::Client,
    config: PortOneConfig,
    token: Mutex<Option<CachedToken>>,
}

// --- PortOne wire types -----------------------------------------------------

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    code: i32,
    message: Option<String>,
    response: Option<T>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    /// Unix seconds.
    expired_at: i64,
}

#[derive(Debug, Deserialize)]
struct PaymentResponse {
    imp_uid: String,
    amount: i64,
    status: String,
    /// Unix seconds; 0 when not yet paid.
    paid_at: Option<i64>,
}

impl PortOneClient {
    pub fn new(config: PortOneConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            token: Mutex::new(None),
        }
    }

    /// Return a valid access token, fetching a fresh one if the cached
    /// token is absent or about to expire.
    async fn access_token(&self) -> Result<String, GatewayError> {
        let mut guard = self.token.lock().await;

        let needs_refresh = match guard.as_ref() {
            Some(cached) => {
                Utc::now() + Duration::seconds(TOKEN_EXPIRY_MARGIN_SECS) >= cached.expires_at
            }
            None => true,
        };

        if needs_refresh {
            let body = serde_json::json!({
                "imp_key": self.config.api_key,
                "imp_secret": self.config.api_secret,
            });
            let response = self
                .client
                .post(format!("{}/users/getToken", self.config.base_url))
                .json(&body)
                .send()
                .await
                .map_err(transport_error)?;

            let token: TokenResponse = Self::parse_envelope(response).await?;
            tracing::debug!("refreshed PortOne access token");
            *guard = Some(CachedToken {
                token: token.access_token,
                expires_at: DateTime::from_timestamp(token.expired_at, 0)
                    .unwrap_or_else(Utc::now),
            });
        }

        Ok(guard
            .as_ref()
            .map(|cached| cached.token.clone())
            .unwrap_or_default())
    }

    /// Unwrap a PortOne `{ code, message, response }` envelope.
    ///
    /// Non-2xx statuses and unreadable bodies are transport problems
    /// (retryable); a non-zero `code` is the provider saying no.
    async fn parse_envelope<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, GatewayError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Unavailable(format!(
                "PortOne returned {status}: {body}"
            )));
        }

        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| GatewayError::Unavailable(format!("malformed PortOne response: {e}")))?;

        if envelope.code != 0 {
            return Err(GatewayError::Rejected(
                envelope.message.unwrap_or_else(|| "unspecified".into()),
            ));
        }
        envelope.response.ok_or_else(|| {
            GatewayError::Unavailable("PortOne response envelope was empty".into())
        })
    }
}

fn transport_error(err: reqwest::Error) -> GatewayError {
    GatewayError::Unavailable(err.to_string())
}

fn parse_state(status: &str) -> Result<PaymentState, GatewayError> {
    match status {
        "ready" => Ok(PaymentState::Ready),
        "paid" => Ok(PaymentState::Paid),
        "cancelled" => Ok(PaymentState::Cancelled),
        "failed" => Ok(PaymentState::Failed),
        other => Err(GatewayError::Unavailable(format!(
            "unknown PortOne payment status: {other}"
        ))),
    }
}

#[async_trait]
impl PaymentGateway for PortOneClient {
    async fn verify(&self, imp_uid: &str) -> Result<PaymentVerification, GatewayError> {
        let token = self.access_token().await?;
        let response = self
            .client
            .get(format!("{}/payments/{imp_uid}", self.config.base_url))
            .header("Authorization", token)
            .send()
            .await
            .map_err(transport_error)?;

        let payment: PaymentResponse = Self::parse_envelope(response).await?;
        let state = parse_state(&payment.status)?;

        Ok(PaymentVerification {
            imp_uid: payment.imp_uid,
            amount: i32::try_from(payment.amount).map_err(|_| {
                GatewayError::Rejected(format!(
                    "payment amount out of range: {}",
                    payment.amount
                ))
            })?,
            state,
            paid_at: payment
                .paid_at
                .filter(|&secs| secs > 0)
                .and_then(|secs| DateTime::from_timestamp(secs, 0)),
        })
    }

    async fn refund(&self, imp_uid: &str, reason: &str) -> Result<(), GatewayError> {
        let token = self.access_token().await?;
        let body = serde_json::json!({
            "imp_uid": imp_uid,
            "reason": reason,
        });
        let response = self
            .client
            .post(format!("{}/payments/cancel", self.config.base_url))
            .header("Authorization", token)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        // The cancel endpoint echoes the payment record back on success.
        let _: PaymentResponse = Self::parse_envelope(response).await?;
        tracing::info!(imp_uid, "PortOne refund accepted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_provider_states() {
        assert_eq!(parse_state("paid").unwrap(), PaymentState::Paid);
        assert_eq!(parse_state("ready").unwrap(), PaymentState::Ready);
        assert_eq!(parse_state("cancelled").unwrap(), PaymentState::Cancelled);
        assert_eq!(parse_state("failed").unwrap(), PaymentState::Failed);
    }

    #[test]
    fn unknown_provider_state_is_retryable_not_terminal() {
        assert!(matches!(
            parse_state("escrowed"),
            Err(GatewayError::Unavailable(_))
        ));
    }
}
