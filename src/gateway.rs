//! Payment gateway client.
//!
//! The gateway is a black box: given a minor-unit amount, a currency and a
//! payment token it either returns a charge confirmation or one of a closed
//! set of typed failures. Card validation, tokenization and settlement all
//! live on the gateway's side.

use async_trait::async_trait;
use axum::http::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// A confirmed charge, as returned by the gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct Charge {
    pub id: String,
}

/// The full failure taxonomy of a charge attempt. Every variant is non-fatal
/// and maps to a user-visible warning; no retry is attempted for any of them.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChargeError {
    /// The card was declined; carries the gateway's human-readable reason.
    #[error("{0}")]
    CardDeclined(String),
    #[error("Rate limit error")]
    RateLimited,
    #[error("Invalid parameters")]
    InvalidRequest,
    #[error("Not authenticated")]
    AuthFailure,
    #[error("Network error")]
    Network,
    #[error("Something went wrong. You were not charged.")]
    Gateway,
    #[error("A serious error occurred")]
    Unknown,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn charge(&self, amount: i64, currency: &str, source: &str) -> Result<Charge, ChargeError>;
}

/// Stripe's charges API over HTTPS.
pub struct StripeGateway {
    http: reqwest::Client,
    secret_key: String,
    base_url: String,
}

impl StripeGateway {
    pub fn new(secret_key: &str, base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            secret_key: secret_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn charge(&self, amount: i64, currency: &str, source: &str) -> Result<Charge, ChargeError> {
        let response = self
            .http
            .post(format!("{}/v1/charges", self.base_url))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&[
                ("amount", amount.to_string()),
                ("currency", currency.to_string()),
                ("source", source.to_string()),
            ])
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "could not reach payment gateway");
                ChargeError::Network
            })?;

        let status = response.status();
        if status.is_success() {
            return response.json::<Charge>().await.map_err(|e| {
                tracing::warn!(error = %e, "gateway returned an unreadable charge");
                ChargeError::Gateway
            });
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify_failure(status, &body))
    }
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: ErrorDetail,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorDetail {
    #[serde(rename = "type")]
    kind: Option<String>,
    message: Option<String>,
}

/// Maps a non-2xx gateway response onto the failure taxonomy. The error body's
/// `type` wins; an unreadable body falls back to the HTTP status.
fn classify_failure(status: StatusCode, body: &str) -> ChargeError {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(kind) = parsed.error.kind.as_deref() {
            return match kind {
                "card_error" => ChargeError::CardDeclined(
                    parsed.error.message.unwrap_or_else(|| "Your card was declined".to_string()),
                ),
                "rate_limit_error" => ChargeError::RateLimited,
                "invalid_request_error" => ChargeError::InvalidRequest,
                "authentication_error" => ChargeError::AuthFailure,
                "api_error" => ChargeError::Gateway,
                _ => ChargeError::Unknown,
            };
        }
    }
    match status {
        StatusCode::PAYMENT_REQUIRED => ChargeError::CardDeclined("Your card was declined".to_string()),
        StatusCode::TOO_MANY_REQUESTS => ChargeError::RateLimited,
        StatusCode::BAD_REQUEST => ChargeError::InvalidRequest,
        StatusCode::UNAUTHORIZED => ChargeError::AuthFailure,
        _ => ChargeError::Gateway,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(kind: &str, message: &str) -> String {
        serde_json::json!({ "error": { "type": kind, "message": message } }).to_string()
    }

    #[test]
    fn card_errors_surface_the_decline_reason() {
        let err = classify_failure(StatusCode::PAYMENT_REQUIRED, &body("card_error", "insufficient funds"));
        assert_eq!(err, ChargeError::CardDeclined("insufficient funds".into()));
        assert_eq!(err.to_string(), "insufficient funds");
    }

    #[test]
    fn each_error_type_maps_to_its_variant() {
        let cases = [
            ("rate_limit_error", ChargeError::RateLimited),
            ("invalid_request_error", ChargeError::InvalidRequest),
            ("authentication_error", ChargeError::AuthFailure),
            ("api_error", ChargeError::Gateway),
            ("idempotency_error", ChargeError::Unknown),
        ];
        for (kind, expected) in cases {
            assert_eq!(classify_failure(StatusCode::BAD_REQUEST, &body(kind, "x")), expected);
        }
    }

    #[test]
    fn unreadable_bodies_fall_back_to_the_http_status() {
        assert_eq!(classify_failure(StatusCode::TOO_MANY_REQUESTS, "<html>"), ChargeError::RateLimited);
        assert_eq!(classify_failure(StatusCode::UNAUTHORIZED, ""), ChargeError::AuthFailure);
        assert_eq!(classify_failure(StatusCode::BAD_REQUEST, "{}"), ChargeError::InvalidRequest);
        assert_eq!(
            classify_failure(StatusCode::PAYMENT_REQUIRED, "oops"),
            ChargeError::CardDeclined("Your card was declined".into())
        );
        assert_eq!(classify_failure(StatusCode::INTERNAL_SERVER_ERROR, ""), ChargeError::Gateway);
    }
}
