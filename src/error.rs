//! Request-level error type and its HTTP mapping.
//!
//! Every failure path in this service resolves to a normal response with a
//! user-visible `message`; nothing here is fatal to the process.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::gateway::ChargeError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("authentication required")]
    Unauthorized,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Precondition(String),

    #[error("{0}")]
    InvalidChoice(String),

    #[error("invalid form input")]
    Validation(#[from] validator::ValidationErrors),

    #[error(transparent)]
    Charge(#[from] ChargeError),

    #[error("internal error")]
    Db(#[from] sqlx::Error),
}

impl AppError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Precondition(_) => StatusCode::CONFLICT,
            Self::InvalidChoice(_) | Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Charge(e) => match e {
                ChargeError::CardDeclined(_) => StatusCode::PAYMENT_REQUIRED,
                ChargeError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
                ChargeError::Network => StatusCode::GATEWAY_TIMEOUT,
                ChargeError::InvalidRequest | ChargeError::AuthFailure | ChargeError::Gateway => {
                    StatusCode::BAD_GATEWAY
                }
                ChargeError::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::Validation(errors) => {
                serde_json::json!({ "message": self.to_string(), "errors": errors })
            }
            Self::Db(e) => {
                tracing::error!(error = %e, "database error");
                serde_json::json!({ "message": "internal error" })
            }
            _ => serde_json::json!({ "message": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_failures_keep_their_own_status() {
        let declined = AppError::from(ChargeError::CardDeclined("insufficient funds".into()));
        assert_eq!(declined.status(), StatusCode::PAYMENT_REQUIRED);
        assert_eq!(declined.to_string(), "insufficient funds");

        assert_eq!(AppError::from(ChargeError::RateLimited).status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(AppError::from(ChargeError::Network).status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(AppError::from(ChargeError::Gateway).status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn not_found_carries_its_message() {
        let err = AppError::not_found("You do not have an active order");
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "You do not have an active order");
    }
}
