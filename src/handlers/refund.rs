//! Refund intake: flags an order by reference code and files the request.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use validator::{Validate, ValidationError};

use crate::error::AppError;
use crate::refcode;
use crate::AppState;

fn valid_ref_code(code: &str) -> Result<(), ValidationError> {
    if refcode::is_valid(code) {
        Ok(())
    } else {
        Err(ValidationError::new("ref_code"))
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct RefundForm {
    #[validate(custom = "valid_ref_code")]
    pub ref_code: String,
    #[validate(length(min = 1, message = "a reason is required"))]
    pub message: String,
    #[validate(email(message = "a valid contact email is required"))]
    pub email: String,
}

pub async fn request_refund(
    State(state): State<AppState>,
    Json(form): Json<RefundForm>,
) -> Result<Json<Value>, AppError> {
    form.validate()?;
    let order = state
        .orders
        .find_by_ref_code(&form.ref_code)
        .await?
        .ok_or_else(|| AppError::not_found("This order does not exist"))?;
    state.refunds.file_request(order.id, &form.message, &form.email).await?;
    Ok(Json(json!({ "message": "Your request was received." })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(ref_code: &str, email: &str) -> RefundForm {
        RefundForm {
            ref_code: ref_code.to_string(),
            message: "arrived damaged".to_string(),
            email: email.to_string(),
        }
    }

    #[test]
    fn well_formed_request_passes() {
        assert!(form("a1b2c3d4e5f6g7h8i9j0", "who@example.com").validate().is_ok());
    }

    #[test]
    fn malformed_ref_code_is_rejected_before_lookup() {
        let errors = form("NOT-A-REF-CODE", "who@example.com").validate().unwrap_err();
        assert!(errors.field_errors().contains_key("ref_code"));
    }

    #[test]
    fn bad_email_is_rejected() {
        let errors = form("a1b2c3d4e5f6g7h8i9j0", "not-an-email").validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));
    }
}
