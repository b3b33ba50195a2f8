//! Checkout: billing address capture and payment-path selection.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use validator::Validate;

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::store::NewBillingAddress;
use crate::AppState;

/// The closed set of supported payment paths. Anything else is rejected at
/// the validation boundary, before any row is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentChoice {
    Stripe,
    Paypal,
}

impl PaymentChoice {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "stripe" => Some(Self::Stripe),
            "paypal" => Some(Self::Paypal),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CheckoutForm {
    #[validate(length(min = 1, message = "street address is required"))]
    pub street_address: String,
    pub apartment_address: Option<String>,
    #[validate(length(min = 1, message = "country is required"))]
    pub country: String,
    #[validate(length(min = 1, message = "zip is required"))]
    pub zip: String,
    pub payment_option: String,
}

pub async fn view_checkout(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Value>, AppError> {
    let order = state
        .orders
        .open_for_user(user.id)
        .await?
        .ok_or_else(|| AppError::not_found("You do not have an active order"))?;
    let summary = state.orders.summary(&order).await?;
    Ok(Json(json!({ "order": summary.to_json(), "display_coupon_form": true })))
}

pub async fn submit_billing_address(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(form): Json<CheckoutForm>,
) -> Result<Json<Value>, AppError> {
    let order = state
        .orders
        .open_for_user(user.id)
        .await?
        .ok_or_else(|| AppError::not_found("You do not have an active order"))?;
    form.validate()?;
    let choice = PaymentChoice::parse(&form.payment_option)
        .ok_or_else(|| AppError::InvalidChoice("Invalid payment option selected".to_string()))?;
    state
        .orders
        .attach_billing(
            order.id,
            user.id,
            NewBillingAddress {
                street_address: form.street_address,
                apartment_address: form.apartment_address.filter(|a| !a.is_empty()),
                country: form.country,
                zip: form.zip,
            },
        )
        .await?;
    Ok(Json(json!({
        "message": "Billing address saved",
        "payment_option": choice,
        "next": "/payment",
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(street: &str, option: &str) -> CheckoutForm {
        CheckoutForm {
            street_address: street.to_string(),
            apartment_address: None,
            country: "US".to_string(),
            zip: "10001".to_string(),
            payment_option: option.to_string(),
        }
    }

    #[test]
    fn payment_choice_is_a_closed_set() {
        assert_eq!(PaymentChoice::parse("stripe"), Some(PaymentChoice::Stripe));
        assert_eq!(PaymentChoice::parse("paypal"), Some(PaymentChoice::Paypal));
        assert_eq!(PaymentChoice::parse("bitcoin"), None);
        assert_eq!(PaymentChoice::parse(""), None);
        assert_eq!(PaymentChoice::parse("Stripe"), None);
    }

    #[test]
    fn empty_street_address_fails_validation_with_a_field_error() {
        let errors = form("", "stripe").validate().unwrap_err();
        assert!(errors.field_errors().contains_key("street_address"));
    }

    #[test]
    fn complete_address_passes_validation() {
        assert!(form("123 Main St", "stripe").validate().is_ok());
    }
}
