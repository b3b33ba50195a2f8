//! Payment: converts the open order's total to minor units, charges the
//! gateway, and finalizes the order on success.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::gateway::ChargeError;
use crate::models::Order;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct PaymentForm {
    pub stripe_token: String,
}

/// The correlation id the request-id layer stamped on this request.
fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown")
}

async fn payable_order(state: &AppState, user: CurrentUser) -> Result<Order, AppError> {
    let order = state
        .orders
        .open_for_user(user.id)
        .await?
        .ok_or_else(|| AppError::not_found("You do not have an active order"))?;
    if order.billing_address_id.is_none() {
        return Err(AppError::Precondition("You have not added a billing address".to_string()));
    }
    Ok(order)
}

pub async fn view_payment(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Value>, AppError> {
    let order = payable_order(&state, user).await?;
    let summary = state.orders.summary(&order).await?;
    let amount = summary
        .total_minor_units()
        .ok_or_else(|| AppError::Precondition("Order total cannot be charged".to_string()))?;
    Ok(Json(json!({
        "order": summary.to_json(),
        "amount": amount,
        "display_coupon_form": false,
    })))
}

pub async fn submit_payment(
    State(state): State<AppState>,
    user: CurrentUser,
    headers: HeaderMap,
    Json(form): Json<PaymentForm>,
) -> Result<Json<Value>, AppError> {
    let request_id = request_id(&headers);
    let order = payable_order(&state, user).await?;
    let summary = state.orders.summary(&order).await?;
    let amount = summary
        .total_minor_units()
        .ok_or_else(|| AppError::Precondition("Order total cannot be charged".to_string()))?;

    // The charge comes first; every failure path below it leaves the order
    // open and writes no payment row.
    let charge = state.gateway.charge(amount, "usd", &form.stripe_token).await.map_err(|e| {
        match &e {
            ChargeError::Unknown => {
                tracing::error!(request_id, user_id = %user.id, order_id = %order.id, amount, "unexpected gateway failure")
            }
            _ => tracing::warn!(request_id, user_id = %user.id, order_id = %order.id, amount, error = %e, "charge failed"),
        }
        AppError::from(e)
    })?;

    match state.orders.finalize(order.id, user.id, &charge.id, amount).await {
        Ok(ref_code) => Ok(Json(json!({
            "message": "Your order was successful!",
            "ref_code": ref_code,
            "amount": amount,
        }))),
        Err(e) => {
            // The gateway has captured the charge but the order is still open;
            // reconciliation against the gateway's transaction log needs this.
            tracing::error!(
                request_id,
                user_id = %user.id,
                order_id = %order.id,
                charge_id = %charge.id,
                amount,
                error = %e,
                "charge succeeded but order finalization failed"
            );
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_id_reads_the_correlation_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-request-id", "req-123".parse().unwrap());
        assert_eq!(request_id(&headers), "req-123");
    }

    #[test]
    fn missing_correlation_header_is_marked_unknown() {
        assert_eq!(request_id(&HeaderMap::new()), "unknown");
    }
}
