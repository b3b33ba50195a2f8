//! Coupon application: looks a code up and attaches it to the open order.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use validator::Validate;

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CouponForm {
    #[validate(length(min = 1, message = "coupon code is required"))]
    pub code: String,
}

pub async fn apply_coupon(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(form): Json<CouponForm>,
) -> Result<Json<Value>, AppError> {
    form.validate()?;
    let order = state
        .orders
        .open_for_user(user.id)
        .await?
        .ok_or_else(|| AppError::not_found("You do not have an active order"))?;
    let coupon = state
        .coupons
        .find_by_code(&form.code)
        .await?
        .ok_or_else(|| AppError::not_found("This coupon does not exist"))?;
    state.orders.set_coupon(order.id, coupon.id).await?;
    Ok(Json(json!({ "message": "Successfully added coupon", "code": coupon.code })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_code_fails_validation() {
        let form = CouponForm { code: String::new() };
        assert!(form.validate().unwrap_err().field_errors().contains_key("code"));
    }
}
