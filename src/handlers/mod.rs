//! HTTP surface.

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod coupon;
pub mod payment;
pub mod refund;

use axum::routing::{get, post};
use axum::{Json, Router};

use crate::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "eshop"})) }))
        .route("/", get(catalog::list_items))
        .route("/product/:slug", get(catalog::get_item))
        .route("/add-to-cart/:slug", post(cart::add_to_cart))
        .route("/remove-from-cart/:slug", post(cart::remove_from_cart))
        .route("/remove-single-item-from-cart/:slug", post(cart::decrement_item))
        .route("/order-summary", get(cart::order_summary))
        .route("/checkout", get(checkout::view_checkout).post(checkout::submit_billing_address))
        .route("/payment", get(payment::view_payment).post(payment::submit_payment))
        .route("/apply-coupon", post(coupon::apply_coupon))
        .route("/request-refund", post(refund::request_refund))
        .with_state(state)
}
