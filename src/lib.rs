//! Eshop Storefront
//!
//! Small self-hosted e-commerce storefront service.
//!
//! ## Features
//! - Product catalog listing and detail lookup
//! - Per-user shopping cart (one open order per user)
//! - Checkout with billing address capture
//! - Payment capture through an external gateway
//! - Coupon application and refund intake

use std::sync::Arc;

pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod models;
pub mod refcode;
pub mod store;

pub use config::Config;
pub use error::AppError;

use gateway::PaymentGateway;
use store::{CouponRepo, ItemRepo, OrderRepo, RefundRepo};

#[derive(Clone)]
pub struct AppState {
    pub items: ItemRepo,
    pub orders: OrderRepo,
    pub coupons: CouponRepo,
    pub refunds: RefundRepo,
    pub gateway: Arc<dyn PaymentGateway>,
}

impl AppState {
    pub fn new(db: sqlx::PgPool, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self {
            items: ItemRepo::new(db.clone()),
            orders: OrderRepo::new(db.clone()),
            coupons: CouponRepo::new(db.clone()),
            refunds: RefundRepo::new(db),
            gateway,
        }
    }
}
