//! Persisted rows and the order-summary view.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A purchasable product. Read-only to this service.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Item {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub label: Option<String>,
    pub price: Decimal,
    pub discount_price: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

impl Item {
    /// Unit price the cart charges: the discount price when one is set.
    pub fn effective_price(&self) -> Decimal {
        self.discount_price.unwrap_or(self.price)
    }
}

/// One order per user while `ordered = false` (the cart); permanent order
/// history afterwards. `ref_code` is assigned only at successful payment.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub ordered: bool,
    pub ordered_date: DateTime<Utc>,
    pub billing_address_id: Option<Uuid>,
    pub coupon_id: Option<Uuid>,
    pub payment_id: Option<Uuid>,
    pub ref_code: Option<String>,
    pub refund_requested: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub user_id: Uuid,
    pub item_id: Uuid,
    pub quantity: i32,
    pub ordered: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BillingAddress {
    pub id: Uuid,
    pub user_id: Uuid,
    pub street_address: String,
    pub apartment_address: Option<String>,
    pub country: String,
    pub zip: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Coupon {
    pub id: Uuid,
    pub code: String,
    pub amount: Decimal,
}

/// Record of one successful charge, attached 1:1 to the order it paid for.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub charge_id: String,
    pub user_id: Uuid,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Refund {
    pub id: Uuid,
    pub order_id: Uuid,
    pub reason: String,
    pub email: String,
    pub accepted: bool,
    pub created_at: DateTime<Utc>,
}

/// One cart line joined with its item's display fields.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CartLine {
    pub item_id: Uuid,
    pub slug: String,
    pub name: String,
    pub quantity: i32,
    pub price: Decimal,
    pub discount_price: Option<Decimal>,
}

impl CartLine {
    pub fn unit_price(&self) -> Decimal {
        self.discount_price.unwrap_or(self.price)
    }

    pub fn line_total(&self) -> Decimal {
        self.unit_price() * Decimal::from(self.quantity)
    }

    pub fn amount_saved(&self) -> Decimal {
        match self.discount_price {
            Some(discounted) => (self.price - discounted) * Decimal::from(self.quantity),
            None => Decimal::ZERO,
        }
    }
}

/// An open order with its lines and optional coupon, as the checkout and
/// payment screens see it.
#[derive(Debug, Clone)]
pub struct OrderSummary {
    pub order: Order,
    pub lines: Vec<CartLine>,
    pub coupon: Option<Coupon>,
}

impl OrderSummary {
    pub fn subtotal(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    pub fn discount(&self) -> Decimal {
        self.coupon.as_ref().map(|c| c.amount).unwrap_or(Decimal::ZERO)
    }

    pub fn total(&self) -> Decimal {
        self.subtotal() - self.discount()
    }

    /// Total in minor units, as the gateway charges it.
    pub fn total_minor_units(&self) -> Option<i64> {
        (self.total() * Decimal::from(100)).round().to_i64()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.order.id,
            "ordered_date": self.order.ordered_date,
            "lines": self.lines,
            "coupon": self.coupon.as_ref().map(|c| &c.code),
            "subtotal": self.subtotal(),
            "discount": self.discount(),
            "total": self.total(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(quantity: i32, price: Decimal, discount_price: Option<Decimal>) -> CartLine {
        CartLine {
            item_id: Uuid::new_v4(),
            slug: "sku-1".into(),
            name: "Widget".into(),
            quantity,
            price,
            discount_price,
        }
    }

    fn summary(lines: Vec<CartLine>, coupon: Option<Coupon>) -> OrderSummary {
        OrderSummary {
            order: Order {
                id: Uuid::new_v4(),
                user_id: Uuid::new_v4(),
                ordered: false,
                ordered_date: Utc::now(),
                billing_address_id: None,
                coupon_id: coupon.as_ref().map(|c| c.id),
                payment_id: None,
                ref_code: None,
                refund_requested: false,
                created_at: Utc::now(),
            },
            lines,
            coupon,
        }
    }

    #[test]
    fn two_of_a_ten_dollar_item_totals_twenty() {
        let s = summary(vec![line(2, Decimal::new(1000, 2), None)], None);
        assert_eq!(s.subtotal(), Decimal::new(2000, 2));
        assert_eq!(s.total(), Decimal::new(2000, 2));
        assert_eq!(s.total_minor_units(), Some(2000));
    }

    #[test]
    fn discount_price_wins_over_list_price() {
        let l = line(3, Decimal::new(1000, 2), Some(Decimal::new(750, 2)));
        assert_eq!(l.unit_price(), Decimal::new(750, 2));
        assert_eq!(l.line_total(), Decimal::new(2250, 2));
        assert_eq!(l.amount_saved(), Decimal::new(750, 2));
    }

    #[test]
    fn coupon_amount_is_subtracted_from_the_total() {
        let coupon = Coupon { id: Uuid::new_v4(), code: "SAVE5".into(), amount: Decimal::new(500, 2) };
        let s = summary(vec![line(2, Decimal::new(1000, 2), None)], Some(coupon));
        assert_eq!(s.discount(), Decimal::new(500, 2));
        assert_eq!(s.total(), Decimal::new(1500, 2));
        assert_eq!(s.total_minor_units(), Some(1500));
    }

    #[test]
    fn minor_units_round_fractional_cents() {
        // 3 x 9.99 = 29.97 -> 2997 minor units, no drift.
        let s = summary(vec![line(3, Decimal::new(999, 2), None)], None);
        assert_eq!(s.total_minor_units(), Some(2997));
    }
}
