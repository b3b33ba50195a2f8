//! Repositories over the relational store.
//!
//! Every handler receives these as explicit capabilities through `AppState`;
//! nothing resolves the "current order" through hidden global state. The
//! single-open-order and line-uniqueness invariants are enforced by unique
//! indexes in the migration, so concurrent find-or-create calls are safe
//! without read-then-write in application code.

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{BillingAddress, CartLine, Coupon, Item, Order, OrderItem, OrderSummary, Refund};
use crate::refcode;

const PAGE_SIZE: i64 = 10;

#[derive(Clone)]
pub struct ItemRepo {
    pool: PgPool,
}

impl ItemRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// One page of the catalog in a stable order, plus the total item count.
    pub async fn list(&self, page: u32) -> Result<(Vec<Item>, i64), sqlx::Error> {
        let page = page.max(1);
        let items = sqlx::query_as::<_, Item>(
            "SELECT * FROM items ORDER BY created_at DESC, id LIMIT $1 OFFSET $2",
        )
        .bind(PAGE_SIZE)
        .bind((page as i64 - 1) * PAGE_SIZE)
        .fetch_all(&self.pool)
        .await?;
        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM items").fetch_one(&self.pool).await?;
        Ok((items, total.0))
    }

    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<Item>, sqlx::Error> {
        sqlx::query_as::<_, Item>("SELECT * FROM items WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
    }
}

/// Fields of a billing address as captured at checkout. The row is written
/// once, attached to exactly one order, and never mutated.
#[derive(Debug, Clone)]
pub struct NewBillingAddress {
    pub street_address: String,
    pub apartment_address: Option<String>,
    pub country: String,
    pub zip: String,
}

#[derive(Clone)]
pub struct OrderRepo {
    pool: PgPool,
}

impl OrderRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn open_for_user(&self, user_id: Uuid) -> Result<Option<Order>, sqlx::Error> {
        sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE user_id = $1 AND NOT ordered")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Returns the user's open order, creating one timestamped now if none
    /// exists. A concurrent create loses on the partial unique index and
    /// falls back to the row the winner inserted.
    pub async fn find_or_create_open(&self, user_id: Uuid) -> Result<Order, sqlx::Error> {
        if let Some(order) = self.open_for_user(user_id).await? {
            return Ok(order);
        }
        let inserted = sqlx::query_as::<_, Order>(
            "INSERT INTO orders (id, user_id, ordered_date) VALUES ($1, $2, NOW()) \
             ON CONFLICT (user_id) WHERE NOT ordered DO NOTHING RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        match inserted {
            Some(order) => Ok(order),
            None => self.open_for_user(user_id).await?.ok_or(sqlx::Error::RowNotFound),
        }
    }

    /// Adds one unit of the item to the order: a fresh line at quantity 1, or
    /// an increment if the order already carries a line for this item.
    pub async fn upsert_line(
        &self,
        order_id: Uuid,
        user_id: Uuid,
        item_id: Uuid,
    ) -> Result<OrderItem, sqlx::Error> {
        sqlx::query_as::<_, OrderItem>(
            "INSERT INTO order_items (id, order_id, user_id, item_id, quantity) VALUES ($1, $2, $3, $4, 1) \
             ON CONFLICT (order_id, item_id) DO UPDATE SET quantity = order_items.quantity + 1 RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(order_id)
        .bind(user_id)
        .bind(item_id)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn find_line(&self, order_id: Uuid, item_id: Uuid) -> Result<Option<OrderItem>, sqlx::Error> {
        sqlx::query_as::<_, OrderItem>("SELECT * FROM order_items WHERE order_id = $1 AND item_id = $2")
            .bind(order_id)
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn delete_line(&self, line_id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM order_items WHERE id = $1").bind(line_id).execute(&self.pool).await?;
        Ok(())
    }

    pub async fn set_line_quantity(&self, line_id: Uuid, quantity: i32) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE order_items SET quantity = $2 WHERE id = $1")
            .bind(line_id)
            .bind(quantity)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn summary(&self, order: &Order) -> Result<OrderSummary, sqlx::Error> {
        let lines = sqlx::query_as::<_, CartLine>(
            "SELECT oi.item_id, i.slug, i.name, oi.quantity, i.price, i.discount_price \
             FROM order_items oi JOIN items i ON i.id = oi.item_id \
             WHERE oi.order_id = $1 ORDER BY i.name, i.id",
        )
        .bind(order.id)
        .fetch_all(&self.pool)
        .await?;
        let coupon = match order.coupon_id {
            Some(id) => {
                sqlx::query_as::<_, Coupon>("SELECT * FROM coupons WHERE id = $1")
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await?
            }
            None => None,
        };
        Ok(OrderSummary { order: order.clone(), lines, coupon })
    }

    /// Writes the billing address and attaches it to the order in one
    /// transaction, so a crash cannot leave an orphaned address row.
    pub async fn attach_billing(
        &self,
        order_id: Uuid,
        user_id: Uuid,
        address: NewBillingAddress,
    ) -> Result<BillingAddress, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query_as::<_, BillingAddress>(
            "INSERT INTO billing_addresses (id, user_id, street_address, apartment_address, country, zip) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(user_id)
        .bind(&address.street_address)
        .bind(&address.apartment_address)
        .bind(&address.country)
        .bind(&address.zip)
        .fetch_one(&mut *tx)
        .await?;
        sqlx::query("UPDATE orders SET billing_address_id = $2 WHERE id = $1")
            .bind(order_id)
            .bind(row.id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(row)
    }

    pub async fn set_coupon(&self, order_id: Uuid, coupon_id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE orders SET coupon_id = $2 WHERE id = $1")
            .bind(order_id)
            .bind(coupon_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn find_by_ref_code(&self, ref_code: &str) -> Result<Option<Order>, sqlx::Error> {
        sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE ref_code = $1")
            .bind(ref_code)
            .fetch_optional(&self.pool)
            .await
    }

    /// Closes the order after a successful charge in one transaction: records
    /// the payment, marks every line ordered, and marks the order ordered with
    /// a fresh reference code. A reference-code collision rolls the
    /// transaction back and retries with a new code.
    pub async fn finalize(
        &self,
        order_id: Uuid,
        user_id: Uuid,
        charge_id: &str,
        amount: i64,
    ) -> Result<String, sqlx::Error> {
        let mut last_err = sqlx::Error::RowNotFound;
        for _ in 0..5 {
            let ref_code = refcode::generate();
            let mut tx = self.pool.begin().await?;
            let payment_id = Uuid::now_v7();
            sqlx::query("INSERT INTO payments (id, charge_id, user_id, amount) VALUES ($1, $2, $3, $4)")
                .bind(payment_id)
                .bind(charge_id)
                .bind(user_id)
                .bind(amount)
                .execute(&mut *tx)
                .await?;
            sqlx::query("UPDATE order_items SET ordered = TRUE WHERE order_id = $1")
                .bind(order_id)
                .execute(&mut *tx)
                .await?;
            let result = sqlx::query(
                "UPDATE orders SET ordered = TRUE, payment_id = $2, ref_code = $3 WHERE id = $1",
            )
            .bind(order_id)
            .bind(payment_id)
            .bind(&ref_code)
            .execute(&mut *tx)
            .await;
            match result {
                Ok(_) => {
                    tx.commit().await?;
                    return Ok(ref_code);
                }
                Err(sqlx::Error::Database(e)) if e.constraint() == Some("orders_ref_code_key") => {
                    tx.rollback().await?;
                    last_err = sqlx::Error::Database(e);
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_err)
    }
}

#[derive(Clone)]
pub struct CouponRepo {
    pool: PgPool,
}

impl CouponRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_code(&self, code: &str) -> Result<Option<Coupon>, sqlx::Error> {
        sqlx::query_as::<_, Coupon>("SELECT * FROM coupons WHERE code = $1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await
    }
}

#[derive(Clone)]
pub struct RefundRepo {
    pool: PgPool,
}

impl RefundRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Flags the order as refund-requested and files the request in one
    /// transaction. Repeated requests file repeated rows; dedup happens
    /// downstream in the support workflow.
    pub async fn file_request(
        &self,
        order_id: Uuid,
        reason: &str,
        email: &str,
    ) -> Result<Refund, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("UPDATE orders SET refund_requested = TRUE WHERE id = $1")
            .bind(order_id)
            .execute(&mut *tx)
            .await?;
        let refund = sqlx::query_as::<_, Refund>(
            "INSERT INTO refunds (id, order_id, reason, email) VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(order_id)
        .bind(reason)
        .bind(email)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(refund)
    }
}
