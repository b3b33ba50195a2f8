//! Cart: line-item maintenance on the user's open order.
//!
//! After any of these operations a (user, item) pair appears at most once
//! among the open order's lines; repeated adds increment the quantity.

use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::models::{Item, Order};
use crate::AppState;

/// What removing one unit does to a line at this quantity. The floor is the
/// line itself: quantity 1 removes it, so a line never reaches zero.
#[derive(Debug, PartialEq, Eq)]
enum DecrementOutcome {
    SetQuantity(i32),
    RemoveLine,
}

fn decrement_outcome(quantity: i32) -> DecrementOutcome {
    if quantity > 1 {
        DecrementOutcome::SetQuantity(quantity - 1)
    } else {
        DecrementOutcome::RemoveLine
    }
}

/// Quantity 1 after the upsert means the line is new; anything higher means
/// an existing line was incremented.
fn add_message(quantity_after: i32) -> &'static str {
    if quantity_after == 1 {
        "This item was added to your cart."
    } else {
        "This item quantity was updated."
    }
}

async fn resolve_item(state: &AppState, slug: &str) -> Result<Item, AppError> {
    state
        .items
        .find_by_slug(slug)
        .await?
        .ok_or_else(|| AppError::not_found("Item not found"))
}

async fn open_order(state: &AppState, user: CurrentUser) -> Result<Order, AppError> {
    state
        .orders
        .open_for_user(user.id)
        .await?
        .ok_or_else(|| AppError::not_found("You do not have an active order"))
}

pub async fn add_to_cart(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(slug): Path<String>,
) -> Result<Json<Value>, AppError> {
    let item = resolve_item(&state, &slug).await?;
    let order = state.orders.find_or_create_open(user.id).await?;
    let line = state.orders.upsert_line(order.id, user.id, item.id).await?;
    let message = add_message(line.quantity);
    Ok(Json(json!({ "message": message, "slug": item.slug, "quantity": line.quantity })))
}

pub async fn remove_from_cart(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(slug): Path<String>,
) -> Result<Json<Value>, AppError> {
    let item = resolve_item(&state, &slug).await?;
    let order = open_order(&state, user).await?;
    let line = state
        .orders
        .find_line(order.id, item.id)
        .await?
        .ok_or_else(|| AppError::not_found("This item was not in your cart"))?;
    state.orders.delete_line(line.id).await?;
    Ok(Json(json!({ "message": "This item was removed from your cart." })))
}

pub async fn decrement_item(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(slug): Path<String>,
) -> Result<Json<Value>, AppError> {
    let item = resolve_item(&state, &slug).await?;
    let order = open_order(&state, user).await?;
    let line = state
        .orders
        .find_line(order.id, item.id)
        .await?
        .ok_or_else(|| AppError::not_found("This item was not in your cart"))?;
    match decrement_outcome(line.quantity) {
        DecrementOutcome::SetQuantity(quantity) => {
            state.orders.set_line_quantity(line.id, quantity).await?
        }
        DecrementOutcome::RemoveLine => state.orders.delete_line(line.id).await?,
    }
    Ok(Json(json!({ "message": "This item quantity was updated." })))
}

pub async fn order_summary(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Value>, AppError> {
    let order = open_order(&state, user).await?;
    let summary = state.orders.summary(&order).await?;
    Ok(Json(summary.to_json()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decrementing_above_one_lowers_the_quantity_by_one() {
        assert_eq!(decrement_outcome(2), DecrementOutcome::SetQuantity(1));
        assert_eq!(decrement_outcome(5), DecrementOutcome::SetQuantity(4));
    }

    #[test]
    fn decrementing_the_last_unit_removes_the_line() {
        assert_eq!(decrement_outcome(1), DecrementOutcome::RemoveLine);
    }

    #[test]
    fn decrement_never_leaves_a_zero_or_negative_quantity() {
        for quantity in 1..=20 {
            match decrement_outcome(quantity) {
                DecrementOutcome::SetQuantity(q) => assert!(q >= 1),
                DecrementOutcome::RemoveLine => assert_eq!(quantity, 1),
            }
        }
    }

    #[test]
    fn add_message_distinguishes_new_lines_from_increments() {
        assert_eq!(add_message(1), "This item was added to your cart.");
        assert_eq!(add_message(2), "This item quantity was updated.");
        assert_eq!(add_message(7), "This item quantity was updated.");
    }
}
