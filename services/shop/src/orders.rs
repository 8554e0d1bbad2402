//! Order placement and cancellation
//!
//! Creating an order persists the order, its lines and the stock decrements
//! in one transaction; cancelling restores the stock in one transaction.
//! Either the whole mutation commits or none of it is visible.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use common::error::DatabaseError;
use rust_decimal::Decimal;
use strum::VariantNames;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::models::{
    CreateOrderRequest, NewOrder, NewOrderItem, OrderStatus, OrderWithItems, Product,
};
use crate::repositories::{OrderRepository, OrderTransaction};
use crate::validation::{validate_amount, validate_email, validate_required};

/// Errors raised by order operations
#[derive(Error, Debug)]
pub enum OrderError {
    /// The order does not exist
    #[error("Order {0} not found")]
    NotFound(i64),

    /// The request is malformed
    #[error("{0}")]
    Validation(String),

    /// A product cannot cover the requested quantity
    #[error("Insufficient stock for product {product}")]
    InsufficientStock { product: String },

    /// Delivered orders are final
    #[error("Cannot cancel a delivered order")]
    Delivered,

    /// Stock was already restored by an earlier cancellation
    #[error("Order is already cancelled")]
    AlreadyCancelled,

    /// The store failed; the transaction was rolled back
    #[error(transparent)]
    Store(#[from] DatabaseError),
}

/// Validated order ready to be written
#[derive(Debug, Clone)]
struct OrderDraft {
    order: NewOrder,
    items: Vec<NewOrderItem>,
}

/// Parse a status name, rejecting anything outside the enumeration
pub fn parse_status(raw: &str) -> Result<OrderStatus, OrderError> {
    OrderStatus::from_str(raw).map_err(|_| {
        OrderError::Validation(format!(
            "Invalid status. Valid statuses are: {}",
            OrderStatus::VARIANTS.join(", ")
        ))
    })
}

fn amount_out_of_range() -> OrderError {
    OrderError::Validation("Order amount out of range".to_string())
}

/// Check a placement request and normalize its amounts to cents
fn draft_order(request: &CreateOrderRequest) -> Result<OrderDraft, OrderError> {
    if request.items.is_empty() {
        return Err(OrderError::Validation(
            "Order must contain at least one item".to_string(),
        ));
    }

    validate_required("User name", &request.user_name).map_err(OrderError::Validation)?;
    validate_email(&request.user_email).map_err(OrderError::Validation)?;
    validate_required("Shipping address", &request.shipping_address)
        .map_err(OrderError::Validation)?;

    let mut items = Vec::with_capacity(request.items.len());
    let mut sum = Decimal::ZERO;

    for line in &request.items {
        validate_required("Product name", &line.product_name).map_err(OrderError::Validation)?;

        if line.quantity <= 0 {
            return Err(OrderError::Validation(format!(
                "Quantity for product {} must be positive",
                line.product_name
            )));
        }

        let price = line.price.round_dp(2);
        validate_amount("Price", price).map_err(OrderError::Validation)?;

        let total = price
            .checked_mul(Decimal::from(line.quantity))
            .ok_or_else(amount_out_of_range)?;
        validate_amount("Total", total).map_err(OrderError::Validation)?;
        if line.total.round_dp(2) != total {
            return Err(OrderError::Validation(format!(
                "Total for product {} must equal price times quantity",
                line.product_name
            )));
        }

        sum = sum.checked_add(total).ok_or_else(amount_out_of_range)?;
        items.push(NewOrderItem {
            product_id: line.product_id,
            product_name: line.product_name.clone(),
            price,
            quantity: line.quantity,
            total,
        });
    }

    validate_amount("Total amount", sum).map_err(OrderError::Validation)?;

    if request.total_amount.round_dp(2) != sum {
        return Err(OrderError::Validation(
            "Total amount must equal the sum of item totals".to_string(),
        ));
    }

    Ok(OrderDraft {
        order: NewOrder {
            // Guest checkouts post 0
            user_id: request.user_id.filter(|id| *id > 0),
            user_name: request.user_name.trim().to_string(),
            user_email: request.user_email.clone(),
            shipping_address: request.shipping_address.trim().to_string(),
            total_amount: sum,
            order_date: Utc::now(),
            status: OrderStatus::Pending,
        },
        items,
    })
}

/// Write an order, check every line's stock, then take the stock
async fn place(
    tx: &mut dyn OrderTransaction,
    draft: &OrderDraft,
) -> Result<OrderWithItems, OrderError> {
    let order = tx.insert_order(&draft.order).await?;

    // Rows are locked in ascending id order whatever the line order
    let mut locked: BTreeMap<i64, Option<Product>> = draft
        .items
        .iter()
        .map(|line| (line.product_id, None))
        .collect();
    for (id, product) in locked.iter_mut() {
        *product = tx.lock_product(*id).await?;
    }

    let mut items = Vec::with_capacity(draft.items.len());
    // (product id, product name, quantity) in line order
    let mut claims: Vec<(i64, String, i32)> = Vec::with_capacity(draft.items.len());

    for line in &draft.items {
        items.push(tx.insert_item(order.id, line).await?);

        let Some(product) = locked.get(&line.product_id).cloned().flatten() else {
            // Unreachable while the item foreign key holds
            warn!(
                "Order {} references unknown product {}; stock not checked",
                order.id, line.product_id
            );
            continue;
        };

        let already_claimed: i32 = claims
            .iter()
            .filter(|(id, _, _)| *id == product.id)
            .map(|(_, _, quantity)| *quantity)
            .sum();

        if product.stock - already_claimed < line.quantity {
            info!(
                "Rejecting order {}: product {} has {} in stock, {} requested",
                order.id,
                product.id,
                product.stock - already_claimed,
                line.quantity
            );
            return Err(OrderError::InsufficientStock {
                product: product.name,
            });
        }

        claims.push((product.id, product.name, line.quantity));
    }

    for (product_id, product_name, quantity) in claims {
        if !tx.adjust_stock(product_id, -quantity).await? {
            return Err(OrderError::InsufficientStock {
                product: product_name,
            });
        }
    }

    Ok(OrderWithItems { order, items })
}

/// Restore an order's stock and mark it cancelled
async fn cancel(tx: &mut dyn OrderTransaction, id: i64) -> Result<(), OrderError> {
    let existing = tx.lock_order(id).await?.ok_or(OrderError::NotFound(id))?;

    match existing.order.status {
        OrderStatus::Delivered => return Err(OrderError::Delivered),
        OrderStatus::Cancelled => return Err(OrderError::AlreadyCancelled),
        _ => {}
    }

    let mut restores: BTreeMap<i64, i32> = BTreeMap::new();
    for item in &existing.items {
        *restores.entry(item.product_id).or_default() += item.quantity;
    }

    for (product_id, quantity) in restores {
        if !tx.adjust_stock(product_id, quantity).await? {
            debug!(
                "Product {} is gone; skipping stock restore for order {}",
                product_id, id
            );
        }
    }

    tx.set_status(id, OrderStatus::Cancelled).await?;
    Ok(())
}

/// Commit on success, roll back on failure
async fn finish<T>(
    tx: Box<dyn OrderTransaction>,
    outcome: Result<T, OrderError>,
) -> Result<T, OrderError> {
    match outcome {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                error!("Failed to roll back order transaction: {}", rollback_err);
            }
            Err(err)
        }
    }
}

/// Order transaction manager
#[derive(Clone)]
pub struct OrderService {
    orders: Arc<dyn OrderRepository>,
}

impl OrderService {
    /// Create a new order service
    pub fn new(orders: Arc<dyn OrderRepository>) -> Self {
        Self { orders }
    }

    /// Place an order and take its stock atomically
    pub async fn create_order(
        &self,
        request: &CreateOrderRequest,
    ) -> Result<OrderWithItems, OrderError> {
        let draft = draft_order(request)?;
        info!(
            "Placing order for {} with {} line(s)",
            draft.order.user_email,
            draft.items.len()
        );

        let mut tx = self.orders.begin().await?;
        let outcome = place(tx.as_mut(), &draft).await;
        let created = finish(tx, outcome).await?;

        info!(
            "Order {} placed, total {}",
            created.order.id, created.order.total_amount
        );
        Ok(created)
    }

    /// Cancel an order and give its stock back atomically
    pub async fn cancel_order(&self, id: i64) -> Result<(), OrderError> {
        info!("Cancelling order {}", id);

        let mut tx = self.orders.begin().await?;
        let outcome = cancel(tx.as_mut(), id).await;
        finish(tx, outcome).await
    }

    /// Overwrite an order's status with any enumerated value
    pub async fn update_status(&self, id: i64, status: &str) -> Result<(), OrderError> {
        let status = parse_status(status)?;

        if !self.orders.update_status(id, status).await? {
            return Err(OrderError::NotFound(id));
        }

        info!("Order {} status set to {}", id, status);
        Ok(())
    }

    /// Every order, newest first
    pub async fn list_orders(&self) -> Result<Vec<OrderWithItems>, OrderError> {
        Ok(self.orders.get_all().await?)
    }

    /// One order with its lines
    pub async fn get_order(&self, id: i64) -> Result<OrderWithItems, OrderError> {
        self.orders
            .find_by_id(id)
            .await?
            .ok_or(OrderError::NotFound(id))
    }

    /// A user's orders, newest first
    pub async fn user_orders(&self, user_id: i64) -> Result<Vec<OrderWithItems>, OrderError> {
        Ok(self.orders.find_by_user(user_id).await?)
    }
}
