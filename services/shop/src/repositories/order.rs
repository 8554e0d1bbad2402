//! Order repository for database operations
//!
//! Stock checks lock the product row (`SELECT ... FOR UPDATE`) and stock
//! changes are guarded updates that never take a row below zero, so
//! concurrent placements cannot jointly overdraw a product regardless of
//! the session isolation level.

use async_trait::async_trait;
use common::error::{DatabaseError, DatabaseResult};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgExecutor, postgres::PgRow};
use tracing::info;

use super::{OrderRepository, OrderTransaction, product::product_from_row};
use crate::models::{
    NewOrder, NewOrderItem, Order, OrderItem, OrderStatus, OrderWithItems, Product,
    order::attach_items,
};

const ORDER_COLUMNS: &str =
    "id, user_id, user_name, user_email, shipping_address, total_amount, order_date, status";
const ITEM_COLUMNS: &str = "id, order_id, product_id, product_name, price, quantity, total";

/// PostgreSQL-backed orders
#[derive(Clone)]
pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    /// Create a new order repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn order_from_row(row: &PgRow) -> DatabaseResult<Order> {
    let status: String = row.get("status");
    let status = status
        .parse::<OrderStatus>()
        .map_err(|_| DatabaseError::Decode(format!("unknown order status '{}'", status)))?;

    Ok(Order {
        id: row.get("id"),
        user_id: row.get("user_id"),
        user_name: row.get("user_name"),
        user_email: row.get("user_email"),
        shipping_address: row.get("shipping_address"),
        total_amount: row.get("total_amount"),
        order_date: row.get("order_date"),
        status,
    })
}

fn item_from_row(row: &PgRow) -> OrderItem {
    OrderItem {
        id: row.get("id"),
        order_id: row.get("order_id"),
        product_id: row.get("product_id"),
        product_name: row.get("product_name"),
        price: row.get("price"),
        quantity: row.get("quantity"),
        total: row.get("total"),
    }
}

/// Load the lines of the given orders, in insertion order
async fn load_items<'e, E>(executor: E, order_ids: &[i64]) -> DatabaseResult<Vec<OrderItem>>
where
    E: PgExecutor<'e>,
{
    if order_ids.is_empty() {
        return Ok(Vec::new());
    }

    let rows = sqlx::query(&format!(
        "SELECT {} FROM order_items WHERE order_id = ANY($1) ORDER BY id",
        ITEM_COLUMNS
    ))
    .bind(order_ids)
    .fetch_all(executor)
    .await?;

    Ok(rows.iter().map(item_from_row).collect())
}

impl PgOrderRepository {
    async fn with_items(&self, rows: Vec<PgRow>) -> DatabaseResult<Vec<OrderWithItems>> {
        let orders = rows
            .iter()
            .map(order_from_row)
            .collect::<DatabaseResult<Vec<_>>>()?;
        let ids: Vec<i64> = orders.iter().map(|o| o.id).collect();
        let items = load_items(&self.pool, &ids).await?;

        Ok(attach_items(orders, items))
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn get_all(&self) -> DatabaseResult<Vec<OrderWithItems>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM orders ORDER BY order_date DESC, id DESC",
            ORDER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        self.with_items(rows).await
    }

    async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<OrderWithItems>> {
        let rows = sqlx::query(&format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS))
            .bind(id)
            .fetch_all(&self.pool)
            .await?;

        Ok(self.with_items(rows).await?.into_iter().next())
    }

    async fn find_by_user(&self, user_id: i64) -> DatabaseResult<Vec<OrderWithItems>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM orders WHERE user_id = $1 ORDER BY order_date DESC, id DESC",
            ORDER_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        self.with_items(rows).await
    }

    async fn update_status(&self, id: i64, status: OrderStatus) -> DatabaseResult<bool> {
        info!("Setting order {} status to {}", id, status);

        let result = sqlx::query("UPDATE orders SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status.as_ref())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn begin(&self) -> DatabaseResult<Box<dyn OrderTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgOrderTransaction { tx }))
    }
}

/// A PostgreSQL transaction scoped to one order mutation
pub struct PgOrderTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl OrderTransaction for PgOrderTransaction {
    async fn insert_order(&mut self, new_order: &NewOrder) -> DatabaseResult<Order> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO orders (user_id, user_name, user_email, shipping_address, total_amount, order_date, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            ORDER_COLUMNS
        ))
        .bind(new_order.user_id)
        .bind(&new_order.user_name)
        .bind(&new_order.user_email)
        .bind(&new_order.shipping_address)
        .bind(new_order.total_amount)
        .bind(new_order.order_date)
        .bind(new_order.status.as_ref())
        .fetch_one(&mut *self.tx)
        .await?;

        order_from_row(&row)
    }

    async fn insert_item(
        &mut self,
        order_id: i64,
        item: &NewOrderItem,
    ) -> DatabaseResult<OrderItem> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO order_items (order_id, product_id, product_name, price, quantity, total)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            ITEM_COLUMNS
        ))
        .bind(order_id)
        .bind(item.product_id)
        .bind(&item.product_name)
        .bind(item.price)
        .bind(item.quantity)
        .bind(item.total)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(item_from_row(&row))
    }

    async fn lock_product(&mut self, id: i64) -> DatabaseResult<Option<Product>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, description, price, image_url, category, stock
            FROM products
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.as_ref().map(product_from_row))
    }

    async fn lock_order(&mut self, id: i64) -> DatabaseResult<Option<OrderWithItems>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM orders WHERE id = $1 FOR UPDATE",
            ORDER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let order = order_from_row(&row)?;
        let items = load_items(&mut *self.tx, &[order.id]).await?;

        Ok(Some(OrderWithItems { order, items }))
    }

    async fn adjust_stock(&mut self, product_id: i64, delta: i32) -> DatabaseResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock + $2
            WHERE id = $1 AND stock + $2 >= 0
            "#,
        )
        .bind(product_id)
        .bind(delta)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn set_status(&mut self, order_id: i64, status: OrderStatus) -> DatabaseResult<()> {
        sqlx::query("UPDATE orders SET status = $2 WHERE id = $1")
            .bind(order_id)
            .bind(status.as_ref())
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn commit(self: Box<Self>) -> DatabaseResult<()> {
        let PgOrderTransaction { tx } = *self;
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> DatabaseResult<()> {
        let PgOrderTransaction { tx } = *self;
        tx.rollback().await?;
        Ok(())
    }
}
