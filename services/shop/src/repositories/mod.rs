//! Repositories for database operations
//!
//! Every store access goes through the traits below so the same service
//! code runs against PostgreSQL in production and against
//! [`crate::memory::MemoryStore`] in tests.

use async_trait::async_trait;
use common::error::DatabaseResult;

use crate::models::{
    NewOrder, NewOrderItem, NewProduct, NewUser, Order, OrderItem, OrderStatus, OrderWithItems,
    Product, UpdateUser, User,
};

pub mod order;
pub mod product;
pub mod user;

pub use order::PgOrderRepository;
pub use product::PgProductRepository;
pub use user::PgUserRepository;

/// Catalog accessor
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Get every product, ordered by id
    async fn get_all(&self) -> DatabaseResult<Vec<Product>>;

    /// Find a product by ID
    async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<Product>>;

    /// Products whose category matches, ignoring case
    async fn find_by_category(&self, category: &str) -> DatabaseResult<Vec<Product>>;

    /// Create a new product
    async fn create(&self, new_product: &NewProduct) -> DatabaseResult<Product>;

    /// Overwrite a product; false when it does not exist
    async fn update(&self, product: &Product) -> DatabaseResult<bool>;

    /// Delete a product; false when it does not exist
    ///
    /// Fails with a constraint error while an order line references it.
    async fn delete(&self, id: i64) -> DatabaseResult<bool>;
}

/// Account accessor
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user; the email must be unused
    async fn create(&self, new_user: &NewUser) -> DatabaseResult<User>;

    /// Find a user by ID
    async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<User>>;

    /// Find a user by email
    async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<User>>;

    /// Update a user's profile; false when it does not exist
    async fn update(&self, id: i64, update: &UpdateUser) -> DatabaseResult<bool>;
}

/// Order reads, single-statement writes and the transaction entry point
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Every order with its lines, newest first
    async fn get_all(&self) -> DatabaseResult<Vec<OrderWithItems>>;

    /// One order with its lines
    async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<OrderWithItems>>;

    /// A user's orders with their lines, newest first
    async fn find_by_user(&self, user_id: i64) -> DatabaseResult<Vec<OrderWithItems>>;

    /// Overwrite an order's status; false when the order does not exist
    async fn update_status(&self, id: i64, status: OrderStatus) -> DatabaseResult<bool>;

    /// Open a transaction for a multi-step order mutation
    async fn begin(&self) -> DatabaseResult<Box<dyn OrderTransaction>>;
}

/// A unit of work over orders and product stock
///
/// Nothing written through a transaction is visible to other callers until
/// [`OrderTransaction::commit`]. Dropping it without committing rolls back.
#[async_trait]
pub trait OrderTransaction: Send {
    /// Insert an order row
    async fn insert_order(&mut self, new_order: &NewOrder) -> DatabaseResult<Order>;

    /// Insert a line for an existing order
    async fn insert_item(&mut self, order_id: i64, item: &NewOrderItem)
    -> DatabaseResult<OrderItem>;

    /// Read a product and hold it against concurrent stock changes
    async fn lock_product(&mut self, id: i64) -> DatabaseResult<Option<Product>>;

    /// Read an order with its lines and hold it against concurrent changes
    async fn lock_order(&mut self, id: i64) -> DatabaseResult<Option<OrderWithItems>>;

    /// Add `delta` to a product's stock unless the result would go negative
    ///
    /// Returns false when the product is missing or the guard rejected it.
    async fn adjust_stock(&mut self, product_id: i64, delta: i32) -> DatabaseResult<bool>;

    /// Set an order's status
    async fn set_status(&mut self, order_id: i64, status: OrderStatus) -> DatabaseResult<()>;

    /// Make every write of this transaction visible
    async fn commit(self: Box<Self>) -> DatabaseResult<()>;

    /// Discard every write of this transaction
    async fn rollback(self: Box<Self>) -> DatabaseResult<()>;
}
