//! In-memory store
//!
//! Implements every repository trait over a single set of tables behind an
//! async mutex. A transaction owns the mutex for its whole lifetime and works
//! on a private copy of the tables that replaces the shared copy on commit,
//! which makes transactions serializable. Foreign key, unique and check
//! constraints mirror the PostgreSQL schema.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::error::{DatabaseError, DatabaseResult};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::models::{
    NewOrder, NewOrderItem, NewProduct, NewUser, Order, OrderItem, OrderStatus, OrderWithItems,
    Product, UpdateUser, User,
};
use crate::repositories::{OrderRepository, OrderTransaction, ProductRepository, UserRepository};

#[derive(Debug, Clone, Default)]
struct Tables {
    products: BTreeMap<i64, Product>,
    users: BTreeMap<i64, User>,
    orders: BTreeMap<i64, Order>,
    items: BTreeMap<i64, OrderItem>,
    next_id: i64,
}

fn constraint(name: &str) -> DatabaseError {
    DatabaseError::Constraint(name.to_string())
}

impl Tables {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn email_taken(&self, email: &str, except: Option<i64>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }

    fn with_items(&self, order: &Order) -> OrderWithItems {
        let items = self
            .items
            .values()
            .filter(|item| item.order_id == order.id)
            .cloned()
            .collect();
        OrderWithItems {
            order: order.clone(),
            items,
        }
    }

    fn orders_newest_first<'a>(&self, orders: impl Iterator<Item = &'a Order>) -> Vec<OrderWithItems> {
        let mut selected: Vec<&Order> = orders.collect();
        selected.sort_by(|a, b| b.order_date.cmp(&a.order_date).then(b.id.cmp(&a.id)));
        selected.into_iter().map(|o| self.with_items(o)).collect()
    }

    fn insert_order(&mut self, new_order: &NewOrder) -> DatabaseResult<Order> {
        if let Some(user_id) = new_order.user_id {
            if !self.users.contains_key(&user_id) {
                return Err(constraint("orders_user_id_fkey"));
            }
        }

        let order = Order {
            id: self.allocate_id(),
            user_id: new_order.user_id,
            user_name: new_order.user_name.clone(),
            user_email: new_order.user_email.clone(),
            shipping_address: new_order.shipping_address.clone(),
            total_amount: new_order.total_amount,
            order_date: new_order.order_date,
            status: new_order.status,
        };
        self.orders.insert(order.id, order.clone());
        Ok(order)
    }

    fn insert_item(&mut self, order_id: i64, item: &NewOrderItem) -> DatabaseResult<OrderItem> {
        if !self.orders.contains_key(&order_id) {
            return Err(constraint("order_items_order_id_fkey"));
        }
        if !self.products.contains_key(&item.product_id) {
            return Err(constraint("order_items_product_id_fkey"));
        }
        if item.quantity <= 0 {
            return Err(constraint("order_items_quantity_check"));
        }

        let row = OrderItem {
            id: self.allocate_id(),
            order_id,
            product_id: item.product_id,
            product_name: item.product_name.clone(),
            price: item.price,
            quantity: item.quantity,
            total: item.total,
        };
        self.items.insert(row.id, row.clone());
        Ok(row)
    }

    fn adjust_stock(&mut self, product_id: i64, delta: i32) -> bool {
        match self.products.get_mut(&product_id) {
            Some(product) => match product.stock.checked_add(delta) {
                Some(stock) if stock >= 0 => {
                    product.stock = stock;
                    true
                }
                _ => false,
            },
            None => false,
        }
    }
}

/// Process-local store used by tests and demos
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the default six-product catalog
    pub async fn with_default_catalog() -> Self {
        let store = Self::new();
        {
            let mut tables = store.tables.lock().await;
            for product in default_catalog() {
                let id = tables.allocate_id();
                tables.products.insert(id, Product { id, ..product });
            }
        }
        store
    }

    /// Number of order rows, for assertions
    pub async fn order_count(&self) -> usize {
        self.tables.lock().await.orders.len()
    }

    /// Number of order line rows, for assertions
    pub async fn order_item_count(&self) -> usize {
        self.tables.lock().await.items.len()
    }
}

fn default_catalog() -> Vec<Product> {
    let entry = |name: &str, description: &str, cents: i64, tag: &str, category: &str, stock| {
        Product {
            id: 0,
            name: name.to_string(),
            description: description.to_string(),
            price: rust_decimal::Decimal::new(cents, 2),
            image_url: format!("https://via.placeholder.com/200x200?text={}", tag),
            category: category.to_string(),
            stock,
        }
    };

    vec![
        entry("Smartphone", "Latest model smartphone", 69999, "Phone", "Electronics", 50),
        entry("Laptop", "High-performance laptop", 99999, "Laptop", "Electronics", 30),
        entry("T-Shirt", "Cotton T-shirt", 1999, "T-Shirt", "Clothing", 100),
        entry("Jeans", "Blue jeans", 4999, "Jeans", "Clothing", 75),
        entry("Headphones", "Wireless headphones", 19999, "Headphones", "Electronics", 40),
        entry("Sneakers", "Running sneakers", 7999, "Sneakers", "Footwear", 60),
    ]
}

#[async_trait]
impl ProductRepository for MemoryStore {
    async fn get_all(&self) -> DatabaseResult<Vec<Product>> {
        Ok(self.tables.lock().await.products.values().cloned().collect())
    }

    async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<Product>> {
        Ok(self.tables.lock().await.products.get(&id).cloned())
    }

    async fn find_by_category(&self, category: &str) -> DatabaseResult<Vec<Product>> {
        let wanted = category.to_lowercase();
        Ok(self
            .tables
            .lock()
            .await
            .products
            .values()
            .filter(|p| p.category.to_lowercase() == wanted)
            .cloned()
            .collect())
    }

    async fn create(&self, new_product: &NewProduct) -> DatabaseResult<Product> {
        if new_product.stock < 0 {
            return Err(constraint("products_stock_check"));
        }

        let mut tables = self.tables.lock().await;
        let product = Product {
            id: tables.allocate_id(),
            name: new_product.name.clone(),
            description: new_product.description.clone(),
            price: new_product.price,
            image_url: new_product.image_url.clone(),
            category: new_product.category.clone(),
            stock: new_product.stock,
        };
        tables.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn update(&self, product: &Product) -> DatabaseResult<bool> {
        if product.stock < 0 {
            return Err(constraint("products_stock_check"));
        }

        let mut tables = self.tables.lock().await;
        match tables.products.get_mut(&product.id) {
            Some(existing) => {
                *existing = product.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: i64) -> DatabaseResult<bool> {
        let mut tables = self.tables.lock().await;
        if tables.items.values().any(|item| item.product_id == id) {
            return Err(constraint("order_items_product_id_fkey"));
        }
        Ok(tables.products.remove(&id).is_some())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, new_user: &NewUser) -> DatabaseResult<User> {
        let mut tables = self.tables.lock().await;
        if tables.email_taken(&new_user.email, None) {
            return Err(constraint("users_email_key"));
        }

        let user = User {
            id: tables.allocate_id(),
            name: new_user.name.clone(),
            email: new_user.email.clone(),
            password_hash: new_user.password_hash.clone(),
            address: new_user.address.clone(),
            created_at: Utc::now(),
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<User>> {
        Ok(self.tables.lock().await.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<User>> {
        Ok(self
            .tables
            .lock()
            .await
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn update(&self, id: i64, update: &UpdateUser) -> DatabaseResult<bool> {
        let mut tables = self.tables.lock().await;
        if !tables.users.contains_key(&id) {
            return Ok(false);
        }
        if tables.email_taken(&update.email, Some(id)) {
            return Err(constraint("users_email_key"));
        }

        if let Some(user) = tables.users.get_mut(&id) {
            user.name = update.name.clone();
            user.email = update.email.clone();
            user.address = update.address.clone();
            if let Some(hash) = &update.password_hash {
                user.password_hash = hash.clone();
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn get_all(&self) -> DatabaseResult<Vec<OrderWithItems>> {
        let tables = self.tables.lock().await;
        Ok(tables.orders_newest_first(tables.orders.values()))
    }

    async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<OrderWithItems>> {
        let tables = self.tables.lock().await;
        Ok(tables.orders.get(&id).map(|o| tables.with_items(o)))
    }

    async fn find_by_user(&self, user_id: i64) -> DatabaseResult<Vec<OrderWithItems>> {
        let tables = self.tables.lock().await;
        Ok(tables.orders_newest_first(
            tables
                .orders
                .values()
                .filter(|o| o.user_id == Some(user_id)),
        ))
    }

    async fn update_status(&self, id: i64, status: OrderStatus) -> DatabaseResult<bool> {
        let mut tables = self.tables.lock().await;
        match tables.orders.get_mut(&id) {
            Some(order) => {
                order.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn begin(&self) -> DatabaseResult<Box<dyn OrderTransaction>> {
        let guard = self.tables.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTransaction { guard, working }))
    }
}

/// Transaction over a private copy of the tables
pub struct MemoryTransaction {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
}

#[async_trait]
impl OrderTransaction for MemoryTransaction {
    async fn insert_order(&mut self, new_order: &NewOrder) -> DatabaseResult<Order> {
        self.working.insert_order(new_order)
    }

    async fn insert_item(
        &mut self,
        order_id: i64,
        item: &NewOrderItem,
    ) -> DatabaseResult<OrderItem> {
        self.working.insert_item(order_id, item)
    }

    async fn lock_product(&mut self, id: i64) -> DatabaseResult<Option<Product>> {
        Ok(self.working.products.get(&id).cloned())
    }

    async fn lock_order(&mut self, id: i64) -> DatabaseResult<Option<OrderWithItems>> {
        Ok(self
            .working
            .orders
            .get(&id)
            .map(|o| self.working.with_items(o)))
    }

    async fn adjust_stock(&mut self, product_id: i64, delta: i32) -> DatabaseResult<bool> {
        Ok(self.working.adjust_stock(product_id, delta))
    }

    async fn set_status(&mut self, order_id: i64, status: OrderStatus) -> DatabaseResult<()> {
        if let Some(order) = self.working.orders.get_mut(&order_id) {
            order.status = status;
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> DatabaseResult<()> {
        let MemoryTransaction { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> DatabaseResult<()> {
        Ok(())
    }
}
