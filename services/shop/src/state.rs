//! Application state shared across handlers

use std::sync::Arc;

use sqlx::PgPool;

use crate::accounts::AccountService;
use crate::hashing::CredentialHasher;
use crate::memory::MemoryStore;
use crate::orders::OrderService;
use crate::repositories::{
    PgOrderRepository, PgProductRepository, PgUserRepository, ProductRepository,
};

#[derive(Clone)]
pub struct AppState {
    pub product_repository: Arc<dyn ProductRepository>,
    pub order_service: OrderService,
    pub account_service: AccountService,
}

impl AppState {
    /// State backed by PostgreSQL
    pub fn postgres(pool: PgPool, hasher: Arc<dyn CredentialHasher>) -> Self {
        Self {
            product_repository: Arc::new(PgProductRepository::new(pool.clone())),
            order_service: OrderService::new(Arc::new(PgOrderRepository::new(pool.clone()))),
            account_service: AccountService::new(Arc::new(PgUserRepository::new(pool)), hasher),
        }
    }

    /// State backed by a process-local store
    pub fn in_memory(store: MemoryStore, hasher: Arc<dyn CredentialHasher>) -> Self {
        Self {
            product_repository: Arc::new(store.clone()),
            order_service: OrderService::new(Arc::new(store.clone())),
            account_service: AccountService::new(Arc::new(store), hasher),
        }
    }
}
