//! Client session and its persistence
//!
//! A [`Session`] holds the cart and the signed-in user. It is an explicit
//! value handed to each client call; [`SessionStorage`] implementations keep
//! it between visits, JSON-encoded under a session id.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::cache::RedisPool;
use serde::{Deserialize, Serialize};
use shop::models::UserResponse;
use tokio::sync::Mutex;
use tracing::debug;

use crate::cart::Cart;
use crate::error::StorefrontResult;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(default)]
    pub cart: Cart,
    #[serde(default)]
    pub current_user: Option<UserResponse>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_signed_in(&self) -> bool {
        self.current_user.is_some()
    }
}

/// Persistence for sessions
#[async_trait]
pub trait SessionStorage: Send + Sync {
    /// Load a session; an unknown id yields a fresh one
    async fn load(&self, session_id: &str) -> StorefrontResult<Session>;

    async fn save(&self, session_id: &str, session: &Session) -> StorefrontResult<()>;

    async fn clear(&self, session_id: &str) -> StorefrontResult<()>;
}

fn decode(raw: Option<String>) -> StorefrontResult<Session> {
    match raw {
        Some(json) => Ok(serde_json::from_str(&json)?),
        None => Ok(Session::new()),
    }
}

/// Process-local session storage
#[derive(Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStorage for MemoryStorage {
    async fn load(&self, session_id: &str) -> StorefrontResult<Session> {
        decode(self.entries.lock().await.get(session_id).cloned())
    }

    async fn save(&self, session_id: &str, session: &Session) -> StorefrontResult<()> {
        let json = serde_json::to_string(session)?;
        self.entries.lock().await.insert(session_id.to_string(), json);
        Ok(())
    }

    async fn clear(&self, session_id: &str) -> StorefrontResult<()> {
        self.entries.lock().await.remove(session_id);
        Ok(())
    }
}

/// Redis-backed session storage
///
/// Sessions expire after the pool's configured idle timeout; every save
/// renews it.
#[derive(Clone)]
pub struct RedisStorage {
    pool: RedisPool,
}

impl RedisStorage {
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    fn key(session_id: &str) -> String {
        format!("session:{}", session_id)
    }
}

#[async_trait]
impl SessionStorage for RedisStorage {
    async fn load(&self, session_id: &str) -> StorefrontResult<Session> {
        decode(self.pool.get(&Self::key(session_id)).await?)
    }

    async fn save(&self, session_id: &str, session: &Session) -> StorefrontResult<()> {
        let json = serde_json::to_string(session)?;
        debug!("Saving session {}", session_id);
        Ok(self.pool.set(&Self::key(session_id), &json).await?)
    }

    async fn clear(&self, session_id: &str) -> StorefrontResult<()> {
        self.pool.delete(&Self::key(session_id)).await?;
        Ok(())
    }
}
