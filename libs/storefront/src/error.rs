//! Error type for the storefront client

use common::error::CacheError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorefrontError {
    /// The request never produced a response
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The shop answered with a non-success status
    #[error("Shop returned {status}: {message}")]
    Api { status: u16, message: String },

    /// The shop address cannot carry API paths
    #[error("Invalid shop URL: {0}")]
    InvalidUrl(String),

    #[error("Your cart is empty")]
    EmptyCart,

    /// Session storage failed
    #[error("Session storage error: {0}")]
    Storage(#[from] CacheError),

    #[error("Session encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl StorefrontError {
    /// HTTP status of an API rejection
    pub fn status(&self) -> Option<u16> {
        match self {
            StorefrontError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type StorefrontResult<T> = Result<T, StorefrontError>;
