//! Custom error types for the common library
//!
//! This module defines the store-level error type shared by every
//! repository implementation in the workspace, and the error type of the
//! Redis session store.

use redis::RedisError;
use sqlx::Error as SqlxError;
use thiserror::Error;

/// Postgres error code for foreign key violations
const FOREIGN_KEY_VIOLATION: &str = "23503";
/// Postgres error code for unique constraint violations
const UNIQUE_VIOLATION: &str = "23505";
/// Postgres error code for check constraint violations
const CHECK_VIOLATION: &str = "23514";

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred during database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during database query execution
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// Error occurred during database migration
    #[error("Database migration error: {0}")]
    Migration(String),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),

    /// A schema constraint (foreign key, unique, check) rejected the write
    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// A stored value could not be mapped back into a domain type
    #[error("Corrupt row: {0}")]
    Decode(String),
}

impl DatabaseError {
    /// Whether this error was raised by a schema constraint
    pub fn is_constraint(&self) -> bool {
        matches!(self, DatabaseError::Constraint(_))
    }
}

impl From<SqlxError> for DatabaseError {
    fn from(err: SqlxError) -> Self {
        if let SqlxError::Database(db_err) = &err {
            let code = db_err.code();
            if matches!(
                code.as_deref(),
                Some(FOREIGN_KEY_VIOLATION | UNIQUE_VIOLATION | CHECK_VIOLATION)
            ) {
                let name = db_err.constraint().unwrap_or("unknown").to_string();
                return DatabaseError::Constraint(name);
            }
        }
        DatabaseError::Query(err)
    }
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Error type for Redis operations
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Redis connection error: {0}")]
    Connection(#[source] RedisError),

    #[error("Redis command error: {0}")]
    Command(#[source] RedisError),

    #[error("Redis configuration error: {0}")]
    Configuration(String),
}

pub type CacheResult<T> = Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_is_a_query_error() {
        let err = DatabaseError::from(SqlxError::RowNotFound);
        assert!(matches!(err, DatabaseError::Query(_)));
        assert!(!err.is_constraint());
    }

    #[test]
    fn test_constraint_message() {
        let err = DatabaseError::Constraint("order_items_product_id_fkey".to_string());
        assert!(err.is_constraint());
        assert_eq!(
            err.to_string(),
            "Constraint violation: order_items_product_id_fkey"
        );
    }
}
