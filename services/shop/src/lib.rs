//! Storefront backend: catalog, accounts and transactional order placement
//!
//! The binary in `main.rs` wires these modules to PostgreSQL; tests and the
//! storefront client crate run the same router over [`memory::MemoryStore`].

pub mod accounts;
pub mod config;
pub mod error;
pub mod hashing;
pub mod memory;
pub mod models;
pub mod orders;
pub mod repositories;
pub mod responses;
pub mod routes;
pub mod state;
pub mod validation;

pub use routes::create_router;
pub use state::AppState;
