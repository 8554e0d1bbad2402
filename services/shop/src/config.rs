//! Service configuration
//!
//! Read from `SHOP_`-prefixed environment variables; the database itself is
//! configured through [`common::database::DatabaseConfig`].

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

use crate::hashing::PasswordScheme;

/// Shop service configuration
///
/// # Environment Variables
/// - `SHOP_BIND_ADDRESS`: listen address (default: "0.0.0.0:3000")
/// - `SHOP_PASSWORD_SCHEME`: `argon2` or `sha256` (default: "argon2")
/// - `SHOP_RUN_MIGRATIONS`: apply migrations at startup (default: true)
#[derive(Debug, Clone, Deserialize)]
pub struct ShopConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default)]
    pub password_scheme: PasswordScheme,
    #[serde(default = "default_run_migrations")]
    pub run_migrations: bool,
}

fn default_bind_address() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_run_migrations() -> bool {
    true
}

impl ShopConfig {
    /// Load the configuration from the environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Environment::with_prefix("SHOP").try_parsing(true))
            .build()?
            .try_deserialize()
    }
}
