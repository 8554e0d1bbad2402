//! Customer accounts: registration, login and profile updates

use std::sync::Arc;

use common::error::DatabaseError;
use thiserror::Error;
use tracing::{info, warn};

use crate::hashing::{CredentialHasher, HashError};
use crate::models::{LoginRequest, NewUser, RegisterRequest, UpdateUser, User};
use crate::repositories::UserRepository;
use crate::validation::{validate_email, validate_password, validate_required};

const EMAIL_UNIQUE: &str = "users_email_key";

/// Errors raised by account operations
#[derive(Error, Debug)]
pub enum AccountError {
    #[error("User {0} not found")]
    NotFound(i64),

    #[error("{0}")]
    Validation(String),

    #[error("Email is already registered")]
    EmailTaken,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error(transparent)]
    Hashing(#[from] HashError),

    #[error(transparent)]
    Store(DatabaseError),
}

impl From<DatabaseError> for AccountError {
    fn from(err: DatabaseError) -> Self {
        match err {
            // A concurrent registration won the unique index
            DatabaseError::Constraint(ref name) if name == EMAIL_UNIQUE => AccountError::EmailTaken,
            other => AccountError::Store(other),
        }
    }
}

fn validate_profile(request: &RegisterRequest) -> Result<(), AccountError> {
    validate_required("Name", &request.name).map_err(AccountError::Validation)?;
    validate_email(&request.email).map_err(AccountError::Validation)?;
    Ok(())
}

/// Account accessor with credential hashing
#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn CredentialHasher>,
}

impl AccountService {
    pub fn new(users: Arc<dyn UserRepository>, hasher: Arc<dyn CredentialHasher>) -> Self {
        Self { users, hasher }
    }

    /// Create an account; the email must not be registered yet
    pub async fn register(&self, request: &RegisterRequest) -> Result<User, AccountError> {
        validate_profile(request)?;
        validate_password(&request.password).map_err(AccountError::Validation)?;

        if self.users.find_by_email(&request.email).await?.is_some() {
            info!("Registration rejected, email in use: {}", request.email);
            return Err(AccountError::EmailTaken);
        }

        let password_hash = self.hasher.hash(&request.password)?;
        let user = self
            .users
            .create(&NewUser {
                name: request.name.trim().to_string(),
                email: request.email.clone(),
                password_hash,
                address: request.address.clone(),
            })
            .await?;

        info!("Registered user {}", user.id);
        Ok(user)
    }

    /// Check credentials
    ///
    /// Unknown emails and wrong passwords are indistinguishable to the caller.
    pub async fn login(&self, request: &LoginRequest) -> Result<User, AccountError> {
        let Some(user) = self.users.find_by_email(&request.email).await? else {
            warn!("Login failed for unknown email {}", request.email);
            return Err(AccountError::InvalidCredentials);
        };

        if !self.hasher.verify(&request.password, &user.password_hash) {
            warn!("Login failed for user {}", user.id);
            return Err(AccountError::InvalidCredentials);
        }

        info!("User {} logged in", user.id);
        Ok(user)
    }

    pub async fn get(&self, id: i64) -> Result<User, AccountError> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or(AccountError::NotFound(id))
    }

    /// Update a profile; an empty password keeps the current one
    pub async fn update(&self, id: i64, request: &RegisterRequest) -> Result<(), AccountError> {
        validate_profile(request)?;

        let existing = self.get(id).await?;

        if existing.email != request.email {
            if let Some(other) = self.users.find_by_email(&request.email).await? {
                if other.id != id {
                    return Err(AccountError::EmailTaken);
                }
            }
        }

        let password_hash = if request.password.is_empty() {
            None
        } else {
            validate_password(&request.password).map_err(AccountError::Validation)?;
            Some(self.hasher.hash(&request.password)?)
        };

        let update = UpdateUser {
            name: request.name.trim().to_string(),
            email: request.email.clone(),
            address: request.address.clone(),
            password_hash,
        };

        if !self.users.update(id, &update).await? {
            return Err(AccountError::NotFound(id));
        }

        info!("Updated user {}", id);
        Ok(())
    }
}
