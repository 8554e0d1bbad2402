//! Shopping cart
//!
//! Lines are keyed by product id; adding a product twice bumps the quantity.
//! Totals are computed in exact decimal arithmetic, so the amounts sent at
//! checkout always satisfy the shop's total checks.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shop::models::{CreateOrderRequest, OrderLine, ProductResponse, UserResponse};

use crate::error::{StorefrontError, StorefrontResult};

/// One product in the cart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub id: i64,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub image_url: String,
    pub quantity: i32,
}

impl CartLine {
    /// Saturates instead of overflowing; the shop rejects such amounts
    pub fn total(&self) -> Decimal {
        self.price.saturating_mul(Decimal::from(self.quantity))
    }
}

/// Shipping details entered at checkout
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutDetails {
    pub name: String,
    pub email: String,
    pub address: String,
}

impl CheckoutDetails {
    /// Prefill from the signed-in user
    pub fn from_user(user: &UserResponse) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.clone(),
            address: user.address.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Add one unit of a product
    pub fn add(&mut self, product: &ProductResponse) {
        match self.lines.iter_mut().find(|line| line.id == product.id) {
            Some(line) => line.quantity += 1,
            None => self.lines.push(CartLine {
                id: product.id,
                name: product.name.clone(),
                price: product.price,
                image_url: product.image_url.clone(),
                quantity: 1,
            }),
        }
    }

    pub fn remove(&mut self, product_id: i64) {
        self.lines.retain(|line| line.id != product_id);
    }

    /// Set a line's quantity; zero or less removes the line
    pub fn update_quantity(&mut self, product_id: i64, quantity: i32) {
        if quantity <= 0 {
            self.remove(product_id);
            return;
        }

        if let Some(line) = self.lines.iter_mut().find(|line| line.id == product_id) {
            line.quantity = quantity;
        }
    }

    /// Number of units across all lines
    pub fn count(&self) -> i32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    pub fn total(&self) -> Decimal {
        self.lines
            .iter()
            .map(CartLine::total)
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Build the order placement body; guests are sent as user 0
    pub fn checkout_request(
        &self,
        details: &CheckoutDetails,
        user: Option<&UserResponse>,
    ) -> StorefrontResult<CreateOrderRequest> {
        if self.is_empty() {
            return Err(StorefrontError::EmptyCart);
        }

        Ok(CreateOrderRequest {
            user_id: Some(user.map_or(0, |u| u.id)),
            user_name: details.name.clone(),
            user_email: details.email.clone(),
            shipping_address: details.address.clone(),
            total_amount: self.total(),
            items: self
                .lines
                .iter()
                .map(|line| OrderLine {
                    product_id: line.id,
                    product_name: line.name.clone(),
                    price: line.price,
                    quantity: line.quantity,
                    total: line.total(),
                })
                .collect(),
        })
    }
}
