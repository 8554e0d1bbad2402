//! Input validation utilities

use regex::Regex;
use rust_decimal::Decimal;
use std::sync::OnceLock;

use crate::models::ProductPayload;

/// Validate that a required text field is present
pub fn validate_required(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} is required", field));
    }

    Ok(())
}

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 100 {
        return Err("Email must be at most 100 characters long".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    if password.chars().count() < 6 {
        return Err("Password must be at least 6 characters long".to_string());
    }

    if password.len() > 128 {
        return Err("Password must be at most 128 characters long".to_string());
    }

    Ok(())
}

/// Largest value a `NUMERIC(18, 2)` column holds
pub fn max_amount() -> Decimal {
    Decimal::new(999_999_999_999_999_999, 2)
}

/// Validate a monetary amount: non-negative, storable, at most two decimals
pub fn validate_amount(field: &str, amount: Decimal) -> Result<(), String> {
    if amount.is_sign_negative() {
        return Err(format!("{} must not be negative", field));
    }

    if amount > max_amount() {
        return Err(format!("{} must be at most {}", field, max_amount()));
    }

    if amount != amount.round_dp(2) {
        return Err(format!("{} must have at most two decimal places", field));
    }

    Ok(())
}

/// Validate a product body
pub fn validate_product(product: &ProductPayload) -> Result<(), String> {
    validate_required("Name", &product.name)?;
    validate_required("Category", &product.category)?;

    if product.name.len() > 200 {
        return Err("Name must be at most 200 characters long".to_string());
    }

    if product.description.len() > 1000 {
        return Err("Description must be at most 1000 characters long".to_string());
    }

    validate_amount("Price", product.price)?;

    if product.stock < 0 {
        return Err("Stock must not be negative".to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product() -> ProductPayload {
        ProductPayload {
            id: None,
            name: "Kettle".to_string(),
            description: "Stainless steel".to_string(),
            price: Decimal::new(2450, 2),
            image_url: String::new(),
            category: "Kitchen".to_string(),
            stock: 3,
        }
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("ada@example.com").is_ok());
        assert_eq!(validate_email("").unwrap_err(), "Email is required");
        assert_eq!(validate_email("ada@").unwrap_err(), "Invalid email format");
    }

    #[test]
    fn test_validate_password_length() {
        assert!(validate_password("abcdef").is_ok());
        assert_eq!(
            validate_password("abc").unwrap_err(),
            "Password must be at least 6 characters long"
        );
    }

    #[test]
    fn test_validate_required_trims() {
        assert_eq!(
            validate_required("Shipping address", "   ").unwrap_err(),
            "Shipping address is required"
        );
    }

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount("Price", Decimal::new(1999, 2)).is_ok());
        assert!(validate_amount("Price", Decimal::new(-1, 0)).is_err());
        assert!(validate_amount("Price", Decimal::new(19999, 3)).is_err());

        assert!(validate_amount("Price", max_amount()).is_ok());
        assert_eq!(
            validate_amount("Price", max_amount() + Decimal::new(1, 2)).unwrap_err(),
            "Price must be at most 9999999999999999.99"
        );
        assert!(validate_amount("Price", Decimal::MAX).is_err());
    }

    #[test]
    fn test_validate_product() {
        assert!(validate_product(&product()).is_ok());

        let mut negative = product();
        negative.stock = -1;
        assert_eq!(
            validate_product(&negative).unwrap_err(),
            "Stock must not be negative"
        );

        let mut unnamed = product();
        unnamed.name = String::new();
        assert_eq!(validate_product(&unnamed).unwrap_err(), "Name is required");
    }
}
