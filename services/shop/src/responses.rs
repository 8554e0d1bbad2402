//! Mapping from store records to wire shapes

use crate::models::{
    OrderItem, OrderLine, OrderResponse, OrderWithItems, Product, ProductResponse, User,
    UserResponse,
};

pub fn product_response(product: &Product) -> ProductResponse {
    ProductResponse {
        id: product.id,
        name: product.name.clone(),
        description: product.description.clone(),
        price: product.price,
        image_url: product.image_url.clone(),
        category: product.category.clone(),
        stock: product.stock,
    }
}

/// The credential hash is never exposed
pub fn user_response(user: &User) -> UserResponse {
    UserResponse {
        id: user.id,
        name: user.name.clone(),
        email: user.email.clone(),
        address: user.address.clone(),
        created_at: user.created_at,
    }
}

pub fn order_item_response(item: &OrderItem) -> OrderLine {
    OrderLine {
        product_id: item.product_id,
        product_name: item.product_name.clone(),
        price: item.price,
        quantity: item.quantity,
        total: item.total,
    }
}

pub fn order_response(order: &OrderWithItems) -> OrderResponse {
    let OrderWithItems { order, items } = order;

    OrderResponse {
        id: order.id,
        user_id: order.user_id,
        user_name: order.user_name.clone(),
        user_email: order.user_email.clone(),
        shipping_address: order.shipping_address.clone(),
        total_amount: order.total_amount,
        order_date: order.order_date,
        status: order.status,
        items: items.iter().map(order_item_response).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Order, OrderStatus};
    use chrono::Utc;
    use rust_decimal::Decimal;

    #[test]
    fn test_user_response_has_no_hash() {
        let user = User {
            id: 7,
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: "secret-hash".to_string(),
            address: "1 Analytical Way".to_string(),
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(user_response(&user)).unwrap();
        assert_eq!(json["email"], "ada@example.com");
        assert!(json.get("passwordHash").is_none());
        assert!(!json.to_string().contains("secret-hash"));
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn test_order_response_wire_shape() {
        let order = OrderWithItems {
            order: Order {
                id: 3,
                user_id: None,
                user_name: "Ada".to_string(),
                user_email: "ada@example.com".to_string(),
                shipping_address: "1 Analytical Way".to_string(),
                total_amount: Decimal::new(5998, 2),
                order_date: Utc::now(),
                status: OrderStatus::Shipped,
            },
            items: vec![OrderItem {
                id: 9,
                order_id: 3,
                product_id: 4,
                product_name: "Jeans".to_string(),
                price: Decimal::new(2999, 2),
                quantity: 2,
                total: Decimal::new(5998, 2),
            }],
        };

        let json = serde_json::to_value(order_response(&order)).unwrap();
        assert_eq!(json["id"], 3);
        assert!(json["userId"].is_null());
        assert_eq!(json["shippingAddress"], "1 Analytical Way");
        assert_eq!(json["status"], "Shipped");
        assert_eq!(json["totalAmount"], 59.98);
        assert_eq!(json["items"][0]["productId"], 4);
        assert_eq!(json["items"][0]["productName"], "Jeans");
        assert_eq!(json["items"][0]["quantity"], 2);
        assert_eq!(json["items"][0]["price"], 29.99);
    }
}
