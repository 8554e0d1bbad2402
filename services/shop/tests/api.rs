//! HTTP tests for the shop router over the in-memory store

use std::sync::Arc;

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use shop::{AppState, create_router, hashing::Sha256Hasher, memory::MemoryStore};
use tokio::net::TcpListener;

async fn spawn_shop() -> String {
    let store = MemoryStore::with_default_catalog().await;
    let app = create_router(AppState::in_memory(store, Arc::new(Sha256Hasher)));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

fn order_body(lines: &[(i64, &str, f64, i32)]) -> Value {
    let items: Vec<Value> = lines
        .iter()
        .map(|(id, name, price, quantity)| {
            json!({
                "productId": id,
                "productName": name,
                "price": price,
                "quantity": quantity,
                "total": price * f64::from(*quantity),
            })
        })
        .collect();
    let total: f64 = lines
        .iter()
        .map(|(_, _, price, quantity)| price * f64::from(*quantity))
        .sum();

    json!({
        "userId": 0,
        "userName": "Ada Lovelace",
        "userEmail": "ada@example.com",
        "shippingAddress": "1 Analytical Way",
        "totalAmount": total,
        "items": items,
    })
}

async fn stock(client: &Client, base: &str, id: i64) -> i64 {
    let product: Value = client
        .get(format!("{}/api/products/{}", base, id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    product["stock"].as_i64().unwrap()
}

#[tokio::test]
async fn test_health() {
    let base = spawn_shop().await;
    let body: Value = reqwest::get(format!("{}/health", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_catalog_reads() {
    let base = spawn_shop().await;
    let client = Client::new();

    let products: Vec<Value> = client
        .get(format!("{}/api/products", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(products.len(), 6);
    assert_eq!(products[0]["name"], "Smartphone");
    assert_eq!(products[0]["price"], 699.99);
    assert!(products[0].get("imageUrl").is_some());

    let clothing: Vec<Value> = client
        .get(format!("{}/api/products/category/clothing", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let names: Vec<&str> = clothing.iter().map(|p| p["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["T-Shirt", "Jeans"]);

    let missing = client
        .get(format!("{}/api/products/999", base))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert!(missing.text().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_catalog_writes() {
    let base = spawn_shop().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/api/products", base))
        .json(&json!({
            "name": "Kettle",
            "description": "Stainless steel",
            "price": 24.5,
            "imageUrl": "",
            "category": "Kitchen",
            "stock": 3
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let location = response.headers()["location"].to_str().unwrap().to_string();
    let created: Value = response.json().await.unwrap();
    let id = created["id"].as_i64().unwrap();
    assert_eq!(location, format!("/api/products/{}", id));

    let mismatch = client
        .put(format!("{}/api/products/{}", base, id))
        .json(&json!({ "id": id + 1, "name": "Kettle", "price": 20.0, "category": "Kitchen" }))
        .send()
        .await
        .unwrap();
    assert_eq!(mismatch.status(), StatusCode::BAD_REQUEST);
    let body: Value = mismatch.json().await.unwrap();
    assert_eq!(body["message"], "Product ID mismatch");

    let updated = client
        .put(format!("{}/api/products/{}", base, id))
        .json(&json!({ "id": id, "name": "Kettle", "price": 20.0, "category": "Kitchen", "stock": 9 }))
        .send()
        .await
        .unwrap();
    assert_eq!(updated.status(), StatusCode::NO_CONTENT);
    assert_eq!(stock(&client, &base, id).await, 9);

    let unknown = client
        .put(format!("{}/api/products/999", base))
        .json(&json!({ "name": "Kettle", "price": 20.0, "category": "Kitchen" }))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);

    let deleted = client
        .delete(format!("{}/api/products/{}", base, id))
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let again = client
        .delete(format!("{}/api/products/{}", base, id))
        .send()
        .await
        .unwrap();
    assert_eq!(again.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_product_referenced_by_order_conflicts() {
    let base = spawn_shop().await;
    let client = Client::new();

    let placed = client
        .post(format!("{}/api/orders", base))
        .json(&order_body(&[(4, "Jeans", 49.99, 1)]))
        .send()
        .await
        .unwrap();
    assert_eq!(placed.status(), StatusCode::CREATED);

    let response = client
        .delete(format!("{}/api/products/4", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_order_lifecycle() {
    let base = spawn_shop().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/api/orders", base))
        .json(&order_body(&[(3, "T-Shirt", 19.99, 3), (4, "Jeans", 49.99, 1)]))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let order: Value = response.json().await.unwrap();
    let id = order["id"].as_i64().unwrap();
    assert_eq!(order["status"], "Pending");
    assert!(order["userId"].is_null());
    assert_eq!(order["totalAmount"], 109.96);
    assert_eq!(order["items"].as_array().unwrap().len(), 2);
    assert_eq!(stock(&client, &base, 3).await, 97);

    let status = client
        .put(format!("{}/api/orders/{}/status", base, id))
        .json(&"Shipped")
        .send()
        .await
        .unwrap();
    assert_eq!(status.status(), StatusCode::NO_CONTENT);

    let invalid = client
        .put(format!("{}/api/orders/{}/status", base, id))
        .json(&"Lost")
        .send()
        .await
        .unwrap();
    assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
    let body: Value = invalid.json().await.unwrap();
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Invalid status. Valid statuses are: Pending"));

    let cancel = client
        .delete(format!("{}/api/orders/{}", base, id))
        .send()
        .await
        .unwrap();
    assert_eq!(cancel.status(), StatusCode::NO_CONTENT);
    assert_eq!(stock(&client, &base, 3).await, 100);
    assert_eq!(stock(&client, &base, 4).await, 75);

    let fetched: Value = client
        .get(format!("{}/api/orders/{}", base, id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["status"], "Cancelled");

    let twice = client
        .delete(format!("{}/api/orders/{}", base, id))
        .send()
        .await
        .unwrap();
    assert_eq!(twice.status(), StatusCode::BAD_REQUEST);
    let body: Value = twice.json().await.unwrap();
    assert_eq!(body["message"], "Order is already cancelled");
}

#[tokio::test]
async fn test_delivered_order_cannot_be_cancelled() {
    let base = spawn_shop().await;
    let client = Client::new();

    let order: Value = client
        .post(format!("{}/api/orders", base))
        .json(&order_body(&[(6, "Sneakers", 79.99, 2)]))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = order["id"].as_i64().unwrap();

    client
        .put(format!("{}/api/orders/{}/status", base, id))
        .json(&"Delivered")
        .send()
        .await
        .unwrap();

    let response = client
        .delete(format!("{}/api/orders/{}", base, id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Cannot cancel a delivered order");
    assert_eq!(stock(&client, &base, 6).await, 58);
}

#[tokio::test]
async fn test_insufficient_stock_is_rejected_without_side_effects() {
    let base = spawn_shop().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/api/orders", base))
        .json(&order_body(&[(3, "T-Shirt", 19.99, 1), (2, "Laptop", 999.99, 31)]))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Insufficient stock for product Laptop");

    assert_eq!(stock(&client, &base, 3).await, 100);
    let orders: Vec<Value> = client
        .get(format!("{}/api/orders", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(orders.is_empty());
}

#[tokio::test]
async fn test_oversized_amounts_are_rejected() {
    let base = spawn_shop().await;
    let client = Client::new();

    let mut body = order_body(&[(3, "T-Shirt", 19.99, 1)]);
    body["items"][0]["price"] = json!(1e27);
    body["items"][0]["quantity"] = json!(100);

    let response = client
        .post(format!("{}/api/orders", base))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let message: Value = response.json().await.unwrap();
    assert_eq!(
        message["message"],
        "Price must be at most 9999999999999999.99"
    );

    let response = client
        .post(format!("{}/api/products", base))
        .json(&json!({ "name": "Yacht", "price": 1e20, "category": "Boats" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert_eq!(stock(&client, &base, 3).await, 100);
}

#[tokio::test]
async fn test_concurrent_orders_never_overdraw() {
    let base = spawn_shop().await;
    let client = Client::new();

    // Laptop starts with 30: exactly three orders of ten fit
    let attempts = (0..8).map(|_| {
        let client = client.clone();
        let url = format!("{}/api/orders", base);
        tokio::spawn(async move {
            client
                .post(url)
                .json(&order_body(&[(2, "Laptop", 999.99, 10)]))
                .send()
                .await
                .unwrap()
                .status()
        })
    });

    let mut accepted = 0;
    for attempt in attempts.collect::<Vec<_>>() {
        match attempt.await.unwrap() {
            StatusCode::CREATED => accepted += 1,
            StatusCode::BAD_REQUEST => {}
            other => panic!("unexpected status {}", other),
        }
    }

    assert_eq!(accepted, 3);
    assert_eq!(stock(&client, &base, 2).await, 0);
}

#[tokio::test]
async fn test_accounts_and_user_orders() {
    let base = spawn_shop().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/api/users/register", base))
        .json(&json!({
            "name": "Grace Hopper",
            "email": "grace@example.com",
            "password": "cobol1959",
            "address": "7 Compiler Court"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let user: Value = response.json().await.unwrap();
    let user_id = user["id"].as_i64().unwrap();
    assert!(user.get("passwordHash").is_none());

    let duplicate = client
        .post(format!("{}/api/users/register", base))
        .json(&json!({ "name": "Grace", "email": "grace@example.com", "password": "another1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);

    let bad_login = client
        .post(format!("{}/api/users/login", base))
        .json(&json!({ "email": "grace@example.com", "password": "nope-nope" }))
        .send()
        .await
        .unwrap();
    assert_eq!(bad_login.status(), StatusCode::UNAUTHORIZED);
    let body: Value = bad_login.json().await.unwrap();
    assert_eq!(body["message"], "Invalid email or password");

    let login = client
        .post(format!("{}/api/users/login", base))
        .json(&json!({ "email": "grace@example.com", "password": "cobol1959" }))
        .send()
        .await
        .unwrap();
    assert_eq!(login.status(), StatusCode::OK);

    let update = client
        .put(format!("{}/api/users/{}", base, user_id))
        .json(&json!({ "name": "Grace Hopper", "email": "grace@example.com", "password": "", "address": "8 Compiler Court" }))
        .send()
        .await
        .unwrap();
    assert_eq!(update.status(), StatusCode::NO_CONTENT);

    let fetched: Value = client
        .get(format!("{}/api/users/{}", base, user_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["address"], "8 Compiler Court");

    let mut body = order_body(&[(5, "Headphones", 199.99, 1)]);
    body["userId"] = json!(user_id);
    let placed = client
        .post(format!("{}/api/orders", base))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(placed.status(), StatusCode::CREATED);

    let orders: Vec<Value> = client
        .get(format!("{}/api/users/{}/orders", base, user_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["userId"], user_id);

    let missing = client
        .get(format!("{}/api/users/9999", base))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}
