//! Shop service routes

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post, put},
};
use common::error::DatabaseError;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::models::{
    CreateOrderRequest, LoginRequest, OrderResponse, Product, ProductPayload, ProductResponse,
    RegisterRequest, UserResponse,
};
use crate::responses::{order_response, product_response, user_response};
use crate::state::AppState;
use crate::validation::validate_product;

/// Create the router for the shop service
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/products", get(list_products).post(create_product))
        .route(
            "/api/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/api/products/category/:category", get(products_by_category))
        .route("/api/users/register", post(register))
        .route("/api/users/login", post(login))
        .route("/api/users/:id", get(get_user).put(update_user))
        .route("/api/users/:id/orders", get(user_orders))
        .route("/api/orders", get(list_orders).post(create_order))
        .route("/api/orders/:id", get(get_order).delete(cancel_order))
        .route("/api/orders/:id/status", put(update_order_status))
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "shop"
    }))
}

fn created<T: serde::Serialize>(location: String, body: T) -> impl IntoResponse {
    (StatusCode::CREATED, [(header::LOCATION, location)], Json(body))
}

// Catalog

pub async fn list_products(State(state): State<AppState>) -> ApiResult<Json<Vec<ProductResponse>>> {
    let products = state
        .product_repository
        .get_all()
        .await
        .map_err(|e| ApiError::from_store("Error retrieving products", e))?;

    Ok(Json(products.iter().map(product_response).collect()))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<ProductResponse>> {
    let product = state
        .product_repository
        .find_by_id(id)
        .await
        .map_err(|e| ApiError::from_store("Error retrieving product", e))?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(product_response(&product)))
}

pub async fn products_by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> ApiResult<Json<Vec<ProductResponse>>> {
    let products = state
        .product_repository
        .find_by_category(&category)
        .await
        .map_err(|e| ApiError::from_store("Error retrieving products", e))?;

    Ok(Json(products.iter().map(product_response).collect()))
}

pub async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<ProductPayload>,
) -> ApiResult<impl IntoResponse> {
    validate_product(&payload).map_err(ApiError::BadRequest)?;

    let product = state
        .product_repository
        .create(&payload.into_new_product())
        .await
        .map_err(|e| ApiError::from_store("Error creating product", e))?;

    info!("Created product {}", product.id);
    Ok(created(
        format!("/api/products/{}", product.id),
        product_response(&product),
    ))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<ProductPayload>,
) -> ApiResult<StatusCode> {
    if payload.id.is_some_and(|body_id| body_id != id) {
        return Err(ApiError::BadRequest("Product ID mismatch".to_string()));
    }
    validate_product(&payload).map_err(ApiError::BadRequest)?;

    let new_product = payload.into_new_product();
    let product = Product {
        id,
        name: new_product.name,
        description: new_product.description,
        price: new_product.price,
        image_url: new_product.image_url,
        category: new_product.category,
        stock: new_product.stock,
    };

    let updated = state
        .product_repository
        .update(&product)
        .await
        .map_err(|e| ApiError::from_store("Error updating product", e))?;

    if !updated {
        return Err(ApiError::NotFound);
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    match state.product_repository.delete(id).await {
        Ok(true) => {
            info!("Deleted product {}", id);
            Ok(StatusCode::NO_CONTENT)
        }
        Ok(false) => Err(ApiError::NotFound),
        Err(DatabaseError::Constraint(_)) => Err(ApiError::Conflict(
            "Product is referenced by existing orders".to_string(),
        )),
        Err(e) => Err(ApiError::from_store("Error deleting product", e)),
    }
}

// Accounts

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = state
        .account_service
        .register(&payload)
        .await
        .map_err(|e| ApiError::from_account("Error registering user", e))?;

    Ok(created(format!("/api/users/{}", user.id), user_response(&user)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<UserResponse>> {
    let user = state
        .account_service
        .login(&payload)
        .await
        .map_err(|e| ApiError::from_account("Error during login", e))?;

    Ok(Json(user_response(&user)))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<UserResponse>> {
    let user = state
        .account_service
        .get(id)
        .await
        .map_err(|e| ApiError::from_account("Error retrieving user", e))?;

    Ok(Json(user_response(&user)))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<StatusCode> {
    state
        .account_service
        .update(id, &payload)
        .await
        .map_err(|e| ApiError::from_account("Error updating user", e))?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn user_orders(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<OrderResponse>>> {
    let orders = state
        .order_service
        .user_orders(id)
        .await
        .map_err(|e| ApiError::from_order("Error retrieving user orders", e))?;

    Ok(Json(orders.iter().map(order_response).collect()))
}

// Orders

pub async fn list_orders(State(state): State<AppState>) -> ApiResult<Json<Vec<OrderResponse>>> {
    let orders = state
        .order_service
        .list_orders()
        .await
        .map_err(|e| ApiError::from_order("Error retrieving orders", e))?;

    Ok(Json(orders.iter().map(order_response).collect()))
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<OrderResponse>> {
    let order = state
        .order_service
        .get_order(id)
        .await
        .map_err(|e| ApiError::from_order("Error retrieving order", e))?;

    Ok(Json(order_response(&order)))
}

pub async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderRequest>,
) -> ApiResult<impl IntoResponse> {
    let order = state
        .order_service
        .create_order(&payload)
        .await
        .map_err(|e| ApiError::from_order("Error creating order", e))?;

    Ok(created(
        format!("/api/orders/{}", order.order.id),
        order_response(&order),
    ))
}

pub async fn cancel_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state
        .order_service
        .cancel_order(id)
        .await
        .map_err(|e| ApiError::from_order("Error cancelling order", e))?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(status): Json<String>,
) -> ApiResult<StatusCode> {
    state
        .order_service
        .update_status(id, &status)
        .await
        .map_err(|e| ApiError::from_order("Error updating order status", e))?;

    Ok(StatusCode::NO_CONTENT)
}
