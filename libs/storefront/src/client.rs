//! Typed HTTP client for the shop API

use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use shop::models::{
    LoginRequest, OrderResponse, ProductResponse, RegisterRequest, UserResponse,
};
use tracing::info;

use crate::cart::CheckoutDetails;
use crate::error::{StorefrontError, StorefrontResult};
use crate::session::Session;

#[derive(Clone)]
pub struct ShopClient {
    http: Client,
    base_url: Url,
}

/// Turn a non-success response into an API error carrying the shop's message
async fn read_json<T: DeserializeOwned>(response: Response) -> StorefrontResult<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Request failed").to_string());

    Err(StorefrontError::Api {
        status: status.as_u16(),
        message,
    })
}

impl ShopClient {
    /// `base_url` is the server root, e.g. `http://localhost:3000`
    pub fn new(base_url: &str) -> StorefrontResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| StorefrontError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(StorefrontError::InvalidUrl(format!(
                "{}: not a server address",
                base_url
            )));
        }

        Ok(Self {
            http: Client::new(),
            base_url,
        })
    }

    /// Endpoint under `/api`; each segment is percent-encoded on its own
    fn url(&self, segments: &[&str]) -> StorefrontResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StorefrontError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        Ok(url)
    }

    pub async fn products(&self) -> StorefrontResult<Vec<ProductResponse>> {
        read_json(self.http.get(self.url(&["products"])?).send().await?).await
    }

    pub async fn products_by_category(
        &self,
        category: &str,
    ) -> StorefrontResult<Vec<ProductResponse>> {
        let url = self.url(&["products", "category", category])?;
        read_json(self.http.get(url).send().await?).await
    }

    pub async fn register(&self, request: &RegisterRequest) -> StorefrontResult<UserResponse> {
        let response = self
            .http
            .post(self.url(&["users", "register"])?)
            .json(request)
            .send()
            .await?;
        read_json(response).await
    }

    /// Sign in and remember the user in the session
    pub async fn login(
        &self,
        session: &mut Session,
        request: &LoginRequest,
    ) -> StorefrontResult<UserResponse> {
        let response = self
            .http
            .post(self.url(&["users", "login"])?)
            .json(request)
            .send()
            .await?;
        let user: UserResponse = read_json(response).await?;

        info!("Signed in as user {}", user.id);
        session.current_user = Some(user.clone());
        Ok(user)
    }

    /// Forget the signed-in user; the cart is kept
    pub fn logout(&self, session: &mut Session) {
        session.current_user = None;
    }

    /// Submit the cart as an order and empty it once the shop accepts
    pub async fn place_order(
        &self,
        session: &mut Session,
        details: &CheckoutDetails,
    ) -> StorefrontResult<OrderResponse> {
        let request = session
            .cart
            .checkout_request(details, session.current_user.as_ref())?;

        let response = self
            .http
            .post(self.url(&["orders"])?)
            .json(&request)
            .send()
            .await?;
        let order: OrderResponse = read_json(response).await?;

        info!("Order {} placed", order.id);
        session.cart.clear();
        Ok(order)
    }

    pub async fn user_orders(&self, user_id: i64) -> StorefrontResult<Vec<OrderResponse>> {
        let url = self.url(&["users", &user_id.to_string(), "orders"])?;
        read_json(self.http.get(url).send().await?).await
    }
}
