//! Storefront client library
//!
//! Keeps the shopper's cart and signed-in user in an explicit [`Session`],
//! persists it through a [`SessionStorage`], and talks to the shop service
//! through [`ShopClient`].
//!
//! ```rust,no_run
//! use storefront::{CheckoutDetails, MemoryStorage, SessionStorage, ShopClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ShopClient::new("http://localhost:3000")?;
//!     let storage = MemoryStorage::new();
//!
//!     let mut session = storage.load("visitor-1").await?;
//!     let products = client.products().await?;
//!     session.cart.add(&products[0]);
//!
//!     let details = CheckoutDetails {
//!         name: "Ada".to_string(),
//!         email: "ada@example.com".to_string(),
//!         address: "1 Analytical Way".to_string(),
//!     };
//!     let order = client.place_order(&mut session, &details).await?;
//!     println!("Placed order {}", order.id);
//!
//!     storage.save("visitor-1", &session).await?;
//!     Ok(())
//! }
//! ```

pub mod cart;
pub mod client;
pub mod error;
pub mod session;

pub use cart::{Cart, CartLine, CheckoutDetails};
pub use client::ShopClient;
pub use error::{StorefrontError, StorefrontResult};
pub use session::{MemoryStorage, RedisStorage, Session, SessionStorage};
