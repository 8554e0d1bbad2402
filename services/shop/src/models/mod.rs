//! Shop service models
//!
//! Store records and the JSON payloads exchanged with callers.

pub mod order;
pub mod product;
pub mod user;

// Re-export for convenience
pub use order::{
    CreateOrderRequest, NewOrder, NewOrderItem, Order, OrderItem, OrderLine, OrderResponse,
    OrderStatus, OrderWithItems,
};
pub use product::{NewProduct, Product, ProductPayload, ProductResponse};
pub use user::{LoginRequest, NewUser, RegisterRequest, UpdateUser, User, UserResponse};
