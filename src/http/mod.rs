//! HTTP protocol handling shared by both services.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID assigned and echoed)
//!     → origin or relay handler
//!     → Send to client
//! ```

pub mod request;
pub mod server;

pub use request::{request_id, request_id_value, X_REQUEST_ID};
pub use server::{serve, with_common_layers};
