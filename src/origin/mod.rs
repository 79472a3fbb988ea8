//! Origin file server subsystem.
//!
//! # Data Flow
//! ```text
//! GET /api/get_smart_meter_data
//!     → server.rs (open configured file)
//!     → 200 + CSV attachment headers, body streamed from disk
//!     → or error.rs (ResourceMissing → 404 "File not found.")
//! ```

pub mod error;
pub mod server;

pub use error::OriginError;
pub use server::{OriginServer, DATA_ROUTE};
