//! Relay subsystem.
//!
//! # Data Flow
//! ```text
//! GET /mcp/meter_data/{meter_id}
//!     → server.rs (request ID, meter ID logged and ignored)
//!     → upstream.rs (GET origin; connect + header deadlines; status check)
//!     → stream.rs (bounded chunks, byte accounting)
//!     → 200 streamed body, Content-Type copied from origin
//!
//! Any failure before the first byte:
//!     → error.rs (502 "Error fetching data from upstream: ...")
//! Failure after the first byte:
//!     → downstream body errors, connection aborted
//! ```

pub mod error;
pub mod server;
pub mod stream;
pub mod upstream;

pub use error::RelayError;
pub use server::{RelayServer, METER_DATA_ROUTE};
pub use stream::{ChunkedStream, MeteredStream};
pub use upstream::UpstreamClient;
