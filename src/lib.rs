//! Smart meter data relay library.
//!
//! Two services: an origin that serves a single CSV file, and a relay that
//! streams that file through to its own callers.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod origin;
pub mod relay;

pub use config::schema::RelayConfig;
pub use lifecycle::Shutdown;
pub use origin::OriginServer;
pub use relay::RelayServer;
