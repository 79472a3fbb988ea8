//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! origin + relay handlers produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Request ID is a field on every handler log line
//! - Metrics are cheap (atomic increments) and off by default

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
