#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Telemetry primitives for correlated request handling.
//!
//! This crate centralises logging setup, correlation-aware spans, and the
//! resolution counters so every entry point reports the same way.
//!
//! Layout: `init.rs` (subscriber install), `span.rs` (correlation spans),
//! `metrics.rs` (Prometheus counters), `error.rs` (`TelemetryError`).

pub mod error;
pub mod init;
pub mod metrics;
pub mod span;

pub use error::{Result, TelemetryError};
pub use init::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, init_logging};
pub use metrics::{CorrelationMetrics, MetricsSnapshot};
pub use span::{CORRELATION_FIELD, CorrelationMakeSpan, correlation_span, record_correlation_id};
