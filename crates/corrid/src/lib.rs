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

//! Per-request correlation identifiers propagated through async call graphs.
//!
//! Work is tagged by opening a correlation scope, either from inbound HTTP
//! headers ([`CorrelationLayer`], [`Correlator::correlate`]) or directly
//! ([`attach`]). Any code reached from that scope, across await points, reads
//! the identifier with [`correlation_id`].
//!
//! Layout: `headers.rs` (header names and read/write capabilities), `id.rs`
//! (identifier generation), `resolve.rs` (header precedence), `scope.rs`
//! (entry points and accessor), `layer.rs` (tower middleware), `extract.rs`
//! (axum extractor), `config.rs` (environment configuration), `error.rs`.

pub mod config;
pub mod error;
pub mod extract;
pub mod headers;
pub mod id;
pub mod layer;
pub mod resolve;
pub mod scope;

pub use config::CorrelationConfig;
pub use error::{CorrelationError, CorrelationResult};
pub use extract::{Correlation, MissingCorrelation};
pub use headers::{CORRELATION_ID, HeaderSink, HeaderSource, StagedHeaders, X_CORRELATION_ID};
pub use id::{IdGenerator, MakeCorrelationId, SharedIdGenerator, UuidV4Generator};
pub use layer::{CorrelationLayer, CorrelationService};
pub use resolve::{Resolution, ResolutionPolicy, ResolutionSource, Resolver};
pub use scope::{
    CORRELATION_ID_KEY, Correlated, Correlator, attach, correlation_id, with_correlation_id,
};
