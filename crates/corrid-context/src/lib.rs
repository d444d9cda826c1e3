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

//! Task-scoped context storage for asynchronous call graphs.
//!
//! A context is opened with [`scope`] and stays current for every await point
//! reached from the scoped future. Sibling scopes never observe each other's
//! context, even when they are interleaved on the same worker thread.
//!
//! Layout: `context.rs` (the `TaskContext` map handle), `store.rs` (scope,
//! lookup, and propagation onto spawned tasks), `error.rs` (`ContextError`).

pub mod context;
pub mod error;
pub mod store;

pub use context::TaskContext;
pub use error::{ContextError, ContextResult};
pub use store::{current, propagate, scope, scope_sync, spawn, spawn_blocking, with_current};
