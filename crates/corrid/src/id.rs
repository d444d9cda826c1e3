//! Correlation identifier generation.
//!
//! # Design
//! - Generation is an injected capability so tests can substitute deterministic ids.
//! - The default generator emits random (v4) UUIDs.
//! - `MakeCorrelationId` lets tower-http's request-id layers share the generator.

use std::sync::Arc;

use http::{HeaderValue, Request};
use once_cell::sync::Lazy;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

/// Source of fresh, unique correlation identifiers.
pub trait IdGenerator: Send + Sync {
    /// Produce a new identifier.
    fn generate(&self) -> String;
}

/// Shared handle to an identifier generator.
pub type SharedIdGenerator = Arc<dyn IdGenerator>;

/// Generates random version 4 UUIDs in hyphenated form.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidV4Generator;

impl IdGenerator for UuidV4Generator {
    fn generate(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

impl<F> IdGenerator for F
where
    F: Fn() -> String + Send + Sync,
{
    fn generate(&self) -> String {
        self()
    }
}

static DEFAULT_GENERATOR: Lazy<SharedIdGenerator> = Lazy::new(|| Arc::new(UuidV4Generator));

/// Process-wide default generator (random v4 UUIDs).
#[must_use]
pub fn default_generator() -> SharedIdGenerator {
    Arc::clone(&DEFAULT_GENERATOR)
}

/// `MakeRequestId` adapter backed by an [`IdGenerator`].
#[derive(Clone)]
pub struct MakeCorrelationId {
    generator: SharedIdGenerator,
}

impl MakeCorrelationId {
    /// Wrap `generator` for use with `tower_http::request_id`.
    #[must_use]
    pub fn new(generator: SharedIdGenerator) -> Self {
        Self { generator }
    }
}

impl Default for MakeCorrelationId {
    fn default() -> Self {
        Self::new(default_generator())
    }
}

impl MakeRequestId for MakeCorrelationId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&self.generator.generate())
            .ok()
            .map(RequestId::new)
    }
}
