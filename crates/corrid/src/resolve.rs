//! Correlation id resolution across response, request, and generated sources.
//!
//! # Design
//! - Precedence: staged response headers, then request headers, then a fresh id.
//! - Within each source `x-correlation-id` beats `correlation-id`.
//! - The first non-empty match wins; candidates are never merged.
//! - Checking staged response headers is a policy flag so a second pass through
//!   the middleware reuses the id the first pass committed.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::headers::{CORRELATION_ID, HeaderSource, X_CORRELATION_ID};
use crate::id::{IdGenerator, SharedIdGenerator, default_generator};

const PRECEDENCE: [&str; 2] = [X_CORRELATION_ID, CORRELATION_ID];

/// Knobs controlling which sources the resolver consults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionPolicy {
    /// Reuse a correlation header already staged on the response.
    pub check_existing_response_headers: bool,
}

impl ResolutionPolicy {
    /// Consult only request headers before generating.
    #[must_use]
    pub const fn request_only() -> Self {
        Self {
            check_existing_response_headers: false,
        }
    }
}

impl Default for ResolutionPolicy {
    fn default() -> Self {
        Self {
            check_existing_response_headers: true,
        }
    }
}

/// Where a resolved id came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    /// Reused from a header already staged on the response.
    StagedResponse,
    /// Adopted from an inbound request header.
    Request,
    /// Freshly generated.
    Generated,
}

impl ResolutionSource {
    /// Stable label used in logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StagedResponse => "staged_response",
            Self::Request => "request",
            Self::Generated => "generated",
        }
    }
}

impl fmt::Display for ResolutionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a resolution: the id and the header to advertise it under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Correlation identifier to adopt.
    pub id: String,
    /// Header name the id is advertised under.
    pub header: &'static str,
    /// Source the id was taken from.
    pub source: ResolutionSource,
}

/// Applies the correlation header precedence.
#[derive(Clone)]
pub struct Resolver {
    policy: ResolutionPolicy,
    generator: SharedIdGenerator,
}

impl Resolver {
    /// Resolver using `policy` and random v4 UUIDs for fresh ids.
    #[must_use]
    pub fn new(policy: ResolutionPolicy) -> Self {
        Self {
            policy,
            generator: default_generator(),
        }
    }

    /// Replace the identifier generator.
    #[must_use]
    pub fn with_generator(self, generator: impl IdGenerator + 'static) -> Self {
        self.with_shared_generator(std::sync::Arc::new(generator))
    }

    /// Replace the identifier generator with a shared handle.
    #[must_use]
    pub fn with_shared_generator(mut self, generator: SharedIdGenerator) -> Self {
        self.generator = generator;
        self
    }

    /// Active policy.
    #[must_use]
    pub const fn policy(&self) -> ResolutionPolicy {
        self.policy
    }

    /// Shared handle to the identifier generator.
    #[must_use]
    pub fn generator(&self) -> SharedIdGenerator {
        SharedIdGenerator::clone(&self.generator)
    }

    /// Produce a fresh identifier.
    #[must_use]
    pub fn generate_id(&self) -> String {
        self.generator.generate()
    }

    /// Decide the id for a request, given headers already staged on its response.
    ///
    /// Never fails: with no usable header a fresh id is generated under
    /// `x-correlation-id`.
    pub fn resolve<R, S>(&self, request: &R, staged: Option<&S>) -> Resolution
    where
        R: HeaderSource + ?Sized,
        S: HeaderSource + ?Sized,
    {
        if self.policy.check_existing_response_headers
            && let Some((header, id)) = staged.and_then(first_present)
        {
            return Resolution {
                id: id.into_owned(),
                header,
                source: ResolutionSource::StagedResponse,
            };
        }

        if let Some((header, id)) = first_present(request) {
            return Resolution {
                id: id.into_owned(),
                header,
                source: ResolutionSource::Request,
            };
        }

        Resolution {
            id: self.generate_id(),
            header: X_CORRELATION_ID,
            source: ResolutionSource::Generated,
        }
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(ResolutionPolicy::default())
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

fn first_present<H>(headers: &H) -> Option<(&'static str, Cow<'_, str>)>
where
    H: HeaderSource + ?Sized,
{
    PRECEDENCE
        .iter()
        .find_map(|name| headers.header(name).map(|value| (*name, value)))
}
