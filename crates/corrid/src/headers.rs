//! Correlation header names and the read/write capabilities over header maps.
//!
//! # Design
//! - `HeaderSource` reads case-insensitively; empty values count as absent.
//! - Values outside visible ASCII are still present; they are decoded lossily
//!   as UTF-8 and written back byte for byte.
//! - `StagedHeaders` stands in for "headers already set on the response" while a
//!   request is still travelling through a tower stack. It rides along as a
//!   request extension and is merged into the final response.

use std::borrow::Cow;
use std::collections::HashMap;

use http::{HeaderMap, HeaderName, HeaderValue};

use crate::error::{CorrelationError, CorrelationResult};

/// Preferred correlation header; used for generated ids and ties.
pub const X_CORRELATION_ID: &str = "x-correlation-id";
/// Alternate correlation header.
pub const CORRELATION_ID: &str = "correlation-id";

/// Read access to a set of headers.
pub trait HeaderSource {
    /// Non-empty value stored under `name`, matched case-insensitively.
    fn header(&self, name: &str) -> Option<Cow<'_, str>>;
}

/// Write access to a set of headers.
pub trait HeaderSink {
    /// Store `value` under `name`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the name or value cannot be represented as a header.
    fn set_header(&mut self, name: &str, value: &str) -> CorrelationResult<()>;
}

impl HeaderSource for HeaderMap {
    fn header(&self, name: &str) -> Option<Cow<'_, str>> {
        self.get(name)
            .map(HeaderValue::as_bytes)
            .filter(|bytes| !bytes.is_empty())
            .map(String::from_utf8_lossy)
    }
}

impl HeaderSink for HeaderMap {
    fn set_header(&mut self, name: &str, value: &str) -> CorrelationResult<()> {
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|source| {
            CorrelationError::InvalidHeaderName {
                header: name.to_string(),
                source,
            }
        })?;
        let header_value = HeaderValue::from_bytes(value.as_bytes()).map_err(|source| {
            CorrelationError::InvalidHeaderValue {
                header: name.to_string(),
                source,
            }
        })?;
        self.insert(header_name, header_value);
        Ok(())
    }
}

/// Keys differing only in case are all candidates: an exact key match wins,
/// otherwise the smallest matching key, so lookups never depend on hash order.
impl HeaderSource for HashMap<String, String> {
    fn header(&self, name: &str) -> Option<Cow<'_, str>> {
        self.get(name)
            .filter(|value| !value.is_empty())
            .or_else(|| {
                self.iter()
                    .filter(|(key, value)| key.eq_ignore_ascii_case(name) && !value.is_empty())
                    .min_by(|(left, _), (right, _)| left.cmp(right))
                    .map(|(_, value)| value)
            })
            .map(|value| Cow::Borrowed(value.as_str()))
    }
}

impl HeaderSink for HashMap<String, String> {
    fn set_header(&mut self, name: &str, value: &str) -> CorrelationResult<()> {
        self.retain(|key, _| !key.eq_ignore_ascii_case(name));
        self.insert(name.to_ascii_lowercase(), value.to_string());
        Ok(())
    }
}

/// Response headers staged ahead of the response itself.
#[derive(Debug, Clone, Default)]
pub struct StagedHeaders {
    headers: HeaderMap,
}

impl StagedHeaders {
    /// Create an empty staging area.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether nothing has been staged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Staged headers as a map.
    #[must_use]
    pub const fn as_map(&self) -> &HeaderMap {
        &self.headers
    }

    /// Copy staged headers onto `response`, keeping values the response already set.
    pub fn apply_to(&self, response: &mut HeaderMap) {
        for (name, value) in &self.headers {
            if !response.contains_key(name) {
                response.insert(name.clone(), value.clone());
            }
        }
    }
}

impl HeaderSource for StagedHeaders {
    fn header(&self, name: &str) -> Option<Cow<'_, str>> {
        self.headers.header(name)
    }
}

impl HeaderSink for StagedHeaders {
    fn set_header(&mut self, name: &str, value: &str) -> CorrelationResult<()> {
        self.headers.set_header(name, value)
    }
}
