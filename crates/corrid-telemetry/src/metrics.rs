//! Prometheus-backed counters for correlation resolution.
//!
//! # Design
//! - Encapsulates collector registration to keep the public API small.
//! - Counts resolutions by source and scopes by entry point.

use std::sync::Arc;

use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};
use serde::Serialize;

use crate::error::{Result, TelemetryError};

const RESOLUTIONS_TOTAL: &str = "correlation_resolutions_total";
const SCOPES_TOTAL: &str = "correlation_scopes_total";

/// Prometheus registry for correlation counters.
#[derive(Clone)]
pub struct CorrelationMetrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    registry: Registry,
    resolutions_total: IntCounterVec,
    scopes_total: IntCounterVec,
}

/// Point-in-time view of the correlation counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// Ids reused from a header already staged on the response.
    pub reused: u64,
    /// Ids adopted from an inbound request header.
    pub adopted: u64,
    /// Ids freshly generated.
    pub generated: u64,
}

impl CorrelationMetrics {
    /// Construct a registry with the correlation collectors registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any collector cannot be built or registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let resolutions_total = IntCounterVec::new(
            Opts::new(
                RESOLUTIONS_TOTAL,
                "Correlation ids resolved, labelled by where the id came from",
            ),
            &["source"],
        )
        .map_err(|source| TelemetryError::MetricsCollector {
            name: RESOLUTIONS_TOTAL,
            source,
        })?;
        let scopes_total = IntCounterVec::new(
            Opts::new(SCOPES_TOTAL, "Correlation scopes opened by entry point"),
            &["entry"],
        )
        .map_err(|source| TelemetryError::MetricsCollector {
            name: SCOPES_TOTAL,
            source,
        })?;

        registry
            .register(Box::new(resolutions_total.clone()))
            .map_err(|source| TelemetryError::MetricsRegister {
                name: RESOLUTIONS_TOTAL,
                source,
            })?;
        registry
            .register(Box::new(scopes_total.clone()))
            .map_err(|source| TelemetryError::MetricsRegister {
                name: SCOPES_TOTAL,
                source,
            })?;

        Ok(Self {
            inner: Arc::new(MetricsInner {
                registry,
                resolutions_total,
                scopes_total,
            }),
        })
    }

    /// Count one resolution from the given source label.
    pub fn inc_resolution(&self, source: &str) {
        self.inner
            .resolutions_total
            .with_label_values(&[source])
            .inc();
    }

    /// Count one scope opened by the given entry point label.
    pub fn inc_scope(&self, entry: &str) {
        self.inner.scopes_total.with_label_values(&[entry]).inc();
    }

    /// Current resolution count for a source label.
    #[must_use]
    pub fn resolutions(&self, source: &str) -> u64 {
        self.inner
            .resolutions_total
            .with_label_values(&[source])
            .get()
    }

    /// Current scope count for an entry point label.
    #[must_use]
    pub fn scopes(&self, entry: &str) -> u64 {
        self.inner.scopes_total.with_label_values(&[entry]).get()
    }

    /// Take a snapshot of the resolution counters.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            reused: self.resolutions("staged_response"),
            adopted: self.resolutions("request"),
            generated: self.resolutions("generated"),
        }
    }

    /// Render the registry using the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics cannot be encoded or if the encoded
    /// buffer is not valid UTF-8.
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|source| TelemetryError::MetricsEncode { source })?;
        String::from_utf8(buffer).map_err(|source| TelemetryError::MetricsUtf8 { source })
    }
}
