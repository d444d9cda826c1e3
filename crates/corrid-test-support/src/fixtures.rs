//! Deterministic identifier fixtures.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Generator closure yielding `"{prefix}-1"`, `"{prefix}-2"`, ... on each call.
#[must_use]
pub fn sequential_ids(prefix: &str) -> impl Fn() -> String + Send + Sync + use<> {
    let prefix = prefix.to_string();
    let counter = Arc::new(AtomicU64::new(0));
    move || {
        let next = counter.fetch_add(1, Ordering::Relaxed).saturating_add(1);
        format!("{prefix}-{next}")
    }
}

/// Generator closure that always yields `id`.
#[must_use]
pub fn fixed_id(id: &str) -> impl Fn() -> String + Send + Sync + use<> {
    let id = id.to_string();
    move || id.clone()
}
