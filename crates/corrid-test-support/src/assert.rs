//! Assertions for generated identifier formats.

use once_cell::sync::Lazy;
use regex::Regex;

static UUID_V4: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-4[0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}$")
        .unwrap_or_else(|err| panic!("uuid v4 pattern must compile: {err}"))
});

/// Whether `value` is a textual random (version 4) UUID.
#[must_use]
pub fn is_uuid_v4(value: &str) -> bool {
    UUID_V4.is_match(value)
}

/// Panic unless `value` is a textual random (version 4) UUID.
///
/// # Panics
///
/// Panics when `value` does not match the UUID v4 layout.
pub fn assert_uuid_v4(value: &str) {
    assert!(is_uuid_v4(value), "expected a v4 uuid, got {value:?}");
}
