//! Correlation-aware tracing spans.
//!
//! # Design
//! - Spans declare `correlation_id` up front so it can be recorded once resolved.
//! - `CorrelationMakeSpan` plugs into `tower_http::trace::TraceLayer`.

use http::Request;
use tower_http::trace::MakeSpan;
use tracing::Span;

/// Span field carrying the correlation identifier.
pub const CORRELATION_FIELD: &str = "correlation_id";

/// Create a span tagging all nested events with `id`.
#[must_use]
pub fn correlation_span(id: &str) -> Span {
    tracing::info_span!("correlation", correlation_id = %id)
}

/// Record `id` on a span declared with an empty `correlation_id` field.
///
/// Spans without the field are left untouched.
pub fn record_correlation_id(span: &Span, id: &str) {
    span.record(CORRELATION_FIELD, tracing::field::display(id));
}

/// `MakeSpan` for HTTP traces that reserves the `correlation_id` field.
#[derive(Debug, Clone, Copy, Default)]
pub struct CorrelationMakeSpan;

impl<B> MakeSpan<B> for CorrelationMakeSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            correlation_id = tracing::field::Empty
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_correlation_id_accepts_declared_field() {
        let span = tracing::info_span!("request", correlation_id = tracing::field::Empty);
        record_correlation_id(&span, "req-1");
    }

    #[test]
    fn make_span_builds_for_any_body() {
        let request = Request::builder()
            .uri("/orders")
            .body(())
            .unwrap_or_else(|_| Request::new(()));
        let span = CorrelationMakeSpan.make_span(&request);
        record_correlation_id(&span, "req-2");
        let _entered = correlation_span("req-3").entered();
    }
}
