//! Entry points that open correlation scopes, and the accessor that reads them.
//!
//! # Design
//! - Every scope starts from a fresh context whose `correlationId` entry is pinned,
//!   so the id cannot change once resolved.
//! - The wrapped callable is invoked inside the scope, so its synchronous prelude
//!   already sees the id; its output (including errors) is returned untouched.
//! - Each scope is also instrumented with a `correlation` span for log tagging.

use std::future::Future;

use corrid_context::{TaskContext, scope, scope_sync, with_current};
use corrid_telemetry::{CorrelationMetrics, correlation_span};
use tokio::task::futures::TaskLocalFuture;
use tracing::instrument::Instrumented;
use tracing::{Instrument, debug, warn};

use crate::config::CorrelationConfig;
use crate::headers::{HeaderSink, HeaderSource};
use crate::resolve::{Resolution, Resolver};

/// Context key holding the correlation id.
pub const CORRELATION_ID_KEY: &str = "correlationId";

pub(crate) const ENTRY_MIDDLEWARE: &str = "middleware";
const ENTRY_ATTACH: &str = "attach";

/// Future running inside a correlation scope.
pub type Correlated<F> = Instrumented<TaskLocalFuture<TaskContext, F>>;

/// Correlation id of the current scope, or `None` outside any scope.
#[must_use]
pub fn correlation_id() -> Option<String> {
    with_current(|context| context.get(CORRELATION_ID_KEY)).flatten()
}

/// Run `future` in a fresh scope carrying an already-decided id.
pub fn with_correlation_id<F>(id: impl Into<String>, future: F) -> Correlated<F>
where
    F: Future,
{
    let id = id.into();
    let span = correlation_span(&id);
    scope(TaskContext::pinned(CORRELATION_ID_KEY, id), future).instrument(span)
}

/// Run `handler` in a fresh scope using `correlation_id` when non-empty,
/// otherwise a random v4 UUID.
pub fn attach<H, Fut>(handler: H, correlation_id: Option<&str>) -> Correlated<Fut>
where
    H: FnOnce() -> Fut,
    Fut: Future,
{
    Correlator::default().attach(handler, correlation_id)
}

/// Resolves correlation ids and opens scopes around units of work.
#[derive(Clone, Default)]
pub struct Correlator {
    resolver: Resolver,
    metrics: Option<CorrelationMetrics>,
}

impl Correlator {
    /// Correlator applying `resolver`'s policy and generator.
    #[must_use]
    pub const fn new(resolver: Resolver) -> Self {
        Self {
            resolver,
            metrics: None,
        }
    }

    /// Correlator configured from `config`.
    #[must_use]
    pub fn from_config(config: &CorrelationConfig) -> Self {
        Self::new(Resolver::new(config.policy()))
    }

    /// Count resolutions and scopes on `metrics`.
    #[must_use]
    pub fn with_metrics(mut self, metrics: CorrelationMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Resolver used by this correlator.
    #[must_use]
    pub const fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Direct-attachment entry point.
    ///
    /// Uses `correlation_id` when it is present and non-empty, otherwise a
    /// freshly generated id.
    pub fn attach<H, Fut>(&self, handler: H, correlation_id: Option<&str>) -> Correlated<Fut>
    where
        H: FnOnce() -> Fut,
        Fut: Future,
    {
        let id = correlation_id
            .filter(|id| !id.is_empty())
            .map_or_else(|| self.resolver.generate_id(), str::to_string);
        self.enter(ENTRY_ATTACH, id, handler)
    }

    /// Middleware entry point over any header capability.
    ///
    /// Resolves the id against `request` and headers already staged on
    /// `response`, writes the chosen header onto `response`, then runs `next`
    /// inside the scope.
    pub fn correlate<R, S, N, Fut>(&self, request: &R, response: &mut S, next: N) -> Correlated<Fut>
    where
        R: HeaderSource + ?Sized,
        S: HeaderSource + HeaderSink + ?Sized,
        N: FnOnce() -> Fut,
        Fut: Future,
    {
        let resolution = self.stage(request, response);
        self.enter(ENTRY_MIDDLEWARE, resolution.id, next)
    }

    /// Resolve the id for `request` and stage its header on `response`.
    ///
    /// A header that cannot be written is logged and skipped; the id is still
    /// returned.
    pub fn stage<R, S>(&self, request: &R, response: &mut S) -> Resolution
    where
        R: HeaderSource + ?Sized,
        S: HeaderSource + HeaderSink + ?Sized,
    {
        let resolution = self.resolver.resolve(request, Some(&*response));
        if let Err(err) = response.set_header(resolution.header, &resolution.id) {
            warn!(
                error = %err,
                header = resolution.header,
                "failed to stage correlation header"
            );
        }
        if let Some(metrics) = &self.metrics {
            metrics.inc_resolution(resolution.source.as_str());
        }
        debug!(
            correlation_id = %resolution.id,
            header = resolution.header,
            source = %resolution.source,
            "resolved correlation id"
        );
        resolution
    }

    pub(crate) fn enter<N, Fut>(&self, entry: &'static str, id: String, next: N) -> Correlated<Fut>
    where
        N: FnOnce() -> Fut,
        Fut: Future,
    {
        if let Some(metrics) = &self.metrics {
            metrics.inc_scope(entry);
        }
        let span = correlation_span(&id);
        let context = TaskContext::pinned(CORRELATION_ID_KEY, id);
        let future = span.in_scope(|| scope_sync(context.clone(), next));
        scope(context, future).instrument(span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headers::{CORRELATION_ID, X_CORRELATION_ID};
    use crate::resolve::ResolutionPolicy;
    use corrid_test_support::assert::assert_uuid_v4;
    use corrid_test_support::fixtures::sequential_ids;
    use std::collections::HashMap;

    async fn g() -> Option<String> {
        tokio::task::yield_now().await;
        correlation_id()
    }

    async fn f() -> Vec<Option<String>> {
        let mut output = vec![correlation_id()];
        output.push(g().await);
        output
    }

    fn some(id: &str) -> Option<String> {
        Some(id.to_string())
    }

    #[test]
    fn accessor_is_empty_outside_scope() {
        assert_eq!(correlation_id(), None);
    }

    #[tokio::test]
    async fn attach_uses_supplied_id_across_awaits() {
        let output = attach(f, Some("epic-correlation-id")).await;
        assert_eq!(
            output,
            vec![some("epic-correlation-id"), some("epic-correlation-id")]
        );
        assert_eq!(correlation_id(), None);
    }

    #[tokio::test]
    async fn attach_without_id_generates_uuid_v4() {
        let output = attach(f, None).await;
        assert_eq!(output.len(), 2);
        let first = output[0].clone().unwrap_or_default();
        assert_uuid_v4(&first);
        assert_eq!(output[1].as_deref(), Some(first.as_str()));
    }

    #[tokio::test]
    async fn attach_treats_empty_id_as_missing() {
        let correlator =
            Correlator::new(Resolver::default().with_generator(sequential_ids("job")));
        let output = correlator.attach(f, Some("")).await;
        assert_eq!(output, vec![some("job-1"), some("job-1")]);
    }

    #[tokio::test]
    async fn concurrent_attachments_keep_their_own_ids() {
        let outputs = tokio::join!(
            attach(f, Some("1")),
            attach(f, Some("2")),
            attach(f, Some("3")),
        );
        assert_eq!(outputs.0, vec![some("1"), some("1")]);
        assert_eq!(outputs.1, vec![some("2"), some("2")]);
        assert_eq!(outputs.2, vec![some("3"), some("3")]);
    }

    #[tokio::test]
    async fn attach_propagates_handler_failure() {
        let result: Result<(), String> = attach(
            || async { Err(format!("failed in {}", correlation_id().unwrap_or_default())) },
            Some("job-9"),
        )
        .await;
        assert_eq!(result, Err("failed in job-9".to_string()));
    }

    #[tokio::test]
    async fn handler_prelude_runs_inside_scope() {
        let seen = attach(
            || {
                let prelude = correlation_id();
                async move { (prelude, correlation_id()) }
            },
            Some("sync-prelude"),
        )
        .await;
        assert_eq!(seen, (some("sync-prelude"), some("sync-prelude")));
    }

    #[tokio::test]
    async fn correlation_id_cannot_be_overwritten_inside_scope() {
        let rejected = with_correlation_id("fixed", async {
            let context = corrid_context::current().expect("inside scope");
            let rejected = context.set(CORRELATION_ID_KEY, "changed").is_err();
            (rejected, correlation_id())
        })
        .await;
        assert_eq!(rejected, (true, some("fixed")));
    }

    #[tokio::test]
    async fn nested_attachment_restores_outer_id() {
        let seen = attach(
            || async {
                let inner = attach(f, Some("inner")).await;
                (inner, correlation_id())
            },
            Some("outer"),
        )
        .await;
        assert_eq!(seen, (vec![some("inner"), some("inner")], some("outer")));
    }

    #[tokio::test]
    async fn correlate_adopts_request_header_and_stages_response() {
        let request = HashMap::from([(CORRELATION_ID.to_string(), "epic-correlation-id-1".to_string())]);
        let mut response = HashMap::new();
        let seen = Correlator::default()
            .correlate(&request, &mut response, || async { correlation_id() })
            .await;

        assert_eq!(seen, some("epic-correlation-id-1"));
        assert_eq!(response.header(CORRELATION_ID).as_deref(), Some("epic-correlation-id-1"));
        assert_eq!(response.header(X_CORRELATION_ID).as_deref(), None);
    }

    #[tokio::test]
    async fn correlate_generates_when_no_headers_present() {
        let request: HashMap<String, String> = HashMap::new();
        let mut response = HashMap::new();
        let seen = Correlator::default()
            .correlate(&request, &mut response, || async { correlation_id() })
            .await
            .unwrap_or_default();

        assert_uuid_v4(&seen);
        assert_eq!(response.header(X_CORRELATION_ID).as_deref(), Some(seen.as_str()));
    }

    #[tokio::test]
    async fn correlate_twice_reuses_staged_header() {
        let request: HashMap<String, String> = HashMap::new();
        let mut response = HashMap::new();
        let correlator =
            Correlator::new(Resolver::default().with_generator(sequential_ids("gen")));

        let first = correlator
            .correlate(&request, &mut response, || async { correlation_id() })
            .await;
        let second = correlator
            .correlate(&request, &mut response, || async { correlation_id() })
            .await;

        assert_eq!(first, some("gen-1"));
        assert_eq!(second, some("gen-1"));
        assert_eq!(response.header(X_CORRELATION_ID).as_deref(), Some("gen-1"));
    }

    #[tokio::test]
    async fn request_only_policy_regenerates_on_second_pass() {
        let request: HashMap<String, String> = HashMap::new();
        let mut response = HashMap::new();
        let correlator = Correlator::new(
            Resolver::new(ResolutionPolicy::request_only()).with_generator(sequential_ids("gen")),
        );

        correlator
            .correlate(&request, &mut response, || async {})
            .await;
        let second = correlator
            .correlate(&request, &mut response, || async { correlation_id() })
            .await;

        assert_eq!(second, some("gen-2"));
        assert_eq!(response.header(X_CORRELATION_ID).as_deref(), Some("gen-2"));
    }

    #[tokio::test]
    async fn metrics_count_resolutions_and_scopes() -> corrid_telemetry::Result<()> {
        let metrics = CorrelationMetrics::new()?;
        let correlator = Correlator::default().with_metrics(metrics.clone());
        let request = HashMap::from([(X_CORRELATION_ID.to_string(), "abc".to_string())]);
        let mut response = HashMap::new();

        correlator
            .correlate(&request, &mut response, || async {})
            .await;
        correlator.attach(|| async {}, Some("job")).await;

        assert_eq!(metrics.resolutions("request"), 1);
        assert_eq!(metrics.scopes("middleware"), 1);
        assert_eq!(metrics.scopes("attach"), 1);
        Ok(())
    }
}
