//! Tower middleware opening a correlation scope per request.
//!
//! # Design
//! - Resolves against request headers plus any `StagedHeaders` an outer pass left
//!   in the request extensions, so stacking the layer reuses the first id.
//! - The inner service is called inside the scope; its response receives the
//!   staged headers unless the handler already set them.
//! - Inner errors pass through unchanged.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context as TaskContext, Poll};

use corrid_telemetry::record_correlation_id;
use http::{Request, Response};
use tower::{Layer, Service};
use tracing::Span;

use crate::config::CorrelationConfig;
use crate::headers::StagedHeaders;
use crate::scope::{Correlator, ENTRY_MIDDLEWARE};

/// Layer wrapping services with [`CorrelationService`].
#[derive(Clone, Default)]
pub struct CorrelationLayer {
    correlator: Correlator,
}

impl CorrelationLayer {
    /// Layer resolving ids with `correlator`.
    #[must_use]
    pub const fn new(correlator: Correlator) -> Self {
        Self { correlator }
    }

    /// Layer configured from `config`.
    #[must_use]
    pub fn from_config(config: &CorrelationConfig) -> Self {
        Self::new(Correlator::from_config(config))
    }
}

impl<S> Layer<S> for CorrelationLayer {
    type Service = CorrelationService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CorrelationService {
            inner,
            correlator: self.correlator.clone(),
        }
    }
}

/// Service running each request inside its own correlation scope.
#[derive(Clone)]
pub struct CorrelationService<S> {
    inner: S,
    correlator: Correlator,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for CorrelationService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send,
    ReqBody: Send + 'static,
    ResBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let mut staged = req
            .extensions_mut()
            .remove::<StagedHeaders>()
            .unwrap_or_default();
        let resolution = self.correlator.stage(req.headers(), &mut staged);
        record_correlation_id(&Span::current(), &resolution.id);
        req.extensions_mut().insert(staged.clone());

        let inner = &mut self.inner;
        let fut = self
            .correlator
            .enter(ENTRY_MIDDLEWARE, resolution.id, || inner.call(req));

        Box::pin(async move {
            let mut response = fut.await?;
            staged.apply_to(response.headers_mut());
            Ok(response)
        })
    }
}
