//! Axum extractor for the current correlation id.
//!
//! Handlers behind [`crate::CorrelationLayer`] can take `Correlation` as an
//! argument instead of calling [`crate::correlation_id`]. Requests reaching a
//! handler outside any correlation scope are rejected with `500`.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};

use crate::scope::correlation_id;

/// Correlation id of the request being handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correlation(pub String);

/// Rejection raised when no correlation scope is active.
#[derive(Debug, Clone, Copy, Default)]
pub struct MissingCorrelation;

impl IntoResponse for MissingCorrelation {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({
                "error": "MISSING_CORRELATION_SCOPE",
                "message": "handler is not running inside a correlation scope"
            })),
        )
            .into_response()
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Correlation {
    type Rejection = MissingCorrelation;

    async fn from_request_parts(_parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        correlation_id().map(Self).ok_or(MissingCorrelation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn extractor_reads_current_scope() {
        let (mut parts, ()) = axum::http::Request::new(()).into_parts();
        let extracted = crate::with_correlation_id("req-7", async {
            Correlation::from_request_parts(&mut parts, &()).await
        })
        .await;
        assert_eq!(extracted.ok(), Some(Correlation("req-7".to_string())));
    }

    #[tokio::test]
    async fn extractor_rejects_outside_scope() -> anyhow::Result<()> {
        let (mut parts, ()) = axum::http::Request::new(()).into_parts();
        let Err(rejection) = Correlation::from_request_parts(&mut parts, &()).await else {
            anyhow::bail!("expected rejection outside scope");
        };
        let response = rejection.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(response.into_body(), usize::MAX).await?;
        let payload: serde_json::Value = serde_json::from_slice(&body)?;
        assert_eq!(payload["error"], "MISSING_CORRELATION_SCOPE");
        Ok(())
    }
}
