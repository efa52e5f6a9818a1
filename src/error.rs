//! Error taxonomy for the proxy handlers.
//!
//! Every failure terminates the invocation with exactly one response. Client
//! bodies stay generic; the real cause (missing env var, upstream error text,
//! network failure) is logged server-side and never forwarded.
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// The client sent a missing or malformed field. Nothing was forwarded.
    #[error("{0}")]
    BadRequest(&'static str),

    #[error("method not allowed")]
    MethodNotAllowed,

    /// The named credential was not configured. The name is logged, never
    /// returned to the client.
    #[error("credential not configured: {0}")]
    MissingCredential(&'static str),

    /// The provider answered with a non-2xx status. The status is mirrored to
    /// the client along with a coarse classification in `details`.
    #[error("upstream returned {status}")]
    Upstream {
        status: StatusCode,
        error: &'static str,
        details: &'static str,
    },

    /// The provider answered 2xx but the body is missing a field the caller
    /// depends on.
    #[error("{0}")]
    InvalidUpstreamResponse(&'static str),

    /// Network failures, timeouts, unparseable upstream bodies.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// The client-facing error shape: `{"error": "...", "details": "..."}`.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl ProxyError {
    /// Render the client-facing response. `expose` widens 500 bodies with the
    /// underlying error message and must stay off in production.
    pub fn into_response_with(self, expose: bool) -> Response {
        let (status, body) = match self {
            ProxyError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: message.into(),
                    details: None,
                },
            ),
            ProxyError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                ErrorBody {
                    error: "Method not allowed".into(),
                    details: None,
                },
            ),
            ProxyError::MissingCredential(var) => {
                error!("credential not configured: {var}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        error: "Service is not configured".into(),
                        details: None,
                    },
                )
            }
            ProxyError::Upstream {
                status,
                error,
                details,
            } => (
                status,
                ErrorBody {
                    error: error.into(),
                    details: Some(details.into()),
                },
            ),
            ProxyError::InvalidUpstreamResponse(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    error: message.into(),
                    details: None,
                },
            ),
            ProxyError::Internal(e) => {
                error!("internal proxy error: {e:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        error: "Internal server error".into(),
                        details: expose.then(|| format!("{e:#}")),
                    },
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_missing_credential_body_never_names_the_variable() {
        let response = ProxyError::MissingCredential("OPENAI_API_KEY").into_response_with(true);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert!(!body.to_string().contains("OPENAI_API_KEY"));
        assert_eq!(body["error"], "Service is not configured");
    }

    #[tokio::test]
    async fn test_internal_detail_only_exposed_when_enabled() {
        let response =
            ProxyError::Internal(anyhow!("connection refused")).into_response_with(false);
        let body = body_json(response).await;
        assert!(body.get("details").is_none());

        let response = ProxyError::Internal(anyhow!("connection refused")).into_response_with(true);
        let body = body_json(response).await;
        assert_eq!(body["details"], "connection refused");
    }

    #[tokio::test]
    async fn test_upstream_error_mirrors_status_and_classification() {
        let response = ProxyError::Upstream {
            status: StatusCode::UNAUTHORIZED,
            error: "AI service failed",
            details: "invalid API key",
        }
        .into_response_with(false);
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["error"], "AI service failed");
        assert_eq!(body["details"], "invalid API key");
    }
}
