//! Voxgate - a credential-injecting proxy for AI providers
//!
//! This library provides two stateless proxy handlers: one forwarding chat
//! requests to an OpenAI-compatible chat-completions endpoint, one forwarding
//! text-to-speech requests to a Google-style synthesis endpoint. Both validate
//! a small set of client fields, attach a server-held API key, make exactly
//! one outbound call, and relay the upstream response (or a classified,
//! generic error) back to the caller.

use axum::Router;
use axum::extract::Request;
use axum::http::{HeaderValue, header};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::any;
use bon::Builder;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

pub mod chat;
pub mod client;
pub mod coerce;
pub mod error;
pub mod tts;
pub mod upstream;
pub mod voices;

use client::{HttpClient, HyperClient};

/// Default chat-completions endpoint.
pub const DEFAULT_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Default speech-synthesis endpoint. The API key is appended as a `key`
/// query parameter per the provider's convention.
pub const DEFAULT_TTS_URL: &str = "https://texttospeech.googleapis.com/v1/text:synthesize";

/// Immutable per-process configuration shared by both handlers.
///
/// Credentials are injected here at construction time rather than read from
/// the environment inside the handlers, so tests can substitute their own
/// without touching process state.
#[derive(Debug, Clone, Builder)]
pub struct ProxyConfig {
    /// Bearer key for the chat-completions provider.
    pub chat_api_key: Option<String>,
    /// Key for the speech-synthesis provider.
    pub tts_api_key: Option<String>,
    #[builder(default = DEFAULT_CHAT_URL.to_string())]
    pub chat_url: String,
    #[builder(default = DEFAULT_TTS_URL.to_string())]
    pub tts_url: String,
    /// How long to wait for an upstream response before failing the request.
    #[builder(default = Duration::from_secs(30))]
    pub upstream_timeout: Duration,
    /// Include internal error detail in 500 bodies. Must stay off in
    /// production; upstream error text is only ever logged.
    #[builder(default = false)]
    pub expose_errors: bool,
}

/// The main application state containing the HTTP client and proxy configuration
#[derive(Clone, Debug)]
pub struct AppState<T: HttpClient> {
    pub http_client: T,
    pub config: Arc<ProxyConfig>,
}

impl AppState<HyperClient> {
    /// Create a new AppState with the default Hyper client
    pub fn new(config: ProxyConfig) -> Self {
        let http_client = client::create_hyper_client();
        Self {
            http_client,
            config: Arc::new(config),
        }
    }
}

impl<T: HttpClient> AppState<T> {
    /// Create a new AppState with a custom HTTP client (useful for testing)
    pub fn with_client(config: ProxyConfig, http_client: T) -> Self {
        Self {
            http_client,
            config: Arc::new(config),
        }
    }
}

/// Build the main router for the proxy
///
/// Routes are registered with `any` so the handlers themselves own the method
/// guard: `OPTIONS` gets a 204 preflight response, anything other than `POST`
/// gets a 405. Every response carries permissive cross-origin headers.
#[instrument(skip(state))]
pub fn build_router<T: HttpClient + Clone + Send + Sync + 'static>(state: AppState<T>) -> Router {
    info!("Building router");
    Router::new()
        .route("/api/chat", any(chat::chat_handler))
        .route("/api/tts", any(tts::tts_handler))
        .layer(middleware::from_fn(cors))
        .with_state(state)
}

/// Attach permissive cross-origin headers to every response, errors included.
/// TODO(voxgate): restrict the allowed origin once the client origin is fixed.
async fn cors(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("content-type"),
    );
    response
}

/// Test support: a recording mock for the outbound HTTP client, used by the
/// in-crate tests and the integration suite.
pub mod test_utils {
    use super::*;
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use std::sync::{Arc, Mutex};

    pub struct MockHttpClient {
        pub requests: Arc<Mutex<Vec<MockRequest>>>,
        response_builder: Arc<dyn Fn() -> axum::response::Response + Send + Sync>,
    }

    #[derive(Debug, Clone)]
    pub struct MockRequest {
        pub method: String,
        pub uri: String,
        pub headers: Vec<(String, String)>,
        pub body: Vec<u8>,
    }

    impl MockRequest {
        pub fn header(&self, name: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str())
        }

        pub fn json_body(&self) -> serde_json::Value {
            serde_json::from_slice(&self.body).unwrap()
        }
    }

    impl MockHttpClient {
        pub fn new(status: StatusCode, body: &str) -> Self {
            let body = body.to_string();
            Self {
                requests: Arc::new(Mutex::new(Vec::new())),
                response_builder: Arc::new(move || {
                    axum::response::Response::builder()
                        .status(status)
                        .body(axum::body::Body::from(body.clone()))
                        .unwrap()
                }),
            }
        }

        pub fn get_requests(&self) -> Vec<MockRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl std::fmt::Debug for MockHttpClient {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("MockHttpClient")
                .field("requests", &self.requests)
                .field("response_builder", &"<closure>")
                .finish()
        }
    }

    impl Clone for MockHttpClient {
        fn clone(&self) -> Self {
            Self {
                requests: Arc::clone(&self.requests),
                response_builder: Arc::clone(&self.response_builder),
            }
        }
    }

    #[async_trait]
    impl HttpClient for MockHttpClient {
        async fn request(
            &self,
            req: axum::extract::Request,
        ) -> Result<axum::response::Response, Box<dyn std::error::Error + Send + Sync>> {
            let method = req.method().to_string();
            let uri = req.uri().to_string();
            let headers = req
                .headers()
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
                .collect();

            let body = axum::body::to_bytes(req.into_body(), usize::MAX)
                .await
                .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)?
                .to_vec();

            self.requests.lock().unwrap().push(MockRequest {
                method,
                uri,
                headers,
                body,
            });

            Ok((self.response_builder)())
        }
    }
}
