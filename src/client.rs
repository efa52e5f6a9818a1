//! HTTP client abstraction for the outbound provider calls
//!
//! Both handlers make exactly one outbound request per invocation. Putting
//! that call behind a trait lets tests swap in a recording mock without any
//! network access.
use async_trait::async_trait;
use axum::response::IntoResponse;
use hyper_util::{client::legacy::Client, rt::TokioExecutor};
use std::time::Duration;

pub type HyperClient = Client<
    hyper_tls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>,
    axum::body::Body,
>;

#[async_trait]
pub trait HttpClient: std::fmt::Debug {
    async fn request(
        &self,
        req: axum::extract::Request,
    ) -> Result<axum::response::Response, Box<dyn std::error::Error + Send + Sync>>;
}

#[async_trait]
impl HttpClient for HyperClient {
    async fn request(
        &self,
        req: axum::extract::Request,
    ) -> Result<axum::response::Response, Box<dyn std::error::Error + Send + Sync>> {
        self.request(req)
            .await
            .map(|res| res.into_response())
            .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)
    }
}

/// Build the TLS-capable hyper client used in production. Both providers sit
/// behind a handful of hosts, so a small idle pool is plenty.
pub fn create_hyper_client() -> HyperClient {
    let https = hyper_tls::HttpsConnector::new();
    Client::builder(TokioExecutor::new())
        .pool_idle_timeout(Duration::from_secs(90))
        .pool_max_idle_per_host(10)
        .pool_timer(hyper_util::rt::TokioTimer::new())
        .build(https)
}
