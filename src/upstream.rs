//! Outbound request plumbing shared by both handlers.
use crate::AppState;
use crate::client::HttpClient;
use crate::error::ProxyError;
use anyhow::anyhow;
use axum::body::{Body, Bytes};
use axum::extract::Request;
use axum::http::{Method, StatusCode, Uri, header};
use serde_json::Value;
use tracing::debug;

/// Build the one outbound POST. `bearer_key` goes into the Authorization
/// header when the provider expects it there; providers that take the key in
/// the query string get it baked into `url` by the caller instead.
pub(crate) fn build_request(
    url: &str,
    bearer_key: Option<&str>,
    payload: &Value,
) -> Result<Request, ProxyError> {
    let uri: Uri = url
        .parse()
        .map_err(|e| anyhow!("invalid upstream url {url}: {e}"))?;

    // Set the host header to match the target server, some fronting CDNs
    // reject requests without it.
    let host = uri.host().map(|host| match uri.port_u16() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    });

    let body = serde_json::to_vec(payload).map_err(|e| anyhow!("serializing payload: {e}"))?;

    let mut builder = axum::http::Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(host) = host {
        builder = builder.header(header::HOST, host);
    }
    if let Some(key) = bearer_key {
        debug!("Adding authorization header for {url}");
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {key}"));
    }

    builder
        .body(Body::from(body))
        .map_err(|e| anyhow!("building upstream request: {e}").into())
}

/// Render a URI for error messages with the query string stripped. Query
/// strings can carry credentials (the TTS provider takes its key there), so
/// they must never reach a log line or an error body.
fn redacted(uri: &Uri) -> String {
    match (uri.scheme_str(), uri.authority()) {
        (Some(scheme), Some(authority)) => format!("{scheme}://{authority}{}", uri.path()),
        _ => uri.path().to_string(),
    }
}

/// Send the request and buffer the full response body. This is the single
/// suspend point of a handler invocation, bounded by the configured timeout.
pub(crate) async fn send<T: HttpClient>(
    state: &AppState<T>,
    req: Request,
) -> Result<(StatusCode, Bytes), ProxyError> {
    let url = redacted(req.uri());
    let response = tokio::time::timeout(
        state.config.upstream_timeout,
        state.http_client.request(req),
    )
    .await
    .map_err(|_| anyhow!("upstream request to {url} timed out"))?
    .map_err(|e| anyhow!("upstream request to {url} failed: {e}"))?;

    let (parts, body) = response.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .map_err(|e| anyhow!("reading upstream response body: {e}"))?;
    Ok((parts.status, bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redacted_strips_the_query_string() {
        let uri: Uri = "https://texttospeech.googleapis.com/v1/text:synthesize?key=secret"
            .parse()
            .unwrap();
        assert_eq!(
            redacted(&uri),
            "https://texttospeech.googleapis.com/v1/text:synthesize"
        );
    }

    #[test]
    fn test_redacted_keeps_plain_urls_intact() {
        let uri: Uri = "https://api.openai.com/v1/chat/completions".parse().unwrap();
        assert_eq!(redacted(&uri), "https://api.openai.com/v1/chat/completions");
    }
}
