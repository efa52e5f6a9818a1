//! The chat-completions proxy handler.
//!
//! Validates the client's `messages`, injects the server-held bearer key,
//! forwards one POST to the chat provider, and relays the provider's JSON
//! verbatim. The client never sees the key or raw provider errors.
use crate::AppState;
use crate::client::HttpClient;
use crate::coerce::{coerce_f64, coerce_u32};
use crate::error::ProxyError;
use crate::upstream;
use axum::extract::{Request, State};
use axum::http::{Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};
use tracing::{error, info, instrument};

pub(crate) const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub(crate) const DEFAULT_MAX_TOKENS: u32 = 400;
pub(crate) const DEFAULT_TEMPERATURE: f64 = 0.1;

#[instrument(skip(state, req))]
pub async fn chat_handler<T: HttpClient>(
    State(state): State<AppState<T>>,
    req: Request,
) -> Response {
    let expose = state.config.expose_errors;
    match proxy_chat(state, req).await {
        Ok(response) => response,
        Err(e) => e.into_response_with(expose),
    }
}

async fn proxy_chat<T: HttpClient>(
    state: AppState<T>,
    req: Request,
) -> Result<Response, ProxyError> {
    if req.method() == Method::OPTIONS {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    if req.method() != Method::POST {
        return Err(ProxyError::MethodNotAllowed);
    }

    let body_bytes = axum::body::to_bytes(req.into_body(), usize::MAX)
        .await
        .map_err(|_| ProxyError::BadRequest("Invalid request body"))?;
    let body: Value = serde_json::from_slice(&body_bytes)
        .map_err(|_| ProxyError::BadRequest("Invalid messages format"))?;

    // `messages` must be a non-empty array; everything inside it is forwarded
    // untouched.
    let messages = match body.get("messages") {
        Some(Value::Array(messages)) if !messages.is_empty() => messages,
        Some(Value::Array(_)) => return Err(ProxyError::BadRequest("messages must not be empty")),
        _ => return Err(ProxyError::BadRequest("Invalid messages format")),
    };
    info!("Proxying chat request with {} messages", messages.len());

    let key = state
        .config
        .chat_api_key
        .as_deref()
        .ok_or(ProxyError::MissingCredential("OPENAI_API_KEY"))?;

    let model = body
        .get("model")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_MODEL);
    let payload = json!({
        "model": model,
        "messages": messages,
        "max_tokens": coerce_u32(body.get("maxTokens"), DEFAULT_MAX_TOKENS),
        "temperature": coerce_f64(body.get("temperature"), DEFAULT_TEMPERATURE),
        "response_format": { "type": "json_object" },
    });

    let outbound = upstream::build_request(&state.config.chat_url, Some(key), &payload)?;
    let (status, bytes) = upstream::send(&state, outbound).await?;

    if !status.is_success() {
        let error_text = String::from_utf8_lossy(&bytes);
        error!(%status, "chat upstream error: {error_text}");
        let details = if status == StatusCode::UNAUTHORIZED {
            "invalid API key"
        } else {
            "service temporarily unavailable"
        };
        return Err(ProxyError::Upstream {
            status,
            error: "AI service failed",
            details,
        });
    }

    // Check it parses, then return the original bytes so the caller gets the
    // provider's JSON byte-for-byte.
    serde_json::from_slice::<Value>(&bytes)
        .map_err(|e| anyhow::anyhow!("chat upstream returned invalid JSON: {e}"))?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        bytes,
    )
        .into_response())
}
