//! The text-to-speech proxy handler.
//!
//! Symmetric to the chat handler, with the provider quirks that come with a
//! Google-style synthesis endpoint: the API key travels in the query string
//! rather than a header, and a 2xx response is only trusted if it actually
//! carries the base64 audio payload.
use crate::AppState;
use crate::client::HttpClient;
use crate::coerce::coerce_f64;
use crate::error::ProxyError;
use crate::{upstream, voices};
use axum::extract::{Request, State};
use axum::http::{Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};
use tracing::{error, info, instrument};
use url::Url;

/// Longest text the proxy will forward, in characters.
pub(crate) const MAX_TEXT_CHARS: usize = 5000;
pub(crate) const DEFAULT_SPEAKING_RATE: f64 = 0.85;
pub(crate) const DEFAULT_PITCH: f64 = 0.0;
pub(crate) const DEFAULT_VOLUME_GAIN_DB: f64 = 0.0;

#[instrument(skip(state, req))]
pub async fn tts_handler<T: HttpClient>(
    State(state): State<AppState<T>>,
    req: Request,
) -> Response {
    let expose = state.config.expose_errors;
    match proxy_tts(state, req).await {
        Ok(response) => response,
        Err(e) => e.into_response_with(expose),
    }
}

async fn proxy_tts<T: HttpClient>(
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
        .map_err(|_| ProxyError::BadRequest("Missing text or languageCode"))?;

    let text = body
        .get("text")
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
        .ok_or(ProxyError::BadRequest("Missing text or languageCode"))?;
    let language_code = body
        .get("languageCode")
        .and_then(Value::as_str)
        .filter(|code| !code.is_empty())
        .ok_or(ProxyError::BadRequest("Missing text or languageCode"))?;
    if text.chars().count() > MAX_TEXT_CHARS {
        return Err(ProxyError::BadRequest("Text too long"));
    }

    // Any language code is forwarded as-is; only the default voice lookup
    // cares whether we know it.
    let voice_name = match body.get("voiceName").and_then(Value::as_str) {
        Some(name) if !name.is_empty() => name,
        _ => voices::default_voice(language_code),
    };
    info!(language_code, voice_name, "Proxying synthesis request");

    let key = state
        .config
        .tts_api_key
        .as_deref()
        .ok_or(ProxyError::MissingCredential("GOOGLE_TTS_API_KEY"))?;

    let payload = json!({
        "input": { "text": text },
        "voice": {
            "languageCode": language_code,
            "name": voice_name,
        },
        "audioConfig": {
            "audioEncoding": "MP3",
            "speakingRate": coerce_f64(body.get("speakingRate"), DEFAULT_SPEAKING_RATE),
            "pitch": coerce_f64(body.get("pitch"), DEFAULT_PITCH),
            "volumeGainDb": coerce_f64(body.get("volumeGainDb"), DEFAULT_VOLUME_GAIN_DB),
            "effectsProfileId": ["headphone-class-device"],
        },
    });

    // This provider takes the key as a query parameter, not a header.
    let mut url = Url::parse(&state.config.tts_url)
        .map_err(|e| anyhow::anyhow!("invalid tts url {}: {e}", state.config.tts_url))?;
    url.query_pairs_mut().append_pair("key", key);

    let outbound = upstream::build_request(url.as_str(), None, &payload)?;
    let (status, bytes) = upstream::send(&state, outbound).await?;

    if !status.is_success() {
        let error_text = String::from_utf8_lossy(&bytes);
        error!(%status, "tts upstream error: {error_text}");
        let details = if status == StatusCode::FORBIDDEN {
            "API key restrictions or quota exceeded"
        } else {
            "service temporarily unavailable"
        };
        return Err(ProxyError::Upstream {
            status,
            error: "TTS service failed",
            details,
        });
    }

    // A 2xx without the audio payload is a provider contract violation, not a
    // success to forward.
    let parsed: Value = serde_json::from_slice(&bytes)
        .map_err(|e| anyhow::anyhow!("tts upstream returned invalid JSON: {e}"))?;
    match parsed.get("audioContent").and_then(Value::as_str) {
        Some(audio) if !audio.is_empty() => {}
        _ => {
            error!("tts upstream 2xx without audioContent");
            return Err(ProxyError::InvalidUpstreamResponse(
                "Invalid response from TTS service",
            ));
        }
    }

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        bytes,
    )
        .into_response())
}
