//! Configuration parsing for the proxy server
//!
//! Command-line arguments with environment fallbacks via clap. API keys come
//! from the environment in deployment; the values land in an immutable
//! `ProxyConfig` handed to the handlers at construction time.
use clap::Parser;
use std::time::Duration;
use voxgate::{DEFAULT_CHAT_URL, DEFAULT_TTS_URL, ProxyConfig};

#[derive(Debug, Clone, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// The port on which the proxy server will listen.
    #[arg(short = 'p', long, default_value_t = 3000)]
    pub port: u16,

    /// Bearer key for the chat-completions provider.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub chat_api_key: Option<String>,

    /// API key for the speech-synthesis provider.
    #[arg(long, env = "GOOGLE_TTS_API_KEY", hide_env_values = true)]
    pub tts_api_key: Option<String>,

    /// Chat-completions endpoint requests are forwarded to.
    #[arg(long, default_value = DEFAULT_CHAT_URL)]
    pub chat_url: String,

    /// Speech-synthesis endpoint requests are forwarded to.
    #[arg(long, default_value = DEFAULT_TTS_URL)]
    pub tts_url: String,

    /// Seconds to wait for an upstream response before failing the request.
    #[arg(long, default_value_t = 30)]
    pub upstream_timeout_secs: u64,

    /// Include internal error detail in 500 responses. Never enable in
    /// production.
    #[arg(long, env = "VOXGATE_EXPOSE_ERRORS", default_value_t = false)]
    pub expose_errors: bool,
}

impl Config {
    pub fn proxy_config(&self) -> ProxyConfig {
        ProxyConfig::builder()
            .maybe_chat_api_key(self.chat_api_key.clone())
            .maybe_tts_api_key(self.tts_api_key.clone())
            .chat_url(self.chat_url.clone())
            .tts_url(self.tts_url.clone())
            .upstream_timeout(Duration::from_secs(self.upstream_timeout_secs))
            .expose_errors(self.expose_errors)
            .build()
    }
}
