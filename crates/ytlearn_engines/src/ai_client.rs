#![forbid(unsafe_code)]

use std::env;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::{json, Value};
use tracing::debug;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const PDF_MIME: &str = "application/pdf";
const YOUTUBE_MIME: &str = "video/*";
const ERROR_MESSAGE_MAX_CHARS: usize = 300;

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("no API key configured for the generative model")]
    MissingApiKey,
    #[error("invalid client configuration: {0}")]
    Config(String),
    #[error("model API returned HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("model API unreachable ({kind})")]
    Transport { kind: &'static str },
    #[error("model API response is malformed: {0}")]
    InvalidResponse(String),
    #[error("model API returned no text")]
    EmptyResponse,
}

/// The single optional attachment of a generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaInput<'a> {
    None,
    Video { url: &'a str },
    Pdf { bytes: &'a [u8] },
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub model: String,
    pub temperature: f64,
    pub max_output_tokens: u32,
}

/// One prompt plus at most one media attachment in, raw text out. A single
/// attempt per call, no retry.
pub trait GenerativeClient {
    fn generate(
        &self,
        prompt: &str,
        media: &MediaInput<'_>,
        params: &GenerationParams,
    ) -> Result<String, AiError>;
}

impl<C: GenerativeClient + ?Sized> GenerativeClient for &C {
    fn generate(
        &self,
        prompt: &str,
        media: &MediaInput<'_>,
        params: &GenerationParams,
    ) -> Result<String, AiError> {
        (**self).generate(prompt, media, params)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyMode {
    Off,
    Env,
    Explicit,
}

impl ProxyMode {
    fn from_env_value(raw: Option<String>) -> Self {
        match raw
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("off") => Self::Off,
            Some("explicit") => Self::Explicit,
            _ => Self::Env,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    pub mode: ProxyMode,
    pub url: Option<String>,
}

impl ProxyConfig {
    pub fn from_env() -> Self {
        Self {
            mode: ProxyMode::from_env_value(env::var("YTLEARN_PROXY_MODE").ok()),
            url: env::var("YTLEARN_PROXY_URL").ok(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub user_agent: String,
    /// `None` leaves reads unbounded.
    pub timeout_ms: Option<u32>,
    pub proxy: ProxyConfig,
    /// Canned `generateContent` response used instead of the network.
    pub response_fixture_json: Option<String>,
}

impl GeminiConfig {
    pub fn mvp_v1() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            user_agent: default_user_agent(),
            timeout_ms: None,
            proxy: ProxyConfig {
                mode: ProxyMode::Env,
                url: None,
            },
            response_fixture_json: None,
        }
    }

    pub fn from_env() -> Self {
        Self {
            api_key: env::var("GEMINI_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            base_url: env::var("YTLEARN_GEMINI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_GEMINI_BASE_URL.to_string()),
            user_agent: env::var("YTLEARN_HTTP_USER_AGENT")
                .unwrap_or_else(|_| default_user_agent()),
            timeout_ms: env::var("YTLEARN_HTTP_TIMEOUT_MS")
                .ok()
                .and_then(|raw| raw.trim().parse::<u32>().ok()),
            proxy: ProxyConfig::from_env(),
            response_fixture_json: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

fn default_user_agent() -> String {
    format!("ytlearn/{}", env!("CARGO_PKG_VERSION"))
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    fn call(&self, payload: Value, model: &str) -> Result<Value, AiError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(AiError::MissingApiKey)?;
        let agent = build_http_agent(&self.config)?;
        let endpoint = generate_endpoint(&self.config.base_url, model);
        debug!(model, "calling generateContent");
        let response = agent
            .post(&endpoint)
            .set("Content-Type", "application/json")
            .set("Accept", "application/json")
            .set("x-goog-api-key", api_key)
            .send_json(payload)
            .map_err(ai_error_from_ureq)?;
        serde_json::from_reader(response.into_reader())
            .map_err(|err| AiError::InvalidResponse(err.to_string()))
    }
}

impl GenerativeClient for GeminiClient {
    fn generate(
        &self,
        prompt: &str,
        media: &MediaInput<'_>,
        params: &GenerationParams,
    ) -> Result<String, AiError> {
        let body = match self.config.response_fixture_json.as_deref() {
            Some(fixture) => serde_json::from_str(fixture)
                .map_err(|err| AiError::InvalidResponse(err.to_string()))?,
            None => self.call(build_request_body(prompt, media, params), &params.model)?,
        };
        extract_response_text(&body)
    }
}

pub fn generate_endpoint(base_url: &str, model: &str) -> String {
    format!(
        "{}/v1beta/models/{}:generateContent",
        base_url.trim_end_matches('/'),
        model.trim()
    )
}

pub fn encode_pdf(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}

/// Media part first, prompt text last.
pub fn build_request_body(prompt: &str, media: &MediaInput<'_>, params: &GenerationParams) -> Value {
    let mut parts = Vec::with_capacity(2);
    match media {
        MediaInput::None => {}
        MediaInput::Video { url } => parts.push(json!({
            "fileData": {"fileUri": url, "mimeType": YOUTUBE_MIME}
        })),
        MediaInput::Pdf { bytes } => parts.push(json!({
            "inlineData": {"mimeType": PDF_MIME, "data": encode_pdf(bytes)}
        })),
    }
    parts.push(json!({ "text": prompt }));
    json!({
        "contents": [{"role": "user", "parts": parts}],
        "generationConfig": {
            "temperature": params.temperature,
            "maxOutputTokens": params.max_output_tokens,
        },
    })
}

/// Concatenated text parts of the first candidate.
pub fn extract_response_text(body: &Value) -> Result<String, AiError> {
    let Some(candidate) = body
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|candidates| candidates.first())
    else {
        if let Some(reason) = body
            .pointer("/promptFeedback/blockReason")
            .and_then(Value::as_str)
        {
            return Err(AiError::InvalidResponse(format!("prompt blocked: {reason}")));
        }
        return Err(AiError::InvalidResponse("no candidates".to_string()));
    };
    let text: String = candidate
        .pointer("/content/parts")
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();
    if text.trim().is_empty() {
        return Err(AiError::EmptyResponse);
    }
    Ok(text)
}

fn build_http_agent(config: &GeminiConfig) -> Result<ureq::Agent, AiError> {
    let mut builder = ureq::AgentBuilder::new()
        .user_agent(&config.user_agent)
        .try_proxy_from_env(config.proxy.mode == ProxyMode::Env);
    if let Some(timeout_ms) = config.timeout_ms {
        if timeout_ms == 0 {
            return Err(AiError::Config("timeout must be > 0".to_string()));
        }
        let timeout = Duration::from_millis(u64::from(timeout_ms));
        builder = builder
            .timeout_connect(timeout)
            .timeout_read(timeout)
            .timeout_write(timeout);
    }
    if config.proxy.mode == ProxyMode::Explicit {
        let url = config
            .proxy
            .url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| AiError::Config("explicit proxy mode needs a proxy url".to_string()))?;
        let proxy = ureq::Proxy::new(url)
            .map_err(|_| AiError::Config("invalid proxy url".to_string()))?;
        builder = builder.proxy(proxy);
    }
    Ok(builder.build())
}

fn ai_error_from_ureq(err: ureq::Error) -> AiError {
    match err {
        ureq::Error::Status(status, response) => {
            let raw = response.into_string().unwrap_or_default();
            AiError::Http {
                status,
                message: api_error_message(&raw),
            }
        }
        ureq::Error::Transport(transport) => {
            let combined = format!("{:?} {}", transport.kind(), transport);
            AiError::Transport {
                kind: classify_transport_error_kind(&combined),
            }
        }
    }
}

fn api_error_message(raw: &str) -> String {
    let message = serde_json::from_str::<Value>(raw)
        .ok()
        .and_then(|body| {
            body.pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| raw.trim().to_string());
    message.chars().take(ERROR_MESSAGE_MAX_CHARS).collect()
}

fn classify_transport_error_kind(raw: &str) -> &'static str {
    let lower = raw.to_ascii_lowercase();
    if lower.contains("timeout") || lower.contains("timed out") {
        "timeout"
    } else if lower.contains("tls") || lower.contains("ssl") {
        "tls"
    } else if lower.contains("dns") {
        "dns"
    } else if lower.contains("connection") || lower.contains("connect") {
        "connection"
    } else {
        "transport"
    }
}
