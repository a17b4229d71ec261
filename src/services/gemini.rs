use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::Settings;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoPart {
    pub uri: String,
    pub mime_type: String,
}

#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub videos: Vec<VideoPart>,
    pub prompt: String,
    pub response_schema: Value,
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("GEMINI_API_KEY is not set")]
    MissingCredential,

    #[error("request failed: {0}")]
    Transport(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("empty response from model: {0}")]
    EmptyResponse(String),
}

/// A multimodal model that answers with JSON text.
pub trait GenerateContent {
    fn generate(&self, req: &GenerateRequest) -> Result<String, ServiceError>;
}

pub struct GeminiClient {
    http: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(settings: &Settings) -> Result<Self, ServiceError> {
        let http = Client::builder()
            .build()
            .map_err(|e| ServiceError::Transport(error_chain(&e)))?;

        Ok(Self {
            http,
            api_key: settings.api_key.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

impl GenerateContent for GeminiClient {
    fn generate(&self, req: &GenerateRequest) -> Result<String, ServiceError> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ServiceError::MissingCredential)?;

        let resp = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&request_body(req))
            .send()
            .map_err(|e| ServiceError::Transport(error_chain(&e)))?;

        let status = resp.status();

        // Read as text first so error bodies survive a failed JSON parse.
        let text = resp
            .text()
            .map_err(|e| ServiceError::Transport(error_chain(&e)))?;

        if !status.is_success() {
            return Err(ServiceError::Http {
                status: status.as_u16(),
                message: extract_error_message(status, &text),
            });
        }

        let v: Value = serde_json::from_str(&text)
            .map_err(|_| ServiceError::EmptyResponse("invalid JSON envelope".into()))?;

        response_text(&v)
    }
}

/// reqwest's top-level message omits the cause (refused, DNS, TLS, timeout).
fn error_chain(e: &dyn std::error::Error) -> String {
    let mut msg = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !msg.contains(&text) {
            msg.push_str(": ");
            msg.push_str(&text);
        }
        source = cause.source();
    }
    msg
}

fn request_body(req: &GenerateRequest) -> Value {
    let mut parts: Vec<Value> = req
        .videos
        .iter()
        .map(|v| {
            json!({
                "fileData": { "mimeType": v.mime_type, "fileUri": v.uri }
            })
        })
        .collect();

    parts.push(json!({ "text": req.prompt }));

    json!({
        "contents": [ { "role": "user", "parts": parts } ],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": req.response_schema
        }
    })
}

fn response_text(v: &Value) -> Result<String, ServiceError> {
    let candidate = v.get("candidates").and_then(|c| c.get(0));

    let text: String = candidate
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
                .collect()
        })
        .unwrap_or_default();

    if !text.trim().is_empty() {
        return Ok(text);
    }

    let reason = candidate
        .and_then(|c| c.get("finishReason"))
        .or_else(|| v.get("promptFeedback").and_then(|f| f.get("blockReason")))
        .and_then(|r| r.as_str())
        .unwrap_or("missing candidates[0].content.parts[].text");

    Err(ServiceError::EmptyResponse(reason.to_string()))
}

fn extract_error_message(status: StatusCode, body_text: &str) -> String {
    // Google APIs use { "error": { "message": "..." } }; some proxies { "message": "..." }
    if let Ok(v) = serde_json::from_str::<Value>(body_text) {
        if let Some(msg) = v
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
        {
            return msg.to_string();
        }
        if let Some(msg) = v.get("message").and_then(|m| m.as_str()) {
            return msg.to_string();
        }
    }

    let trimmed = body_text.trim();
    if trimmed.is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string();
    }

    let snippet: String = trimmed.chars().take(400).collect();
    if snippet.len() < trimmed.len() {
        format!("{snippet}...")
    } else {
        snippet
    }
}
