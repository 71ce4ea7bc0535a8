//! HTTP client for the remote Harmony worker.
//!
//! # Responsibility
//! - Authenticate, fetch/push generic data, and query the text model behind
//!   one configurable base URL.
//! - Keep the wrappers thin: no retries, no backoff; failures map to a typed
//!   error and bubble to the caller.
//!
//! # Invariants
//! - Every request carries the configured timeout.
//! - A non-2xx response is an `AiError::Http`, never a silent default.

use log::debug;
use serde::Deserialize;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://harmony-worker.example.dev";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Result type for endpoint wrappers.
pub type AiResult<T> = Result<T, AiError>;

/// Error for remote endpoint interaction.
#[derive(Debug)]
pub enum AiError {
    /// Server answered with a non-2xx status.
    Http { status: u16, endpoint: String },
    /// Connection, DNS or timeout failure before a response arrived.
    Transport(String),
    /// Response body was not the expected JSON shape.
    Parse(String),
}

impl Display for AiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http { status, endpoint } => {
                write!(f, "endpoint `{endpoint}` answered HTTP {status}")
            }
            Self::Transport(message) => write!(f, "transport failure: {message}"),
            Self::Parse(message) => write!(f, "invalid response body: {message}"),
        }
    }
}

impl Error for AiError {}

/// Configuration for the worker client.
#[derive(Debug, Clone)]
pub struct AiClientConfig {
    /// Base URL without a trailing slash.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for AiClientConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var("HARMONY_API_BASE")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Session returned by `authenticate_user`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSession {
    pub token: String,
}

/// Text-completion seam consumed by the impact engine.
///
/// Implemented by [`AiClient`] for production and by stubs in tests.
pub trait TextModel {
    fn complete(&self, query_type: &str, payload: &Value) -> AiResult<String>;
}

impl<T: TextModel + ?Sized> TextModel for &T {
    fn complete(&self, query_type: &str, payload: &Value) -> AiResult<String> {
        (**self).complete(query_type, payload)
    }
}

impl<T: TextModel + ?Sized> TextModel for Box<T> {
    fn complete(&self, query_type: &str, payload: &Value) -> AiResult<String> {
        (**self).complete(query_type, payload)
    }
}

/// Client for the remote Harmony worker endpoints.
pub struct AiClient {
    config: AiClientConfig,
    agent: ureq::Agent,
}

impl AiClient {
    pub fn new(config: AiClientConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build();
        Self { config, agent }
    }

    pub fn config(&self) -> &AiClientConfig {
        &self.config
    }

    /// Exchanges credentials for a session token via `POST {base}/auth`.
    pub fn authenticate_user(&self, username: &str, password: &str) -> AiResult<AuthSession> {
        let body = serde_json::json!({ "username": username, "password": password });
        let value = self.post_json("auth", &body)?;
        serde_json::from_value(value).map_err(|err| AiError::Parse(err.to_string()))
    }

    /// Fetches arbitrary JSON from `GET {base}/{endpoint}`.
    pub fn fetch_data(&self, endpoint: &str) -> AiResult<Value> {
        let url = self.url_for(endpoint);
        debug!("event=api_request module=ai method=GET endpoint={endpoint}");
        let response = self
            .agent
            .get(&url)
            .call()
            .map_err(|err| map_ureq_error(err, endpoint))?;
        parse_json_body(response)
    }

    /// Posts arbitrary JSON to `POST {base}/{endpoint}`.
    pub fn send_data(&self, endpoint: &str, body: &Value) -> AiResult<Value> {
        self.post_json(endpoint, body)
    }

    /// Queries the text model via `POST {base}/ai`.
    ///
    /// The worker contract is `{ "type": ..., "payload": ... }` in and
    /// `{ "response": string }` out.
    pub fn query_ai(&self, query_type: &str, payload: &Value) -> AiResult<String> {
        let body = serde_json::json!({ "type": query_type, "payload": payload });
        let value = self.post_json("ai", &body)?;
        value
            .get("response")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| AiError::Parse("missing `response` field".to_string()))
    }

    fn post_json(&self, endpoint: &str, body: &Value) -> AiResult<Value> {
        let url = self.url_for(endpoint);
        debug!("event=api_request module=ai method=POST endpoint={endpoint}");

        let body_text =
            serde_json::to_string(body).map_err(|err| AiError::Parse(err.to_string()))?;
        let response = self
            .agent
            .post(&url)
            .set("Content-Type", "application/json")
            .send_string(&body_text)
            .map_err(|err| map_ureq_error(err, endpoint))?;
        parse_json_body(response)
    }

    fn url_for(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }
}

impl TextModel for AiClient {
    fn complete(&self, query_type: &str, payload: &Value) -> AiResult<String> {
        self.query_ai(query_type, payload)
    }
}

fn map_ureq_error(err: ureq::Error, endpoint: &str) -> AiError {
    match err {
        ureq::Error::Status(status, _) => AiError::Http {
            status,
            endpoint: endpoint.to_string(),
        },
        ureq::Error::Transport(transport) => AiError::Transport(transport.to_string()),
    }
}

fn parse_json_body(response: ureq::Response) -> AiResult<Value> {
    response
        .into_json()
        .map_err(|err| AiError::Parse(err.to_string()))
}
