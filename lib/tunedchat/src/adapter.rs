use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;

use crate::error::ChatError;
use crate::message::{assemble, Message};
use crate::request::ChatRequest;
use crate::store::ConfigStore;

/// Environment variable naming the inference endpoint URL.
pub const CHAT_API_URL_ENV: &str = "CHAT_API_URL";

/// Upper bound on one outbound call, connection setup included.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const DATA_PREFIX: &str = "data:";
const DONE_SENTINEL: &str = "[DONE]";

/// Runs chat turns against the remote endpoint using whatever configuration
/// is active at the time of the call.
///
/// Each call is one independent round trip: the configuration is re-read,
/// one POST is issued under the timeout, and no retries are attempted. The
/// adapter holds no mutable state, so concurrent turns need no coordination.
pub struct ChatAdapter {
    client: reqwest::Client,
    endpoint: Option<String>,
    store: ConfigStore,
    timeout: Duration,
}

impl ChatAdapter {
    #[must_use]
    pub fn new(endpoint: Option<String>, store: ConfigStore) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            store,
            timeout: REQUEST_TIMEOUT,
        }
    }

    /// Reads the endpoint from `CHAT_API_URL`. A missing value is not an
    /// error here; `respond` reports it on every call, so the chat shows a
    /// configuration message instead of dying.
    #[must_use]
    pub fn from_env(store: ConfigStore) -> Self {
        Self::new(std::env::var(CHAT_API_URL_ENV).ok(), store)
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Runs one chat turn: history plus a new user message in, displayable
    /// text out. Never fails — every error branch is folded into its
    /// user-facing description, so the caller always has something to
    /// render.
    pub async fn respond(&self, history: &[Message], message: &str) -> String {
        match self.try_respond(history, message).await {
            Ok(text) => text,
            Err(e) => {
                log::error!("chat turn failed: {e:?}");
                e.to_string()
            }
        }
    }

    async fn try_respond(&self, history: &[Message], message: &str) -> Result<String, ChatError> {
        let endpoint = self.endpoint.as_deref().ok_or(ChatError::EndpointMissing)?;

        let config = self
            .store
            .active_config()
            .await
            .ok_or(ChatError::ConfigUnavailable)?;

        let messages = assemble(&config.system_prompt, history, message);
        let request = ChatRequest::new(&config, messages);
        log::debug!("request: {request:#?}");

        let text = match self.dispatch(endpoint, &request).await? {
            UpstreamReply::Json(body) => extract_json_content(&body)?,
            UpstreamReply::EventStream(body) => extract_stream_content(&body)?,
            UpstreamReply::Failed { status, body } => {
                return Err(ChatError::Upstream {
                    status: status.as_u16(),
                    body,
                });
            }
        };

        Ok(text.trim().to_string())
    }

    /// One POST, fully drained, classified by status and content type. The
    /// parse itself happens at the call site so each shape keeps its own
    /// failure mode.
    async fn dispatch(
        &self,
        endpoint: &str,
        request: &ChatRequest,
    ) -> Result<UpstreamReply, ChatError> {
        let response = self
            .client
            .post(endpoint)
            .header(CONTENT_TYPE, "application/json")
            .json(request)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(normalize_transport)?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = response.text().await.map_err(normalize_transport)?;
        log::debug!("response status: {status}, content-type: {content_type}");

        Ok(classify(status, &content_type, body))
    }
}

/// The two success shapes the endpoint is known to produce, plus failures.
/// Produced by [`classify`] in one step, consumed by one exhaustive match.
#[derive(Debug, PartialEq, Eq)]
enum UpstreamReply {
    Json(String),
    EventStream(String),
    Failed { status: StatusCode, body: String },
}

fn classify(status: StatusCode, content_type: &str, body: String) -> UpstreamReply {
    if !status.is_success() {
        return UpstreamReply::Failed { status, body };
    }

    if content_type.starts_with("text/event-stream") {
        UpstreamReply::EventStream(body)
    } else {
        UpstreamReply::Json(body)
    }
}

fn normalize_transport(e: reqwest::Error) -> ChatError {
    if e.is_timeout() {
        ChatError::Timeout
    } else {
        ChatError::Transport(e.to_string())
    }
}

/// Pulls `choices[0].message.content` out of a single JSON body.
fn extract_json_content(body: &str) -> Result<String, ChatError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|_| ChatError::UnexpectedFormat)?;

    value
        .pointer("/choices/0/message/content")
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
        .ok_or(ChatError::UnexpectedFormat)
}

/// Takes the last `data:` line that is not the `[DONE]` sentinel and pulls
/// the reply out of its delta-content or message-content path.
///
/// Bodies are drained before parsing, and in that mode the final chunk
/// carries the fullest accumulated content, so earlier chunks are
/// discarded rather than concatenated.
fn extract_stream_content(body: &str) -> Result<String, ChatError> {
    let last = body
        .lines()
        .filter_map(|line| line.trim().strip_prefix(DATA_PREFIX))
        .map(str::trim)
        .filter(|data| !data.is_empty() && *data != DONE_SENTINEL)
        .last()
        .ok_or(ChatError::StreamParse)?;

    let value: serde_json::Value =
        serde_json::from_str(last).map_err(|_| ChatError::StreamParse)?;

    value
        .pointer("/choices/0/delta/content")
        .or_else(|| value.pointer("/choices/0/message/content"))
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
        .ok_or(ChatError::StreamParse)
}
