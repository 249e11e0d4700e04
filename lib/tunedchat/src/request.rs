use serde::Serialize;

use crate::config::InferenceConfig;
use crate::message::Message;

/// Model identifier sent upstream when the active configuration has no name.
pub const DEFAULT_MODEL: &str = "default";

/// The outbound chat-completion body. Built fresh for every turn from the
/// active configuration plus the assembled messages; never persisted.
///
/// `top_k`, `top_p` and `stop` are omitted from the JSON entirely when
/// unset — some providers reject null numeric fields.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub repeat_penalty: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
    pub stream: bool,
}

impl ChatRequest {
    #[must_use]
    pub fn new(config: &InferenceConfig, messages: Vec<Message>) -> Self {
        Self {
            model: if config.name.is_empty() {
                DEFAULT_MODEL.to_string()
            } else {
                config.name.clone()
            },
            messages,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            repeat_penalty: config.repeat_penalty,
            top_k: config.top_k,
            top_p: config.top_p,
            stop: if config.stop.is_empty() {
                None
            } else {
                Some(config.stop.clone())
            },
            stream: config.stream,
        }
    }
}
