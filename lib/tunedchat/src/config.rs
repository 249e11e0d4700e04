use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// At most this many stop sequences may be configured.
pub const MAX_STOP_SEQUENCES: usize = 4;

/// Upper bound on the system prompt length, in characters.
pub const MAX_SYSTEM_PROMPT_LEN: usize = 5000;

/// One stored inference configuration. The record flagged `is_active` drives
/// every chat turn; the rest are presets the operator can switch between.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InferenceConfig {
    pub id: Uuid,
    /// Display name; doubles as the upstream model identifier.
    pub name: String,
    #[serde(default)]
    pub system_prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    pub repeat_penalty: f32,
    #[serde(default)]
    pub stop: Vec<String>,
    #[serde(default)]
    pub stream: bool,
    #[serde(default)]
    pub is_active: bool,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            name: String::new(),
            system_prompt: String::new(),
            max_tokens: 1024,
            temperature: 0.7,
            top_k: None,
            top_p: None,
            repeat_penalty: 1.1,
            stop: Vec::new(),
            stream: false,
            is_active: false,
        }
    }
}

/// A field that failed validation, with the message shown to the operator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Name is required.")]
    NameRequired,
    #[error("System prompt cannot exceed 5000 characters.")]
    SystemPromptTooLong,
    #[error("max_tokens must be between 1 and 8192.")]
    MaxTokensOutOfRange,
    #[error("temperature must be between 0 and 2.")]
    TemperatureOutOfRange,
    #[error("top_k must be at least 1.")]
    TopKOutOfRange,
    #[error("top_p must be between 0 and 1.")]
    TopPOutOfRange,
    #[error("repeat_penalty must be between 1 and 2.")]
    RepeatPenaltyOutOfRange,
    #[error("You can specify up to 4 stop sequences.")]
    TooManyStopSequences,
}

impl InferenceConfig {
    /// Range-checks every tunable before the record is written or used.
    /// A record that fails here is treated as "configuration unavailable"
    /// on the read path and rejected outright on the write path.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::NameRequired);
        }
        if self.system_prompt.chars().count() > MAX_SYSTEM_PROMPT_LEN {
            return Err(ConfigError::SystemPromptTooLong);
        }
        if self.max_tokens == 0 || self.max_tokens > 8192 {
            return Err(ConfigError::MaxTokensOutOfRange);
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::TemperatureOutOfRange);
        }
        if self.top_k == Some(0) {
            return Err(ConfigError::TopKOutOfRange);
        }
        if let Some(top_p) = self.top_p {
            if !(0.0..=1.0).contains(&top_p) {
                return Err(ConfigError::TopPOutOfRange);
            }
        }
        if !(1.0..=2.0).contains(&self.repeat_penalty) {
            return Err(ConfigError::RepeatPenaltyOutOfRange);
        }
        if self.stop.len() > MAX_STOP_SEQUENCES {
            return Err(ConfigError::TooManyStopSequences);
        }
        Ok(())
    }
}
