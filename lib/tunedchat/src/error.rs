use uuid::Uuid;

use crate::config::ConfigError;

/// Everything that can go wrong during one chat turn.
///
/// The `Display` impl of every variant is user-facing text: the adapter
/// folds these into its returned string at the boundary, so the caller
/// always has something to render and no variant escapes as a fault.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// The endpoint env var is unset. A deployment error, not a transient
    /// one, so it is reported immediately without a network attempt.
    #[error("The chat endpoint is not configured. Set CHAT_API_URL and restart the service.")]
    EndpointMissing,
    #[error("AI configuration is not available at the moment. Please contact an administrator.")]
    ConfigUnavailable,
    /// Non-2xx reply. Status and raw body are embedded for diagnosability.
    #[error("Error communicating with the AI service: request failed with status {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("The request to the AI service timed out. Please try again.")]
    Timeout,
    /// A 2xx JSON body without `choices[0].message.content`.
    #[error("Received an unexpected response format from the AI service.")]
    UnexpectedFormat,
    /// An event-stream body whose final data line could not be parsed.
    #[error("Failed to parse the AI service's streaming response.")]
    StreamParse,
    /// Any other network-layer failure.
    #[error("Error communicating with the AI service: {0}")]
    Transport(String),
}

/// Failures from the configuration store. Unlike [`ChatError`] these are
/// surfaced as `Result`s: the admin surface wants to report them precisely.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Invalid data provided: {0}")]
    Invalid(#[from] ConfigError),
    #[error("configuration {0} not found")]
    NotFound(Uuid),
    #[error("invalid configuration id: {0}")]
    InvalidId(#[from] uuid::Error),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_error_text_embeds_status_and_body() {
        let error = ChatError::Upstream {
            status: 500,
            body: "server error".to_string(),
        };

        let text = error.to_string();

        assert!(text.contains("500"));
        assert!(text.contains("server error"));
    }

    #[test]
    fn timeout_text_is_distinct() {
        let timeout = ChatError::Timeout.to_string();
        let transport = ChatError::Transport("connection reset".to_string()).to_string();

        assert!(timeout.contains("timed out"));
        assert!(!transport.contains("timed out"));
    }

    #[test]
    fn parse_failures_have_distinct_messages_per_shape() {
        assert_ne!(
            ChatError::UnexpectedFormat.to_string(),
            ChatError::StreamParse.to_string()
        );
    }
}
