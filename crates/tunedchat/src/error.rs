#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("conversation {0} not found")]
    ConversationNotFound(uuid::Uuid),
    #[error("no cached conversations to continue from")]
    NoConversations,
    #[error("configuration {0} not found")]
    ConfigNotFound(uuid::Uuid),
    #[error("a prompt is required; pass it as an argument or pipe it via stdin")]
    EmptyPrompt,
    #[error("invalid id: {0}")]
    InvalidId(#[from] uuid::Error),
    #[error(transparent)]
    Store(#[from] tunedchat::StoreError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
    #[error(transparent)]
    Env(#[from] std::env::VarError),
}
