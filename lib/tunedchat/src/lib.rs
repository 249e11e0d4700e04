//! Core of the tunedchat relay.
//!
//! The two pieces that matter live here: [`ConfigStore`], which owns the
//! sqlite table holding the operator-tuned inference configurations, and
//! [`ChatAdapter`], which turns an active configuration plus a conversation
//! history into a single bounded HTTP call against an OpenAI-style
//! chat-completion endpoint and extracts a plain-text reply out of whatever
//! comes back.
//!
//! Every chat turn is independent: the configuration is re-read per call, so
//! an operator's change takes effect on the next turn without a restart.

pub mod adapter;
pub mod config;
pub mod error;
pub mod message;
pub mod request;
pub mod store;

pub use adapter::ChatAdapter;
pub use config::{ConfigError, InferenceConfig};
pub use error::{ChatError, StoreError};
pub use message::{Message, Role};
pub use store::ConfigStore;
