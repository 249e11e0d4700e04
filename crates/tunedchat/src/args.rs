use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "tunedchat", version)]
#[command(about = "Chat with an operator-tuned LLM endpoint from the terminal")]
#[command(
    long_about = "Talk to a remote chat-completion endpoint whose sampling parameters
(temperature, max tokens, stop sequences, and so on) are tuned by an operator and stored
in a local database. The `chat` subcommand sends one message, continuing a cached
conversation when asked to; `config` is the operator surface for editing and activating
stored configurations; `history` manages the local conversation cache.

The endpoint URL comes from the CHAT_API_URL environment variable. The database defaults
to a sqlite file in the config dir and can be overridden with DATABASE_URL."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Send a message and print the reply.
    Chat(ChatArgs),
    /// Inspect and edit the stored inference configurations.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Manage the local conversation cache.
    #[command(subcommand)]
    History(HistoryCommand),
}

#[derive(Debug, Default, Parser)]
pub struct ChatArgs {
    /// The user message. If absent, `stdin` is read instead.
    pub prompt: Option<String>,

    /// Continue the conversation identified by its id.
    #[clap(long)]
    pub from: Option<String>,

    /// Continue from the most recently used conversation.
    #[clap(long, default_value = "false")]
    pub from_last: bool,

    /// Conversation title. Derived from the first message when omitted.
    #[clap(long)]
    pub title: Option<String>,

    /// Don't cache the conversation details.
    #[clap(long, default_value = "false")]
    pub no_cache: bool,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the active configuration.
    Show,
    /// List every stored configuration.
    List,
    /// Create a configuration.
    New(ConfigFields),
    /// Update fields on an existing configuration.
    Set {
        /// Configuration id.
        id: String,

        #[command(flatten)]
        fields: ConfigFields,
    },
    /// Mark a configuration as the one driving chat turns.
    Activate {
        /// Configuration id.
        id: String,
    },
}

#[derive(Debug, Default, Parser)]
pub struct ConfigFields {
    /// Display name; doubles as the upstream model identifier.
    #[clap(long)]
    pub name: Option<String>,

    /// System message prepended to every chat turn.
    #[clap(long)]
    pub system_prompt: Option<String>,

    /// The maximum amount of tokens to return (1 to 8192).
    #[clap(long)]
    pub max_tokens: Option<u32>,

    /// Temperature value (0 to 2).
    #[clap(long)]
    pub temperature: Option<f32>,

    /// Top-K value.
    #[clap(long)]
    pub top_k: Option<u32>,

    /// Top-P value (0 to 1).
    #[clap(long)]
    pub top_p: Option<f32>,

    /// Repeat penalty (1 to 2).
    #[clap(long)]
    pub repeat_penalty: Option<f32>,

    /// Stop sequence; repeat the flag for several (up to 4). A single empty
    /// string clears the list.
    #[clap(long = "stop")]
    pub stop: Vec<String>,

    /// Ask the endpoint for an event-stream response.
    #[clap(long)]
    pub stream: Option<bool>,
}

#[derive(Debug, Subcommand)]
pub enum HistoryCommand {
    /// List cached conversations, newest first.
    List,
    /// Print a cached conversation.
    Show {
        /// Conversation id.
        id: String,
    },
    /// Delete one conversation.
    Delete {
        /// Conversation id.
        id: String,
    },
    /// Delete every cached conversation.
    Clear,
}
