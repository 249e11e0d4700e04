use std::path::PathBuf;
use std::time::SystemTime;

use cli_table::{print_stdout, Cell, Style, Table};
use serde::{Deserialize, Serialize};
use tunedchat::{Message, Role};
use uuid::Uuid;

use crate::args::HistoryCommand;
use crate::prelude::*;

const TITLE_MAX_LEN: usize = 40;
const GREETING: &str = "Hello! How can I help you today?";

/// A client-held conversation. The adapter never sees these wholesale; the
/// message list is handed to it as history on each turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Conversation {
    pub id: Uuid,
    pub title: String,
    pub messages: Vec<Message>,
}

impl Conversation {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            messages: vec![Message::new(Role::Assistant, GREETING)],
        }
    }
}

/// First-message title: the first 40 characters, with an ellipsis when
/// truncated.
#[must_use]
pub fn derive_title(message: &str) -> String {
    let trimmed = message.trim();

    if trimmed.chars().count() > TITLE_MAX_LEN {
        let head: String = trimmed.chars().take(TITLE_MAX_LEN).collect();
        format!("{head}...")
    } else {
        trimmed.to_string()
    }
}

/// On-disk conversation cache: one JSON file per conversation under the
/// config dir.
pub struct Cache {
    dir: PathBuf,
}

impl Cache {
    pub fn open() -> Result<Self> {
        Self::at(config_dir()?.join("conversations"))
    }

    pub fn at(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    pub fn save(&self, conversation: &Conversation) -> Result<()> {
        let json = serde_json::to_string_pretty(conversation)?;
        std::fs::write(self.path(conversation.id), json)?;
        Ok(())
    }

    pub fn load(&self, id: Uuid) -> Result<Conversation> {
        let raw = std::fs::read_to_string(self.path(id)).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::ConversationNotFound(id)
            } else {
                Error::Io(e)
            }
        })?;

        Ok(serde_json::from_str(&raw)?)
    }

    /// Every cached conversation, most recently written first.
    pub fn list(&self) -> Result<Vec<Conversation>> {
        let mut entries: Vec<(SystemTime, Conversation)> = Vec::new();

        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            let raw = std::fs::read_to_string(&path)?;
            let conversation = match serde_json::from_str(&raw) {
                Ok(conversation) => conversation,
                Err(e) => {
                    log::warn!("skipping unreadable conversation {}: {e}", path.display());
                    continue;
                }
            };

            let modified = entry
                .metadata()?
                .modified()
                .unwrap_or(SystemTime::UNIX_EPOCH);
            entries.push((modified, conversation));
        }

        entries.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(entries.into_iter().map(|(_, c)| c).collect())
    }

    pub fn last(&self) -> Result<Conversation> {
        self.list()?.into_iter().next().ok_or(Error::NoConversations)
    }

    pub fn delete(&self, id: Uuid) -> Result<()> {
        std::fs::remove_file(self.path(id)).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::ConversationNotFound(id)
            } else {
                Error::Io(e)
            }
        })
    }

    pub fn clear(&self) -> Result<()> {
        for conversation in self.list()? {
            self.delete(conversation.id)?;
        }
        Ok(())
    }
}

pub async fn run(command: HistoryCommand) -> Result<()> {
    let cache = Cache::open()?;

    match command {
        HistoryCommand::List => {
            let conversations = cache.list()?;
            if conversations.is_empty() {
                println!("No cached conversations.");
                return Ok(());
            }

            let table = conversations
                .iter()
                .map(|c| {
                    vec![
                        c.id.cell(),
                        c.title.clone().cell(),
                        c.messages.len().cell(),
                    ]
                })
                .collect::<Vec<_>>()
                .table()
                .title(vec![
                    "Id".cell().bold(true),
                    "Title".cell().bold(true),
                    "Messages".cell().bold(true),
                ]);

            print_stdout(table)?;
        }
        HistoryCommand::Show { id } => {
            let conversation = cache.load(id.parse()?)?;

            println!("# {}", conversation.title);
            for message in &conversation.messages {
                let role = match message.role {
                    Role::System => "system",
                    Role::User => "user",
                    Role::Assistant => "assistant",
                };
                println!("{role}: {}", message.content);
            }
        }
        HistoryCommand::Delete { id } => {
            let id: Uuid = id.parse()?;
            cache.delete(id)?;
            println!("Deleted conversation {id}.");
        }
        HistoryCommand::Clear => {
            cache.clear()?;
            println!("Cleared the conversation cache.");
        }
    }

    Ok(())
}
