use std::io::{BufRead, IsTerminal};

use tunedchat::{ChatAdapter, Message, Role};

use crate::args::ChatArgs;
use crate::conversation::{derive_title, Cache, Conversation};
use crate::prelude::*;

pub async fn run(mut args: ChatArgs) -> Result<()> {
    let prompt = read_prompt(args.prompt.take())?;

    let cache = Cache::open()?;
    let mut conversation = if let Some(id) = args.from.take() {
        cache.load(id.parse()?)?
    } else if args.from_last {
        cache.last()?
    } else {
        let title = args.title.take().unwrap_or_else(|| derive_title(&prompt));
        Conversation::new(title)
    };

    let store = open_store().await?;
    let adapter = ChatAdapter::from_env(store);

    log::debug!(
        "conversation {}: {} prior messages",
        conversation.id,
        conversation.messages.len()
    );

    let reply = adapter.respond(&conversation.messages, &prompt).await;

    println!("{reply}");

    conversation.messages.push(Message::new(Role::User, &prompt));
    conversation
        .messages
        .push(Message::new(Role::Assistant, &reply));

    if !args.no_cache {
        cache.save(&conversation)?;
        log::info!("cached conversation {}", conversation.id);
    }

    Ok(())
}

/// The prompt comes from the argument when given, from piped stdin
/// otherwise. An interactive terminal with no argument is an error rather
/// than a hang.
fn read_prompt(arg: Option<String>) -> Result<String> {
    if let Some(prompt) = arg {
        if !prompt.trim().is_empty() {
            return Ok(prompt);
        }
    }

    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        return Err(Error::EmptyPrompt);
    }

    let lines = stdin
        .lock()
        .lines()
        .collect::<std::result::Result<Vec<String>, std::io::Error>>()?;
    let prompt = lines.join("\n");

    if prompt.trim().is_empty() {
        return Err(Error::EmptyPrompt);
    }

    Ok(prompt)
}
