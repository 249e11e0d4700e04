mod admin;
mod args;
mod chat;
mod conversation;
mod error;
mod prelude;

use clap::Parser;

use crate::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args = args::Args::parse();

    match args.command {
        args::Command::Chat(chat_args) => chat::run(chat_args).await,
        args::Command::Config(config_command) => admin::run(config_command).await,
        args::Command::History(history_command) => conversation::run(history_command).await,
    }
}
