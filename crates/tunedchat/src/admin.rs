use cli_table::{print_stdout, Cell, Style, Table};
use tunedchat::InferenceConfig;
use uuid::Uuid;

use crate::args::{ConfigCommand, ConfigFields};
use crate::prelude::*;

pub async fn run(command: ConfigCommand) -> Result<()> {
    let store = open_store().await?;

    match command {
        ConfigCommand::Show => match store.active_config().await {
            Some(config) => print_config(&config),
            None => println!("No active configuration."),
        },
        ConfigCommand::List => {
            let configs = store.list_configs().await?;
            if configs.is_empty() {
                println!("No stored configurations.");
                return Ok(());
            }

            let table = configs
                .iter()
                .map(|c| {
                    vec![
                        c.id.cell(),
                        c.name.clone().cell(),
                        if c.is_active { "yes" } else { "" }.cell(),
                        c.max_tokens.cell(),
                        format!("{:.2}", c.temperature).cell(),
                        c.stop.join(", ").cell(),
                    ]
                })
                .collect::<Vec<_>>()
                .table()
                .title(vec![
                    "Id".cell().bold(true),
                    "Name".cell().bold(true),
                    "Active".cell().bold(true),
                    "Max tokens".cell().bold(true),
                    "Temperature".cell().bold(true),
                    "Stop".cell().bold(true),
                ]);

            print_stdout(table)?;
        }
        ConfigCommand::New(fields) => {
            let mut config = InferenceConfig::default();
            apply(&mut config, fields);

            store.insert_config(&config).await?;
            println!("Created configuration {}.", config.id);
        }
        ConfigCommand::Set { id, fields } => {
            let id: Uuid = id.parse()?;
            let mut config = store
                .get_config(id)
                .await?
                .ok_or(Error::ConfigNotFound(id))?;
            apply(&mut config, fields);

            store.update_config(&config).await?;
            println!("Configuration updated successfully!");
        }
        ConfigCommand::Activate { id } => {
            let id: Uuid = id.parse()?;
            store.activate(id).await?;
            println!("Configuration {id} activated.");
        }
    }

    Ok(())
}

/// Overlays the provided flags onto a record; untouched fields keep their
/// stored values. A lone empty `--stop` clears the list.
fn apply(config: &mut InferenceConfig, fields: ConfigFields) {
    if let Some(name) = fields.name {
        config.name = name;
    }
    if let Some(system_prompt) = fields.system_prompt {
        config.system_prompt = system_prompt;
    }
    if let Some(max_tokens) = fields.max_tokens {
        config.max_tokens = max_tokens;
    }
    if let Some(temperature) = fields.temperature {
        config.temperature = temperature;
    }
    if let Some(top_k) = fields.top_k {
        config.top_k = Some(top_k);
    }
    if let Some(top_p) = fields.top_p {
        config.top_p = Some(top_p);
    }
    if let Some(repeat_penalty) = fields.repeat_penalty {
        config.repeat_penalty = repeat_penalty;
    }
    if !fields.stop.is_empty() {
        config.stop = fields.stop.into_iter().filter(|s| !s.is_empty()).collect();
    }
    if let Some(stream) = fields.stream {
        config.stream = stream;
    }
}

fn print_config(config: &InferenceConfig) {
    println!("id:             {}", config.id);
    println!("name:           {}", config.name);
    println!("system_prompt:  {}", config.system_prompt);
    println!("max_tokens:     {}", config.max_tokens);
    println!("temperature:    {}", config.temperature);
    match config.top_k {
        Some(top_k) => println!("top_k:          {top_k}"),
        None => println!("top_k:          (unset)"),
    }
    match config.top_p {
        Some(top_p) => println!("top_p:          {top_p}"),
        None => println!("top_p:          (unset)"),
    }
    println!("repeat_penalty: {}", config.repeat_penalty);
    println!("stop:           {:?}", config.stop);
    println!("stream:         {}", config.stream);
}
