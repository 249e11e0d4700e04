use std::path::PathBuf;

pub use crate::error::Error;

pub type Result<T> = std::result::Result<T, Error>;

const CONFIG_DIR_ENV: &str = "TUNEDCHAT_CONFIG_DIR";
const DATABASE_URL_ENV: &str = "DATABASE_URL";

/// Directory holding the conversation cache and, absent `DATABASE_URL`,
/// the sqlite database. Defaults to `~/.config/tunedchat`.
pub fn config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }

    let home = std::env::var("HOME")?;
    Ok(PathBuf::from(home).join(".config").join("tunedchat"))
}

/// Database location: `DATABASE_URL` when set, otherwise a sqlite file in
/// the config dir (created on first use).
pub fn database_url() -> Result<String> {
    if let Ok(url) = std::env::var(DATABASE_URL_ENV) {
        return Ok(url);
    }

    let dir = config_dir()?;
    std::fs::create_dir_all(&dir)?;

    Ok(format!("sqlite://{}", dir.join("tunedchat.db").display()))
}

pub async fn open_store() -> Result<tunedchat::ConfigStore> {
    let url = database_url()?;
    log::debug!("database: {url}");

    Ok(tunedchat::ConfigStore::connect(&url).await?)
}
