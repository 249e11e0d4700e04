use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqliteRow};
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use crate::config::InferenceConfig;
use crate::error::StoreError;

/// Sqlite-backed store for [`InferenceConfig`] records.
///
/// The pool is owned by this struct and injected wherever it is needed;
/// there is no process-wide handle. Dropping the store (or calling
/// [`ConfigStore::close`]) releases the connections.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    pool: SqlitePool,
}

impl ConfigStore {
    /// Opens the database at `url` (a `sqlite:` URL), creating the file and
    /// the tables when missing.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS llm_configs (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                system_prompt TEXT NOT NULL DEFAULT '',
                max_tokens INTEGER NOT NULL,
                temperature REAL NOT NULL,
                top_k INTEGER,
                top_p REAL,
                repeat_penalty REAL NOT NULL,
                stop TEXT NOT NULL DEFAULT '[]',
                stream INTEGER NOT NULL DEFAULT 0,
                is_active INTEGER NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS llm_config_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                config_id TEXT NOT NULL,
                action TEXT NOT NULL,
                changes TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Fetches the record flagged active. Absence, a decode failure, or a
    /// record that fails validation all log a diagnostic and yield `None`;
    /// this path never errors out to the caller. When several records are
    /// flagged (which should not happen), the first one wins.
    pub async fn active_config(&self) -> Option<InferenceConfig> {
        let row = match sqlx::query("SELECT * FROM llm_configs WHERE is_active = 1 LIMIT 1")
            .fetch_optional(&self.pool)
            .await
        {
            Ok(Some(row)) => row,
            Ok(None) => {
                log::warn!("no active inference config found");
                return None;
            }
            Err(e) => {
                log::error!("failed to fetch active inference config: {e}");
                return None;
            }
        };

        let config = match decode_config(&row) {
            Ok(config) => config,
            Err(e) => {
                log::error!("failed to decode active inference config: {e}");
                return None;
            }
        };

        if let Err(e) = config.validate() {
            log::error!("active inference config is invalid: {e}");
            return None;
        }

        Some(config)
    }

    pub async fn get_config(&self, id: Uuid) -> Result<Option<InferenceConfig>, StoreError> {
        let row = sqlx::query("SELECT * FROM llm_configs WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(decode_config).transpose()
    }

    pub async fn list_configs(&self) -> Result<Vec<InferenceConfig>, StoreError> {
        let rows = sqlx::query("SELECT * FROM llm_configs ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(decode_config).collect()
    }

    /// Validates and inserts a full record, appending a change record in the
    /// same transaction.
    pub async fn insert_config(&self, config: &InferenceConfig) -> Result<(), StoreError> {
        config.validate()?;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO llm_configs
                (id, name, system_prompt, max_tokens, temperature, top_k, top_p,
                 repeat_penalty, stop, stream, is_active)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(config.id.to_string())
        .bind(&config.name)
        .bind(&config.system_prompt)
        .bind(i64::from(config.max_tokens))
        .bind(f64::from(config.temperature))
        .bind(config.top_k.map(i64::from))
        .bind(config.top_p.map(f64::from))
        .bind(f64::from(config.repeat_penalty))
        .bind(serde_json::to_string(&config.stop)?)
        .bind(config.stream)
        .bind(config.is_active)
        .execute(&mut *tx)
        .await?;

        record_change(&mut tx, config.id, "INSERT", config).await?;
        tx.commit().await?;

        Ok(())
    }

    /// Validates and rewrites every tunable of an existing record,
    /// appending the new state to the history table in the same
    /// transaction.
    pub async fn update_config(&self, config: &InferenceConfig) -> Result<(), StoreError> {
        config.validate()?;

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE llm_configs
            SET name = ?1, system_prompt = ?2, max_tokens = ?3, temperature = ?4,
                top_k = ?5, top_p = ?6, repeat_penalty = ?7, stop = ?8, stream = ?9
            WHERE id = ?10
            "#,
        )
        .bind(&config.name)
        .bind(&config.system_prompt)
        .bind(i64::from(config.max_tokens))
        .bind(f64::from(config.temperature))
        .bind(config.top_k.map(i64::from))
        .bind(config.top_p.map(f64::from))
        .bind(f64::from(config.repeat_penalty))
        .bind(serde_json::to_string(&config.stop)?)
        .bind(config.stream)
        .bind(config.id.to_string())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(config.id));
        }

        record_change(&mut tx, config.id, "UPDATE", config).await?;
        tx.commit().await?;

        Ok(())
    }

    /// Moves the active flag onto `id`, clearing it everywhere else.
    pub async fn activate(&self, id: Uuid) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE llm_configs SET is_active = 0 WHERE is_active = 1")
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("UPDATE llm_configs SET is_active = 1 WHERE id = ?1")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }

        sqlx::query(
            "INSERT INTO llm_config_history (config_id, action, changes) VALUES (?1, 'ACTIVATE', '{}')",
        )
        .bind(id.to_string())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }
}

async fn record_change(
    tx: &mut Transaction<'_, Sqlite>,
    config_id: Uuid,
    action: &str,
    config: &InferenceConfig,
) -> Result<(), StoreError> {
    sqlx::query("INSERT INTO llm_config_history (config_id, action, changes) VALUES (?1, ?2, ?3)")
        .bind(config_id.to_string())
        .bind(action)
        .bind(serde_json::to_string(config)?)
        .execute(&mut **tx)
        .await?;

    Ok(())
}

fn decode_config(row: &SqliteRow) -> Result<InferenceConfig, StoreError> {
    let id: String = row.try_get("id")?;
    let stop: String = row.try_get("stop")?;

    Ok(InferenceConfig {
        id: Uuid::parse_str(&id)?,
        name: row.try_get("name")?,
        system_prompt: row.try_get("system_prompt")?,
        max_tokens: row.try_get::<i64, _>("max_tokens")? as u32,
        temperature: row.try_get::<f64, _>("temperature")? as f32,
        top_k: row.try_get::<Option<i64>, _>("top_k")?.map(|v| v as u32),
        top_p: row.try_get::<Option<f64>, _>("top_p")?.map(|v| v as f32),
        repeat_penalty: row.try_get::<f64, _>("repeat_penalty")? as f32,
        stop: serde_json::from_str(&stop)?,
        stream: row.try_get("stream")?,
        is_active: row.try_get("is_active")?,
    })
}
