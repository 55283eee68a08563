// File: cb2bot-core/src/repositories/sqlite/commands.rs

use async_trait::async_trait;
use sqlx::{Pool, Row, Sqlite};
use tracing::debug;

use cb2bot_common::error::Error;
use cb2bot_common::models::StoredCommand;
use cb2bot_common::traits::repository_traits::CommandRepository;

#[derive(Clone)]
pub struct SqliteCommandRepository {
    pool: Pool<Sqlite>,
}

impl SqliteCommandRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

fn row_to_command(r: &sqlx::sqlite::SqliteRow) -> Result<StoredCommand, Error> {
    Ok(StoredCommand {
        name: r.try_get("command")?,
        template: r.try_get("content")?,
        requires_elevated: r.try_get::<i64, _>("mod_only")? != 0,
    })
}

#[async_trait]
impl CommandRepository for SqliteCommandRepository {
    async fn find(&self, name: &str) -> Result<Option<StoredCommand>, Error> {
        let row = sqlx::query(
            r#"
            SELECT command, content, mod_only
            FROM commands
            WHERE command = ?
            "#,
        )
            .bind(name.to_lowercase())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(r) => Ok(Some(row_to_command(&r)?)),
            None => Ok(None),
        }
    }

    async fn insert(&self, cmd: &StoredCommand) -> Result<bool, Error> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO commands (command, content, mod_only)
            VALUES (?, ?, ?)
            ON CONFLICT (command) DO NOTHING
            "#,
        )
            .bind(cmd.name.to_lowercase())
            .bind(&cmd.template)
            .bind(cmd.requires_elevated as i64)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let inserted = result.rows_affected() == 1;
        debug!("insert command '{}' => inserted={}", cmd.name, inserted);
        Ok(inserted)
    }

    async fn remove(&self, name: &str) -> Result<(), Error> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("DELETE FROM commands WHERE command = ?")
            .bind(name.to_lowercase())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        debug!("remove command '{}' => rows={}", name, result.rows_affected());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<StoredCommand>, Error> {
        let rows = sqlx::query(
            r#"
            SELECT command, content, mod_only
            FROM commands
            ORDER BY command ASC
            "#,
        )
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_command).collect()
    }
}
