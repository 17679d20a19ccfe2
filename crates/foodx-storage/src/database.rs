// SPDX-FileCopyrightText: 2026 FoodX Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup and embedded migrations.
//!
//! All statements are serialized through tokio-rusqlite's single background
//! thread. Do NOT open additional connections to the same file for writes.

use std::time::Duration;

use foodx_core::FoodxError;
use tokio_rusqlite::Connection;
use tracing::debug;

use crate::migrations;

/// Path value that selects a private in-memory database.
pub const IN_MEMORY_PATH: &str = ":memory:";

/// An open, migrated SQLite database.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (creating if needed) the database at `path` and bring its schema up to date.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, FoodxError> {
        let conn = if path == IN_MEMORY_PATH {
            Connection::open_in_memory().await
        } else {
            if let Some(parent) = std::path::Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(FoodxError::backend)?;
                }
            }
            Connection::open(path).await
        }
        .map_err(FoodxError::backend)?;

        conn.call(move |conn| -> Result<(), FoodxError> {
            conn.busy_timeout(Duration::from_secs(5))
                .map_err(FoodxError::backend)?;
            if wal_mode {
                let mode: String = conn
                    .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
                    .map_err(FoodxError::backend)?;
                debug!(journal_mode = %mode, "journal mode set");
            }
            conn.pragma_update(None, "synchronous", "NORMAL")
                .map_err(FoodxError::backend)?;
            migrations::run_migrations(conn)
        })
        .await
        .map_err(flatten_err)?;

        debug!(path, "database opened");
        Ok(Self { conn })
    }

    /// Open a private in-memory database.
    pub async fn open_in_memory() -> Result<Self, FoodxError> {
        Self::open(IN_MEMORY_PATH, false).await
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

/// Maps a tokio-rusqlite failure around a plain rusqlite error.
pub(crate) fn map_tr_err(err: tokio_rusqlite::Error<rusqlite::Error>) -> FoodxError {
    match err {
        tokio_rusqlite::Error::Error(inner) => FoodxError::backend(inner),
        other => FoodxError::Backend {
            source: other.to_string().into(),
        },
    }
}

/// Unwraps a tokio-rusqlite failure whose closure already produced a [`FoodxError`].
pub(crate) fn flatten_err(err: tokio_rusqlite::Error<FoodxError>) -> FoodxError {
    match err {
        tokio_rusqlite::Error::Error(inner) => inner,
        other => FoodxError::Backend {
            source: other.to_string().into(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/store.db");
        Database::open(path.to_str().unwrap(), true).await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn migrations_create_kv_table() {
        let db = Database::open_in_memory().await.unwrap();
        let count: i64 = db
            .connection()
            .call(|conn| -> Result<i64, rusqlite::Error> {
                conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'kv_store'",
                    [],
                    |row| row.get(0),
                )
            })
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn reopening_does_not_rerun_migrations() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("twice.db");
        let path = path.to_str().unwrap();
        drop(Database::open(path, true).await.unwrap());
        Database::open(path, true).await.unwrap();
    }
}
