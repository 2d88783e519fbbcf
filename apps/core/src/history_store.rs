use std::collections::HashSet;
use std::path::{Path, PathBuf};

use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, TransactionBehavior};

use crate::model::{Entry, HistoryBlob};

pub const HISTORY_TABLE: &str = "ItemTable";
pub const HISTORY_KEY: &str = "history.recentlyOpenedPathsList";

const SELECT_HISTORY: &str = "SELECT value FROM ItemTable WHERE key = ?1";
const UPDATE_HISTORY: &str = "UPDATE ItemTable SET value = ?2 WHERE key = ?1";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("cannot open history database {}: {message}", path.display())]
    Io { path: PathBuf, message: String },
    #[error("no recently opened history in {}", .0.display())]
    NotFound(PathBuf),
    #[error("history value is not valid: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("history database error: {0}")]
    Database(#[from] rusqlite::Error),
}

pub fn load_entries(db_path: &Path) -> Result<Vec<Entry>, StoreError> {
    let conn = open(db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
    let blob = read_blob(&conn, db_path)?;
    tracing::debug!(
        db = %db_path.display(),
        entries = blob.entries.len(),
        "loaded recent entries"
    );
    Ok(blob.entries)
}

/// Removes every entry whose canonical path equals `target_path`.
/// Returns `false` without touching the file when nothing matched.
pub fn delete_entry(db_path: &Path, target_path: &str) -> Result<bool, StoreError> {
    let removed = rewrite_without(db_path, |path| path == target_path)?;
    Ok(removed > 0)
}

pub fn delete_entries(db_path: &Path, target_paths: &HashSet<String>) -> Result<usize, StoreError> {
    if target_paths.is_empty() {
        return Ok(0);
    }
    rewrite_without(db_path, |path| target_paths.contains(path))
}

fn rewrite_without<F>(db_path: &Path, is_target: F) -> Result<usize, StoreError>
where
    F: Fn(&str) -> bool,
{
    let mut conn = open(db_path, OpenFlags::SQLITE_OPEN_READ_WRITE)?;
    // IMMEDIATE takes the write lock before the read, so the blob cannot change
    // between filtering and the UPDATE.
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let mut blob = read_blob(&tx, db_path)?;

    let before = blob.entries.len();
    blob.entries.retain(|entry| !is_target(entry.canonical_path()));
    let removed = before - blob.entries.len();
    if removed == 0 {
        tracing::debug!(db = %db_path.display(), "no matching recent entries; nothing written");
        return Ok(0);
    }

    let encoded = blob.to_json()?;
    tx.execute(UPDATE_HISTORY, params![HISTORY_KEY, encoded])?;
    tx.commit()?;

    tracing::info!(
        db = %db_path.display(),
        removed,
        remaining = blob.entries.len(),
        "rewrote recent history"
    );
    Ok(removed)
}

fn open(db_path: &Path, mode: OpenFlags) -> Result<Connection, StoreError> {
    if !db_path.is_file() {
        return Err(StoreError::Io {
            path: db_path.to_path_buf(),
            message: "file does not exist".to_string(),
        });
    }

    let flags = mode | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    Connection::open_with_flags(db_path, flags).map_err(|error| StoreError::Io {
        path: db_path.to_path_buf(),
        message: error.to_string(),
    })
}

fn read_blob(conn: &Connection, db_path: &Path) -> Result<HistoryBlob, StoreError> {
    // Raw bytes for TEXT and BLOB alike; bad UTF-8 surfaces as a parse error.
    let raw = match conn
        .query_row(SELECT_HISTORY, params![HISTORY_KEY], |row| {
            Ok(match row.get_ref(0)? {
                ValueRef::Text(bytes) | ValueRef::Blob(bytes) => Some(bytes.to_vec()),
                _ => None,
            })
        })
        .optional()
    {
        Ok(raw) => raw.flatten(),
        Err(error) if is_missing_table(&error) => None,
        Err(error) => return Err(error.into()),
    };

    match raw {
        Some(bytes) if !bytes.iter().all(u8::is_ascii_whitespace) => {
            Ok(serde_json::from_slice(&bytes)?)
        }
        _ => Err(StoreError::NotFound(db_path.to_path_buf())),
    }
}

fn is_missing_table(error: &rusqlite::Error) -> bool {
    match error {
        rusqlite::Error::SqliteFailure(_, Some(message)) => {
            message.starts_with("no such table") && message.contains(HISTORY_TABLE)
        }
        _ => false,
    }
}
