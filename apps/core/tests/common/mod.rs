#![allow(dead_code)]

use std::path::PathBuf;

use rusqlite::{params, Connection};
use tempfile::TempDir;
use vscrecent_core::history_store::HISTORY_KEY;

pub const SCENARIO_BLOB: &str = r#"{"entries":[{"folderUri":"file:///Users/a/ProjA"},{"fileUri":"file:///Users/a/b.code-workspace"}]}"#;

/// A scratch `state.vscdb` that lives as long as the value.
pub struct HistoryDb {
    _dir: TempDir,
    pub path: PathBuf,
}

impl HistoryDb {
    pub fn with_value(value: &str) -> Self {
        let db = Self::empty_table();
        let conn = Connection::open(&db.path).unwrap();
        conn.execute(
            "INSERT INTO ItemTable (key, value) VALUES (?1, ?2)",
            params![HISTORY_KEY, value],
        )
        .unwrap();
        db
    }

    pub fn with_blob_bytes(value: &[u8]) -> Self {
        let db = Self::empty_table();
        let conn = Connection::open(&db.path).unwrap();
        conn.execute(
            "INSERT INTO ItemTable (key, value) VALUES (?1, ?2)",
            params![HISTORY_KEY, value],
        )
        .unwrap();
        db
    }

    /// Stores the result of a raw SQL expression, e.g. `CAST(X'..' AS TEXT)`.
    pub fn with_sql_expression(expression: &str) -> Self {
        let db = Self::empty_table();
        let conn = Connection::open(&db.path).unwrap();
        conn.execute(
            &format!("INSERT INTO ItemTable (key, value) VALUES (?1, {expression})"),
            params![HISTORY_KEY],
        )
        .unwrap();
        db
    }

    pub fn empty_table() -> Self {
        let db = Self::without_table();
        let conn = Connection::open(&db.path).unwrap();
        conn.execute(
            "CREATE TABLE ItemTable (key TEXT UNIQUE ON CONFLICT REPLACE, value BLOB)",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO ItemTable (key, value) VALUES ('workbench.panel.width', '300')",
            [],
        )
        .unwrap();
        db
    }

    pub fn without_table() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.vscdb");
        Connection::open(&path).unwrap();
        Self { _dir: dir, path }
    }

    pub fn stored_value(&self) -> serde_json::Value {
        let conn = Connection::open(&self.path).unwrap();
        let raw: String = conn
            .query_row(
                "SELECT value FROM ItemTable WHERE key = ?1",
                params![HISTORY_KEY],
                |row| row.get(0),
            )
            .unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    pub fn other_value(&self) -> String {
        let conn = Connection::open(&self.path).unwrap();
        conn.query_row(
            "SELECT value FROM ItemTable WHERE key = 'workbench.panel.width'",
            [],
            |row| row.get(0),
        )
        .unwrap()
    }

    pub fn bytes(&self) -> Vec<u8> {
        std::fs::read(&self.path).unwrap()
    }
}

pub fn entry_paths(value: &serde_json::Value) -> Vec<String> {
    value["entries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| {
            entry["fileUri"]
                .as_str()
                .or_else(|| entry["folderUri"].as_str())
                .or_else(|| entry["workspace"]["configPath"].as_str())
                .or_else(|| entry.as_str())
                .unwrap()
                .to_string()
        })
        .collect()
}
