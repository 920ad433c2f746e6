use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use rusqlite::{Connection, params};
use tracing::{debug, info, warn};

use crate::migrate;
use crate::models::{Document, Theme};

/// Key holding the serialized document.
pub const DOCUMENT_KEY: &str = "document";
/// Raw text of the last stored document that could not be read.
pub const DOCUMENT_BACKUP_KEY: &str = "document.unreadable";
pub const THEME_KEY: &str = "theme";

/// Local key-value store backed by a single SQLite table.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open store: {}", path.display()))?;
        let store = Store { conn };
        store.migrate()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Store { conn };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS kv_store (
                    key TEXT PRIMARY KEY NOT NULL,
                    value TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                PRAGMA user_version = 1;",
            )?;
        }

        Ok(())
    }

    // --- Raw key-value access ---

    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let now = Local::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO kv_store (key, value, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![key, value, now],
            )
            .with_context(|| format!("Failed to write '{key}'"))?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM kv_store WHERE key = ?1")?;
        let mut rows = stmt.query(params![key])?;
        if let Some(row) = rows.next()? {
            Ok(Some(row.get(0)?))
        } else {
            Ok(None)
        }
    }

    pub fn delete(&self, key: &str) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
        Ok(rows > 0)
    }

    // --- Document ---

    /// Read the stored document. A missing or unreadable document yields a
    /// fresh one; unreadable text is copied to [`DOCUMENT_BACKUP_KEY`] first.
    pub fn load_document(&self) -> Result<Document> {
        let Some(raw) = self.get(DOCUMENT_KEY)? else {
            debug!("no stored document, starting fresh");
            return Ok(Document::default());
        };

        let parsed = serde_json::from_str::<serde_json::Value>(&raw)
            .map_err(anyhow::Error::from)
            .and_then(migrate::upgrade);
        match parsed {
            Ok(doc) => Ok(doc),
            Err(e) => {
                let reason = format!("{e:#}");
                warn!(%reason, "stored document is unreadable, starting fresh");
                self.set(DOCUMENT_BACKUP_KEY, &raw)?;
                info!(key = DOCUMENT_BACKUP_KEY, "kept a copy of the unreadable document");
                Ok(Document::default())
            }
        }
    }

    /// Overwrite the stored document in a single statement.
    pub fn save_document(&self, doc: &Document) -> Result<()> {
        let json = serde_json::to_string(doc).context("Failed to serialize document")?;
        self.set(DOCUMENT_KEY, &json)?;
        debug!(
            bytes = json.len(),
            ingredients = doc.ingredients.len(),
            meals = doc.meals.len(),
            days = doc.days.len(),
            "saved document"
        );
        Ok(())
    }

    // --- Theme preference ---

    /// Stored display mode; unknown values read as the default.
    pub fn theme(&self) -> Result<Theme> {
        Ok(self
            .get(THEME_KEY)?
            .and_then(|v| Theme::parse(&v).ok())
            .unwrap_or_default())
    }

    pub fn set_theme(&self, theme: Theme) -> Result<()> {
        self.set(THEME_KEY, theme.as_str())
    }
}
