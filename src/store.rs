/// Journal entry storage
///
/// Entries are kept as one JSON array under a single key of a small SQLite
/// key-value table. Readers get the whole snapshot; writers replace it.
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use tracing::{debug, warn};

use crate::journal::JournalEntry;
use crate::mood::MoodCatalog;

/// Key the entry list is stored under
pub const ENTRIES_KEY: &str = "journalEntries";

/// Persistence seam for journal entries.
pub trait EntryStore {
    /// Entries for reading. Unreadable stored data loads as an empty list.
    fn load(&self) -> Result<Vec<JournalEntry>>;

    /// Entries that are about to be rewritten. Unreadable stored data is an
    /// error here, so a write never replaces entries it could not read.
    fn load_for_write(&self) -> Result<Vec<JournalEntry>>;

    fn save(&self, entries: &[JournalEntry]) -> Result<()>;

    /// Store a new entry in front of the existing ones (newest first).
    fn append(&self, entry: JournalEntry) -> Result<()> {
        let mut entries = self.load_for_write()?;
        entries.insert(0, entry);
        self.save(&entries)
    }

    /// Set the title of an existing entry. Returns false when no entry has
    /// that id.
    fn backfill_title(&self, id: &str, title: &str) -> Result<bool> {
        let mut entries = self.load_for_write()?;
        let Some(entry) = entries.iter_mut().find(|e| e.id == id) else {
            return Ok(false);
        };
        entry.set_title(title);
        self.save(&entries)?;
        Ok(true)
    }
}

/// SQLite-backed key-value store
pub struct SqliteEntryStore {
    conn: Connection,
    catalog: MoodCatalog,
}

impl SqliteEntryStore {
    /// Open or create the store database
    pub fn open(db_path: &Path, catalog: MoodCatalog) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create data directory: {}", parent.display())
                })?;
            }
        }

        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open database at {}", db_path.display()))?;
        Self::init(conn, catalog)
    }

    pub fn in_memory(catalog: MoodCatalog) -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::init(conn, catalog)
    }

    fn init(conn: Connection, catalog: MoodCatalog) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT NOT NULL PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )
        .context("Failed to create kv_store table")?;

        Ok(Self { conn, catalog })
    }

    pub fn get_item(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .with_context(|| format!("Failed to read key '{}'", key))?;
        Ok(value)
    }

    pub fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO kv_store (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )
            .with_context(|| format!("Failed to write key '{}'", key))?;
        Ok(())
    }

    /// Parse a stored entry array, re-resolving moods against the catalog
    fn parse_entries(&self, raw: &str) -> serde_json::Result<Vec<JournalEntry>> {
        let mut entries: Vec<JournalEntry> = serde_json::from_str(raw)?;

        // Saved moods may be stale copies; the catalog is the reference
        for entry in &mut entries {
            if let Some(mood) = self.catalog.find(&entry.mood.id) {
                entry.mood = mood.clone();
            }
        }
        Ok(entries)
    }
}

impl EntryStore for SqliteEntryStore {
    fn load(&self) -> Result<Vec<JournalEntry>> {
        let Some(raw) = self.get_item(ENTRIES_KEY)? else {
            return Ok(Vec::new());
        };

        match self.parse_entries(&raw) {
            Ok(entries) => {
                debug!("Loaded {} entries", entries.len());
                Ok(entries)
            }
            Err(e) => {
                warn!("Stored entries are unreadable, showing none: {}", e);
                Ok(Vec::new())
            }
        }
    }

    fn load_for_write(&self) -> Result<Vec<JournalEntry>> {
        let Some(raw) = self.get_item(ENTRIES_KEY)? else {
            return Ok(Vec::new());
        };

        self.parse_entries(&raw).context(
            "Stored entries are unreadable; refusing to overwrite them. \
             Repair or move the database before adding entries",
        )
    }

    fn save(&self, entries: &[JournalEntry]) -> Result<()> {
        let raw = serde_json::to_string(entries).context("Failed to serialize entries")?;
        self.set_item(ENTRIES_KEY, &raw)?;
        debug!("Saved {} entries", entries.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mood::Mood;
    use chrono::{TimeZone, Utc};

    fn entry(mood_id: &str, day: u32) -> JournalEntry {
        let mood = MoodCatalog::default().find(mood_id).cloned().unwrap();
        let ts = Utc.with_ymd_and_hms(2026, 10, day, 9, 0, 0).unwrap();
        JournalEntry::new(format!("Entry for day {}", day), mood, ts)
    }

    fn store() -> SqliteEntryStore {
        SqliteEntryStore::in_memory(MoodCatalog::default()).unwrap()
    }

    #[test]
    fn test_missing_key_loads_empty() {
        assert!(store().load().unwrap().is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let store = store();
        let entries = vec![entry("calm", 2), entry("happy", 1)];
        store.save(&entries).unwrap();
        assert_eq!(store.load().unwrap(), entries);
    }

    #[test]
    fn test_append_newest_first() {
        let store = store();
        store.append(entry("calm", 1)).unwrap();
        store.append(entry("sad", 2)).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].mood.id, "sad");
        assert_eq!(loaded[1].mood.id, "calm");
    }

    #[test]
    fn test_backfill_title() {
        let store = store();
        let first = entry("calm", 1);
        let id = first.id.clone();
        store.append(first).unwrap();

        assert!(store.backfill_title(&id, "Quiet morning").unwrap());
        assert!(!store.backfill_title("missing", "Nope").unwrap());
        assert_eq!(
            store.load().unwrap()[0].title.as_deref(),
            Some("Quiet morning")
        );
    }

    #[test]
    fn test_corrupt_json_loads_empty() {
        let store = store();
        store.set_item(ENTRIES_KEY, "[{not json").unwrap();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_moods_resolved_against_catalog() {
        let store = store();
        let mut stale = entry("calm", 1);
        stale.mood.color = "#000000".to_string();
        let mut unknown = entry("calm", 2);
        unknown.mood = Mood::new("mystery", "Mystery", "#123456");
        store.save(&[stale, unknown]).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded[0].mood.color, "#7D9BAF");
        assert_eq!(loaded[1].mood.id, "mystery");
    }

    #[test]
    fn test_set_item_overwrites() {
        let store = store();
        assert_eq!(store.get_item("k").unwrap(), None);
        store.set_item("k", "one").unwrap();
        store.set_item("k", "two").unwrap();
        assert_eq!(store.get_item("k").unwrap().as_deref(), Some("two"));
    }

    #[test]
    fn test_unreadable_entries_are_never_overwritten() {
        let store = store();
        // Second entry's mood lacks the required color
        let valid = serde_json::to_value(entry("happy", 1)).unwrap();
        let mut broken = serde_json::to_value(entry("calm", 2)).unwrap();
        broken["mood"] = serde_json::json!({ "id": "calm", "name": "Calm" });
        let raw = serde_json::to_string(&vec![valid, broken]).unwrap();
        store.set_item(ENTRIES_KEY, &raw).unwrap();

        // Readers degrade to an empty list
        assert!(store.load().unwrap().is_empty());

        // Writers refuse and leave the stored text alone
        let err = store.append(entry("sad", 3)).unwrap_err();
        assert!(err.to_string().contains("refusing to overwrite"));
        assert!(store.backfill_title("anything", "Title").is_err());
        assert_eq!(store.get_item(ENTRIES_KEY).unwrap().as_deref(), Some(raw.as_str()));
    }

    #[test]
    fn test_open_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("entries.sqlite");
        {
            let store = SqliteEntryStore::open(&path, MoodCatalog::default()).unwrap();
            store.append(entry("happy", 3)).unwrap();
        }
        assert!(path.exists());

        let reopened = SqliteEntryStore::open(&path, MoodCatalog::default()).unwrap();
        assert_eq!(reopened.load().unwrap().len(), 1);
    }
}
