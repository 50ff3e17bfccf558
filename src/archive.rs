//! Date-keyed archive of generated report documents.
//!
//! Each report date owns two parallel keys in a flat key-value store:
//! `YYYY-MM-DD_label` holds a human-readable label and
//! `YYYY-MM-DD_document` holds the base64-encoded document bytes.
//! Writing the same date again replaces both.
use crate::error::{ReportError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

const LABEL_SUFFIX: &str = "_label";
const DOCUMENT_SUFFIX: &str = "_document";

pub trait KeyValueStore {
    fn upsert(&mut self, key: &str, value: String) -> Result<()> {
        self.upsert_many(vec![(key.to_string(), value)])
    }
    /// Write all entries or none of them.
    fn upsert_many(&mut self, entries: Vec<(String, String)>) -> Result<()>;
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn keys(&self) -> Result<Vec<String>>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn upsert_many(&mut self, entries: Vec<(String, String)>) -> Result<()> {
        self.entries.extend(entries);
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.keys().cloned().collect())
    }
}

/// A key-value store persisted as one pretty-printed JSON object.
///
/// Every upsert rewrites the file through a sibling temp file and a rename,
/// so a crash never leaves half a file behind. The in-memory map only
/// changes once the file is written.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl JsonFileStore {
    pub fn open(path: &Path) -> Result<Self> {
        let entries = if path.exists() {
            let text = std::fs::read_to_string(path)?;
            if text.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&text)?
            }
        } else {
            BTreeMap::new()
        };
        Ok(Self { path: path.to_path_buf(), entries })
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(entries)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn upsert_many(&mut self, entries: Vec<(String, String)>) -> Result<()> {
        let mut next = self.entries.clone();
        next.extend(entries);
        self.persist(&next)?;
        self.entries = next;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.keys().cloned().collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivedReport {
    pub date: NaiveDate,
    pub label: String,
    pub document: Vec<u8>,
}

pub struct ReportArchive<S> {
    store: S,
}

impl<S: KeyValueStore> ReportArchive<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    fn key(date: NaiveDate, suffix: &str) -> String {
        format!("{}{}", date.format("%Y-%m-%d"), suffix)
    }

    pub fn put(&mut self, date: NaiveDate, label: &str, document: &[u8]) -> Result<()> {
        self.store.upsert_many(vec![
            (Self::key(date, LABEL_SUFFIX), label.to_string()),
            (Self::key(date, DOCUMENT_SUFFIX), STANDARD.encode(document)),
        ])?;
        info!(%date, label, bytes = document.len(), "Archived report");
        Ok(())
    }

    pub fn get(&self, date: NaiveDate) -> Result<Option<ArchivedReport>> {
        let label = self.store.get(&Self::key(date, LABEL_SUFFIX))?;
        let encoded = self.store.get(&Self::key(date, DOCUMENT_SUFFIX))?;
        match (label, encoded) {
            (None, None) => Ok(None),
            (Some(label), Some(encoded)) => Ok(Some(ArchivedReport {
                date,
                label,
                document: STANDARD.decode(encoded.as_bytes())?,
            })),
            _ => Err(ReportError::Archive(format!(
                "archive entry for {} is incomplete",
                date
            ))),
        }
    }

    /// Dates that have a stored document, oldest first.
    pub fn dates(&self) -> Result<Vec<NaiveDate>> {
        let mut dates: Vec<NaiveDate> = self
            .store
            .keys()?
            .iter()
            .filter_map(|k| k.strip_suffix(DOCUMENT_SUFFIX))
            .filter_map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .collect();
        dates.sort();
        dates.dedup();
        Ok(dates)
    }
}
