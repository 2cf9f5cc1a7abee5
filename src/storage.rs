//! Storage port and adapters
//!
//! The engine never touches storage. Hosts persist opportunities through a
//! small key-value port holding JSON documents, the same shape the browser
//! board keeps in local storage:
//!
//! | Key              | Value |
//! |------------------|-------|
//! | `opportunities`  | JSON array of opportunities |
//! | `columns`        | JSON array of `{ id, title }` |
//! | `show_{id}`      | cached share payload for the public show page |
//!
//! Reads are lenient: records that fail normalization are skipped with a
//! warning instead of failing the whole board. Writes never drop them:
//! upserts and deletes edit the stored array in place, and a board save
//! carries unreadable records over after the board's own.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::boundary::{json_kind, opportunities_from_value, opportunity_from_value, record_id};
use crate::error::{OppBoardError, Result};
use crate::logic::board::Board;
use crate::model::{default_columns, Column, Opportunity};
use crate::share::SharePayload;

pub const OPPORTUNITIES_KEY: &str = "opportunities";
pub const COLUMNS_KEY: &str = "columns";
pub const SHOW_KEY_PREFIX: &str = "show_";

// ============================================================================
// Port
// ============================================================================

/// Key-value store of JSON documents.
pub trait KeyValueStore {
    /// Value stored under `key`, `None` when absent.
    fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: Value) -> Result<()>;

    /// Remove `key`; removing a missing key is not an error.
    fn remove(&mut self, key: &str) -> Result<()>;
}

// ============================================================================
// Adapters
// ============================================================================

/// In-memory store, for tests and embedding hosts that persist elsewhere.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// A single JSON object on disk; every write rewrites the file.
///
/// Writes go to a sibling temp file first and are renamed into place.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: Map<String, Value>,
}

impl JsonFileStore {
    /// Open `path`, starting empty when the file does not exist yet.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let content = fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                Map::new()
            } else {
                match serde_json::from_str::<Value>(&content)? {
                    Value::Object(map) => map,
                    _ => {
                        return Err(OppBoardError::storage(format!(
                            "{} does not contain a JSON object",
                            path.display()
                        )))
                    }
                }
            }
        } else {
            debug!(path = %path.display(), "store file missing, starting empty");
            Map::new()
        };
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

// ============================================================================
// Repository
// ============================================================================

/// Opportunity persistence on top of any [`KeyValueStore`].
#[derive(Debug, Clone, Default)]
pub struct OpportunityRepository<S> {
    store: S,
}

impl<S: KeyValueStore> OpportunityRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    /// Every readable opportunity, in stored order.
    pub fn load_all(&self) -> Result<Vec<Opportunity>> {
        Ok(self
            .store
            .get(OPPORTUNITIES_KEY)?
            .map(|value| opportunities_from_value(&value))
            .unwrap_or_default())
    }

    /// Stored opportunity records as raw JSON, readable or not.
    ///
    /// Fails when the stored value is not an array, so writers never
    /// replace a document they could not read.
    fn stored_records(&self) -> Result<Vec<Value>> {
        match self.store.get(OPPORTUNITIES_KEY)? {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => Ok(items),
            Some(other) => Err(OppBoardError::storage(format!(
                "'{}' holds a {}, not an array",
                OPPORTUNITIES_KEY,
                json_kind(&other)
            ))),
        }
    }

    /// Replace every readable stored record with `opportunities`.
    ///
    /// Records that cannot be read are kept, after the new ones.
    pub fn save_all(&mut self, opportunities: &[Opportunity]) -> Result<()> {
        let unreadable: Vec<Value> = self
            .stored_records()?
            .into_iter()
            .filter(|record| opportunity_from_value(record).is_none())
            .collect();
        if !unreadable.is_empty() {
            warn!(count = unreadable.len(), "keeping unreadable opportunity records");
        }

        let mut records = Vec::with_capacity(opportunities.len() + unreadable.len());
        for opportunity in opportunities {
            records.push(serde_json::to_value(opportunity)?);
        }
        records.extend(unreadable);
        self.store.set(OPPORTUNITIES_KEY, Value::Array(records))
    }

    pub fn get(&self, id: &str) -> Result<Option<Opportunity>> {
        let Some(Value::Array(items)) = self.store.get(OPPORTUNITIES_KEY)? else {
            return Ok(None);
        };
        Ok(items
            .iter()
            .filter_map(opportunity_from_value)
            .find(|o| o.id == id))
    }

    /// Replace the stored record with the same id, or append it.
    ///
    /// Every other record is written back exactly as it was stored.
    pub fn upsert(&mut self, opportunity: &Opportunity) -> Result<()> {
        let mut records = self.stored_records()?;
        let value = serde_json::to_value(opportunity)?;
        match records
            .iter_mut()
            .find(|record| record_id(record).as_deref() == Some(opportunity.id.as_str()))
        {
            Some(existing) => *existing = value,
            None => records.push(value),
        }
        debug!(opportunity = %opportunity.id, records = records.len(), "upserted opportunity");
        self.store.set(OPPORTUNITIES_KEY, Value::Array(records))
    }

    /// Returns false when nothing had that id.
    pub fn delete(&mut self, id: &str) -> Result<bool> {
        let mut records = self.stored_records()?;
        let before = records.len();
        records.retain(|record| record_id(record).as_deref() != Some(id));
        if records.len() == before {
            return Ok(false);
        }
        self.store.set(OPPORTUNITIES_KEY, Value::Array(records))?;
        Ok(true)
    }

    /// Stored columns, or the defaults when none are stored or they are unreadable.
    pub fn load_columns(&self) -> Result<Vec<Column>> {
        let Some(value) = self.store.get(COLUMNS_KEY)? else {
            return Ok(default_columns());
        };
        match serde_json::from_value::<Vec<Column>>(value) {
            Ok(columns) if !columns.is_empty() => Ok(columns),
            Ok(_) => Ok(default_columns()),
            Err(e) => {
                warn!(error = %e, "unreadable columns, using defaults");
                Ok(default_columns())
            }
        }
    }

    pub fn load_board(&self) -> Result<Board> {
        Ok(Board {
            columns: self.load_columns()?,
            opportunities: self.load_all()?,
        })
    }

    pub fn save_board(&mut self, board: &Board) -> Result<()> {
        self.store.set(COLUMNS_KEY, serde_json::to_value(&board.columns)?)?;
        self.save_all(&board.opportunities)
    }

    /// Remember a payload opened on the public show page.
    pub fn cache_show(&mut self, id: &str, payload: &SharePayload) -> Result<()> {
        let key = format!("{}{}", SHOW_KEY_PREFIX, id);
        self.store.set(&key, serde_json::to_value(payload)?)
    }

    pub fn cached_show(&self, id: &str) -> Result<Option<SharePayload>> {
        let key = format!("{}{}", SHOW_KEY_PREFIX, id);
        match self.store.get(&key)? {
            Some(value) => match SharePayload::from_value(&value) {
                Ok(payload) => Ok(Some(payload)),
                Err(e) => {
                    warn!(key = %key, error = %e, "unreadable cached show payload");
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }
}
