//! Storage port for parish records.
//!
//! Records are kept as JSON values grouped by [`Collection`]. The port only
//! knows how to read a whole collection and write it back; typed access and
//! upserts are layered on top.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde_json::Value;

use crate::error::{ParishError, ParishResult};
use crate::model::{MissionStatement, Record, Subscriber};

/// A named group of stored records. The wire name doubles as the sheet name
/// on the sync API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Events,
    Groups,
    Contacts,
    Subscribers,
    Feedback,
    Knowledge,
    Requests,
    Mission,
    /// Local cache of the daily inspiration; never synced.
    Inspiration,
}

impl Collection {
    /// Collections mirrored to the sync API, in pull order.
    pub const SYNCED: [Collection; 8] = [
        Collection::Subscribers,
        Collection::Events,
        Collection::Groups,
        Collection::Contacts,
        Collection::Mission,
        Collection::Feedback,
        Collection::Knowledge,
        Collection::Requests,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Collection::Events => "events",
            Collection::Groups => "groups",
            Collection::Contacts => "contacts",
            Collection::Subscribers => "subscriber",
            Collection::Feedback => "feedback",
            Collection::Knowledge => "knowledge",
            Collection::Requests => "requests",
            Collection::Mission => "mission",
            Collection::Inspiration => "inspiration",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Collection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        let found = Collection::SYNCED
            .into_iter()
            .chain([Collection::Inspiration])
            .find(|c| c.name() == wanted || (wanted == "subscribers" && *c == Collection::Subscribers));

        found.ok_or_else(|| {
            let names: Vec<_> = Collection::SYNCED.iter().map(|c| c.name()).collect();
            format!("Unknown collection '{}'. Available: {}", s, names.join(", "))
        })
    }
}

/// Persistence for raw records, keyed by collection.
pub trait Store {
    fn get(&self, collection: Collection) -> ParishResult<Vec<Value>>;

    fn replace(&mut self, collection: Collection, records: Vec<Value>) -> ParishResult<()>;

    /// Insert `record`, replacing any stored record with the same `id`.
    /// Records without an `id` are appended.
    fn put(&mut self, collection: Collection, record: Value) -> ParishResult<()> {
        let mut records = self.get(collection)?;

        let existing = record_id(&record)
            .and_then(|id| records.iter().position(|r| record_id(r) == Some(id)));

        match existing {
            Some(index) => records[index] = record,
            None => records.push(record),
        }

        self.replace(collection, records)
    }

    /// Drop every record with this `id`. Returns whether anything was removed.
    fn remove(&mut self, collection: Collection, id: &str) -> ParishResult<bool> {
        let mut records = self.get(collection)?;
        let before = records.len();
        records.retain(|r| record_id(r) != Some(id));

        if records.len() == before {
            return Ok(false);
        }

        tracing::debug!(%collection, id, removed = before - records.len(), "removed records");
        self.replace(collection, records)?;
        Ok(true)
    }

    /// Load every record of `T`'s collection, skipping rows that no longer
    /// match the record shape.
    fn load<T: Record>(&self) -> ParishResult<Vec<T>>
    where
        Self: Sized,
    {
        let rows = self.get(T::COLLECTION)?;
        let total = rows.len();

        let records: Vec<T> = rows
            .into_iter()
            .filter_map(|row| match serde_json::from_value(row) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(collection = %T::COLLECTION, "skipping unreadable record: {e}");
                    None
                }
            })
            .collect();

        tracing::debug!(collection = %T::COLLECTION, loaded = records.len(), total, "loaded records");
        Ok(records)
    }

    fn upsert<T: Record>(&mut self, record: &T) -> ParishResult<()>
    where
        Self: Sized,
    {
        self.put(T::COLLECTION, serde_json::to_value(record)?)
    }

    /// Replace `T`'s whole collection with `records`.
    fn save_all<T: Record>(&mut self, records: &[T]) -> ParishResult<()>
    where
        Self: Sized,
    {
        let rows = records
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        self.replace(T::COLLECTION, rows)
    }

    fn delete<T: Record>(&mut self, record: &T) -> ParishResult<bool>
    where
        Self: Sized,
    {
        self.remove(T::COLLECTION, record.id())
    }

    /// Remove every subscriber signed up with `email`, ignoring case and
    /// surrounding whitespace. Returns how many were removed.
    fn unsubscribe(&mut self, email: &str) -> ParishResult<usize>
    where
        Self: Sized,
    {
        let wanted = email.trim().to_lowercase();
        if wanted.is_empty() {
            return Ok(0);
        }

        let subscribers: Vec<Subscriber> = self.load()?;
        let mut removed = 0;
        for subscriber in subscribers
            .iter()
            .filter(|s| s.email.trim().to_lowercase() == wanted)
        {
            if self.delete(subscriber)? {
                removed += 1;
            }
        }

        Ok(removed)
    }

    /// The most recent mission statement, if any has been stored.
    fn mission(&self) -> ParishResult<Option<MissionStatement>>
    where
        Self: Sized,
    {
        let rows = self.get(Collection::Mission)?;
        Ok(rows
            .into_iter()
            .last()
            .and_then(|row| serde_json::from_value(row).ok()))
    }

    fn set_mission(&mut self, mission: &MissionStatement) -> ParishResult<()>
    where
        Self: Sized,
    {
        self.replace(Collection::Mission, vec![serde_json::to_value(mission)?])
    }
}

fn record_id(record: &Value) -> Option<&str> {
    record.get("id").and_then(Value::as_str)
}

/// In-memory store, for tests and short-lived tools.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    collections: HashMap<Collection, Vec<Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn get(&self, collection: Collection) -> ParishResult<Vec<Value>> {
        Ok(self.collections.get(&collection).cloned().unwrap_or_default())
    }

    fn replace(&mut self, collection: Collection, records: Vec<Value>) -> ParishResult<()> {
        self.collections.insert(collection, records);
        Ok(())
    }
}

/// Store backed by one `<collection>.json` array file per collection.
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    root: PathBuf,
}

impl JsonDirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        JsonDirStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, collection: Collection) -> PathBuf {
        self.root.join(format!("{}.json", collection.name()))
    }
}

impl Store for JsonDirStore {
    fn get(&self, collection: Collection) -> ParishResult<Vec<Value>> {
        let path = self.path_for(collection);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(&path)?;
        match serde_json::from_str::<Value>(&content)? {
            Value::Array(records) => Ok(records),
            _ => Err(ParishError::store(
                collection,
                format!("{} does not contain a JSON array", path.display()),
            )),
        }
    }

    fn replace(&mut self, collection: Collection, records: Vec<Value>) -> ParishResult<()> {
        std::fs::create_dir_all(&self.root)?;

        let content = serde_json::to_string_pretty(&Value::Array(records))?;
        std::fs::write(self.path_for(collection), content)?;
        Ok(())
    }
}
