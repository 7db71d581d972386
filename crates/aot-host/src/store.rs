//! Position stores: an in-memory map and a flat JSON file.

use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
    sync::atomic::{AtomicUsize, Ordering},
};

use parking_lot::Mutex;
use serde_json::{Map, Value};
use tracing::debug;

use crate::{Result, ops::PositionStore};

/// Process-lifetime store.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, i32>>,
    /// Number of successful `set` calls.
    writes: AtomicUsize,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `entries`.
    pub fn with<'a>(entries: impl IntoIterator<Item = (&'a str, i32)>) -> Self {
        let values = entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        Self {
            values: Mutex::new(values),
            writes: AtomicUsize::new(0),
        }
    }

    /// Number of writes since creation.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl PositionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<i32> {
        self.values.lock().get(key).copied()
    }

    fn set(&self, key: &str, value: i32) -> Result<()> {
        self.values.lock().insert(key.to_string(), value);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Store backed by a JSON object in a single file, rewritten on every `set`.
///
/// Values that are not integers (for example written by an older shell) read
/// as absent.
pub struct JsonFileStore {
    path: PathBuf,
    values: Mutex<Map<String, Value>>,
}

impl JsonFileStore {
    /// Open the store at `path`; a missing file is an empty store.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let values = match fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => Map::new(),
            Ok(text) => match serde_json::from_str::<Value>(&text)? {
                Value::Object(map) => map,
                _ => Map::new(),
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => Map::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), keys = values.len(), "opened position store");
        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    /// File backing the store.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PositionStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<i32> {
        self.values
            .lock()
            .get(key)
            .and_then(Value::as_i64)
            .and_then(|v| i32::try_from(v).ok())
    }

    fn set(&self, key: &str, value: i32) -> Result<()> {
        let text = {
            let mut values = self.values.lock();
            values.insert(key.to_string(), Value::from(value));
            serde_json::to_string_pretty(&*values)?
        };
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&self.path, text)?;
        Ok(())
    }
}
