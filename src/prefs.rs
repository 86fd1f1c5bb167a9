//! Local preference storage.
//!
//! [`FileStore`] keeps values across runs, [`MemoryStore`] for the lifetime of
//! the process only. [`Preferences`] puts typed accessors for favorites, the
//! filter sidebar, the view mode and edit hand-off payloads on top.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::catalog::FilterOptions;
use crate::config::MarketConfig;
use crate::error::Error;

pub const FAVORITES_KEY: &str = "favorites";
pub const FILTER_OPTIONS_KEY: &str = "filterOptions";
pub const VIEW_MODE_KEY: &str = "viewMode";

const STORE_FILE: &str = "preferences.json";

/// A string key/value store
pub trait KeyValueStore: fmt::Debug + Send {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&mut self, key: &str, value: String) -> Result<(), Error>;

    fn remove(&mut self, key: &str) -> Result<Option<String>, Error>;
}

/// Process-lifetime storage, also used for session hand-offs
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), Error> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<Option<String>, Error> {
        Ok(self.values.remove(key))
    }
}

/// Storage backed by one JSON object in `{dir}/preferences.json`
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileStore {
    /// Open the store in `dir`, creating the directory if needed.
    ///
    /// An unreadable or corrupt file starts the store empty.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, Error> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = dir.join(STORE_FILE);

        let values = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|err| {
                warn!(path = %path.display(), "ignoring corrupt preference file: {}", err);
                BTreeMap::new()
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };
        debug!(path = %path.display(), keys = values.len(), "opened preference store");

        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), Error> {
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(&self.values)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), Error> {
        self.values.insert(key.to_string(), value);
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<Option<String>, Error> {
        let removed = self.values.remove(key);
        if removed.is_some() {
            self.flush()?;
        }
        Ok(removed)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Grid,
    List,
}

/// Records handed from an admin list to its edit page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    Product,
    User,
}

impl EditKind {
    pub fn key(&self) -> &'static str {
        match self {
            EditKind::Product => "editingProduct",
            EditKind::User => "editingUser",
        }
    }
}

/// Typed preferences over a persistent store plus a session store
#[derive(Debug)]
pub struct Preferences {
    store: Box<dyn KeyValueStore>,
    session: MemoryStore,
}

impl Preferences {
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        Self {
            store: Box::new(store),
            session: MemoryStore::new(),
        }
    }

    /// Nothing outlives the process
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    pub fn open(dir: impl AsRef<Path>) -> Result<Self, Error> {
        Ok(Self::new(FileStore::open(dir)?))
    }

    /// On disk under `prefs_dir` when configured, in memory otherwise
    pub fn from_config(config: &MarketConfig) -> Result<Self, Error> {
        match &config.prefs_dir {
            Some(dir) => Self::open(dir),
            None => {
                info!("no preference directory configured, keeping preferences in memory");
                Ok(Self::in_memory())
            }
        }
    }

    /// Decode a stored JSON value; garbage reads as absent
    fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.store.get(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(key, "ignoring unreadable preference: {}", err);
                None
            }
        }
    }

    fn write<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), Error> {
        let raw = serde_json::to_string(value)?;
        self.store.set(key, raw)
    }

    /// Favorite product ids in the order they were added
    pub fn favorites(&self) -> Vec<String> {
        self.read(FAVORITES_KEY).unwrap_or_default()
    }

    pub fn is_favorite(&self, product_id: &str) -> bool {
        self.favorites().iter().any(|id| id == product_id)
    }

    /// Add or remove a favorite; returns whether it is now a favorite
    pub fn toggle_favorite(&mut self, product_id: &str) -> Result<bool, Error> {
        let mut favorites = self.favorites();
        let now_favorite = match favorites.iter().position(|id| id == product_id) {
            Some(index) => {
                favorites.remove(index);
                false
            }
            None => {
                favorites.push(product_id.to_string());
                true
            }
        };
        self.write(FAVORITES_KEY, &favorites)?;
        Ok(now_favorite)
    }

    pub fn clear_favorites(&mut self) -> Result<(), Error> {
        self.store.remove(FAVORITES_KEY).map(|_| ())
    }

    /// The last used filter sidebar state, defaults when never saved
    pub fn filter_options(&self) -> FilterOptions {
        self.read(FILTER_OPTIONS_KEY).unwrap_or_default()
    }

    pub fn set_filter_options(&mut self, options: &FilterOptions) -> Result<(), Error> {
        self.write(FILTER_OPTIONS_KEY, options)
    }

    pub fn reset_filter_options(&mut self) -> Result<(), Error> {
        self.store.remove(FILTER_OPTIONS_KEY).map(|_| ())
    }

    pub fn view_mode(&self) -> ViewMode {
        self.read(VIEW_MODE_KEY).unwrap_or_default()
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) -> Result<(), Error> {
        self.write(VIEW_MODE_KEY, &mode)
    }

    /// Park a record for the edit page
    pub fn stash_edit<T: Serialize>(&mut self, kind: EditKind, record: &T) -> Result<(), Error> {
        let raw = serde_json::to_string(record)?;
        self.session.set(kind.key(), raw)
    }

    /// Take the parked record; a second call returns `None`
    pub fn take_edit<T: DeserializeOwned>(&mut self, kind: EditKind) -> Result<Option<T>, Error> {
        match self.session.remove(kind.key())? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }
}
