//! Client-only state: favorites, language preference and chat history.
//!
//! Values are stored as JSON strings under fixed keys. The store is injected
//! into the views that need it so tests can use [`MemoryStore`].

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::PortalError;
use crate::i18n::Lang;

pub const FAVORITES_KEY: &str = "mealFavorites";
pub const LANG_KEY: &str = "lang";
pub const WHAT_TO_COOK_CHAT_KEY: &str = "wtc_messages";
pub const MEDICAL_CHAT_KEY: &str = "medical_chat";

/// Key/value store for client state. Last write wins.
pub trait StateStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), PortalError>;
    fn remove(&self, key: &str) -> Result<(), PortalError>;
}

/// Read and decode a JSON value; missing or corrupt entries yield `None`.
pub fn load_json<T: DeserializeOwned>(store: &dyn StateStore, key: &str) -> Option<T> {
    let raw = store.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Ignoring corrupt stored value for '{}': {}", key, e);
            None
        }
    }
}

pub fn save_json<T: Serialize + ?Sized>(
    store: &dyn StateStore,
    key: &str,
    value: &T,
) -> Result<(), PortalError> {
    store.set(key, &serde_json::to_string(value)?)
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PortalError> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PortalError> {
        self.entries().remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, PortalError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        debug!("Client state stored in {}", dir.display());
        Ok(Self { dir })
    }

    fn path(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

impl StateStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path(key)).ok()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PortalError> {
        fs::write(self.path(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PortalError> {
        match fs::remove_file(self.path(key)) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Ordered set of favorite identifiers, loaded once and written on every change.
pub struct Favorites<'s> {
    store: &'s dyn StateStore,
    key: &'static str,
    ids: Vec<String>,
}

impl<'s> Favorites<'s> {
    pub fn load(store: &'s dyn StateStore) -> Self {
        Self::load_key(store, FAVORITES_KEY)
    }

    pub fn load_key(store: &'s dyn StateStore, key: &'static str) -> Self {
        let ids: Vec<String> = load_json(store, key).unwrap_or_default();
        Self { store, key, ids }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|f| f == id)
    }

    /// Add or remove `id`; returns whether it is now a favorite.
    pub fn toggle(&mut self, id: &str) -> Result<bool, PortalError> {
        let mut ids = self.ids.clone();
        let now_favorite = match ids.iter().position(|f| f == id) {
            Some(pos) => {
                ids.remove(pos);
                false
            }
            None => {
                ids.push(id.to_string());
                true
            }
        };
        save_json(self.store, self.key, &ids)?;
        self.ids = ids;
        Ok(now_favorite)
    }

    pub fn clear(&mut self) -> Result<(), PortalError> {
        self.ids.clear();
        self.store.remove(self.key)
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// The language chosen by the user, persisted across runs.
pub struct LanguagePreference;

impl LanguagePreference {
    pub fn load(store: &dyn StateStore, default: Lang) -> Lang {
        store
            .get(LANG_KEY)
            .map(|code| Lang::from_code(code.trim_matches('"')))
            .unwrap_or(default)
    }

    pub fn save(store: &dyn StateStore, lang: Lang) -> Result<(), PortalError> {
        store.set(LANG_KEY, lang.code())
    }
}
