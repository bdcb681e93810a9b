//! Saving and discarding the elite network.
//!
//! The elite lives under [`ELITE_KEY`] in a string key-value store, serialized
//! as `{"levels": [...]}`. Anything implementing [`KeyValueStore`] can hold it.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::brain::Network;
use crate::error::PersistError;

pub const ELITE_KEY: &str = "bestBrain";

pub type Result<T> = std::result::Result<T, PersistError>;

/// A durable string store.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    /// Removing a missing key is not an error.
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Where the population keeps its elite between runs.
pub trait EliteStore {
    fn load(&self) -> Result<Option<Network>>;
    fn save(&mut self, network: &Network) -> Result<()>;
    fn discard(&mut self) -> Result<()>;
}

impl<K: KeyValueStore> EliteStore for K {
    fn load(&self) -> Result<Option<Network>> {
        match self.get(ELITE_KEY)? {
            Some(json) => Ok(Some(Network::from_json(&json)?)),
            None => Ok(None),
        }
    }

    fn save(&mut self, network: &Network) -> Result<()> {
        // serialize first so the store only ever sees a finished snapshot
        let json = network.to_json()?;
        self.set(ELITE_KEY, &json)
    }

    fn discard(&mut self) -> Result<()> {
        self.remove(ELITE_KEY)
    }
}

#[derive(Default, Debug)]
pub struct MemoryStore(FxHashMap<String, String>);

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.0.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.0.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.0.remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per key inside `root`.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl AsRef<Path>) -> FileStore {
        FileStore { root: root.as_ref().to_path_buf() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        let path = self.path(key);
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, value)?;
        fs::rename(&staging, &path)?;
        debug!(path = %path.display(), bytes = value.len(), "stored");
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        match fs::remove_file(self.path(key)) {
            Err(err) if err.kind() != ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }
}
