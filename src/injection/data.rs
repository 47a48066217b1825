//! Persisted data objects and their backing store
//!
//! A data object is loaded from its path when present. When absent, its
//! default value is written so an operator can fill it in.

use log::info;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::error::InjectionError;

/// A configuration object persisted as JSON at a fixed relative path
pub trait Data: Serialize + DeserializeOwned + Default + Send + Sync + 'static {
    const PATH: &'static str;
    /// Halt startup after generating a missing file
    const KILL_IF_GENERATED: bool = true;
}

/// Raw string storage keyed by relative path
pub trait DataStore: Send + Sync {
    /// Contents at `path`, `None` if nothing is stored there
    fn read(&self, path: &str) -> Result<Option<String>, InjectionError>;
    fn write(&self, path: &str, contents: &str) -> Result<(), InjectionError>;
}

/// Files under a base directory
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    base: PathBuf,
}

impl JsonFileStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.base.join(path)
    }
}

impl DataStore for JsonFileStore {
    fn read(&self, path: &str) -> Result<Option<String>, InjectionError> {
        match fs::read_to_string(self.resolve(path)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(InjectionError::Persistence {
                path: path.to_string(),
                source,
            }),
        }
    }

    fn write(&self, path: &str, contents: &str) -> Result<(), InjectionError> {
        let full = self.resolve(path);
        let persistence = |source| InjectionError::Persistence {
            path: path.to_string(),
            source,
        };
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).map_err(persistence)?;
        }
        fs::write(&full, contents).map_err(persistence)
    }
}

/// Outcome of hydrating one data object
pub(crate) struct LoadedData<T> {
    pub value: T,
    pub generated: bool,
}

pub(crate) fn load_or_generate<T: Data>(store: &dyn DataStore) -> Result<LoadedData<T>, InjectionError> {
    let malformed = |source| InjectionError::MalformedData {
        path: T::PATH.to_string(),
        source,
    };

    if let Some(raw) = store.read(T::PATH)? {
        let value = serde_json::from_str(&raw).map_err(malformed)?;
        return Ok(LoadedData {
            value,
            generated: false,
        });
    }

    let value = T::default();
    let json = serde_json::to_string_pretty(&value).map_err(malformed)?;
    store.write(T::PATH, &json)?;
    info!("📝 Generated default data file {}", T::PATH);

    Ok(LoadedData {
        value,
        generated: true,
    })
}

/// Write `value` back to its path
pub fn save_data<T: Data>(store: &dyn DataStore, value: &T) -> Result<(), InjectionError> {
    let json = serde_json::to_string_pretty(value).map_err(|source| InjectionError::MalformedData {
        path: T::PATH.to_string(),
        source,
    })?;
    store.write(T::PATH, &json)
}
