use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::PrefsError;

/// Per-user scratch space holding a submitted form until it is saved.
pub trait Session {
    fn get(&self, key: &str) -> Option<String>;

    /// Forget `keys`. Unknown keys are ignored.
    fn clear(&mut self, keys: &[&str]) -> Result<(), PrefsError>;
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemorySession {
    values: BTreeMap<String, String>,
}

impl MemorySession {
    pub fn new() -> MemorySession {
        MemorySession::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> MemorySession
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        MemorySession {
            values: pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Session for MemorySession {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn clear(&mut self, keys: &[&str]) -> Result<(), PrefsError> {
        for key in keys {
            self.values.remove(*key);
        }
        Ok(())
    }
}

/// A pending submission stored as a flat TOML table of strings.
///
/// Clearing rewrites the file atomically and removes it once nothing is left.
#[derive(Debug)]
pub struct SubmissionFile {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl SubmissionFile {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<SubmissionFile, PrefsError> {
        let path = path.as_ref().to_path_buf();
        let data = fs::read_to_string(&path).map_err(|source| PrefsError::Storage {
            path: path.clone(),
            source,
        })?;
        let values = toml::from_str(&data).map_err(|source| PrefsError::Decode {
            path: path.clone(),
            source,
        })?;
        Ok(SubmissionFile { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fill a key only when the submission does not carry it already.
    pub fn insert_missing(&mut self, key: &str, value: impl Into<String>) {
        self.values
            .entry(key.to_string())
            .or_insert_with(|| value.into());
    }

    fn write(&self) -> Result<(), PrefsError> {
        let storage_error = |source| PrefsError::Storage {
            path: self.path.clone(),
            source,
        };

        if self.values.is_empty() {
            return match fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
                Err(err) => Err(storage_error(err)),
            };
        }

        let data = toml::to_string(&self.values)?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut file = NamedTempFile::new_in(dir).map_err(storage_error)?;
        file.write_all(data.as_bytes()).map_err(storage_error)?;
        file.persist(&self.path)
            .map_err(|err| storage_error(err.error))?;
        Ok(())
    }
}

impl Session for SubmissionFile {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn clear(&mut self, keys: &[&str]) -> Result<(), PrefsError> {
        let before = self.values.len();
        for key in keys {
            self.values.remove(*key);
        }
        if self.values.len() != before {
            self.write()?;
        }
        Ok(())
    }
}
