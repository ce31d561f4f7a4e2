use relative_path::{RelativePath, RelativePathBuf};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Invalid storage key: {0:?}")]
    InvalidKey(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid storage directory: {0}")]
    InvalidStorageDir(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// String key to JSON string persistence
pub trait KeyValueStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// In-process storage, lost on exit
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per key under a root directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Use `root`, creating it when missing
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        validate_storage_dir(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn key_path(&self, key: &str) -> Result<RelativePathBuf, StorageError> {
        validate_key(key)?;
        Ok(RelativePathBuf::from(format!("{key}.json")))
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let relative = self.key_path(key)?;
        match read_file(&relative, &self.root) {
            Ok(content) => Ok(Some(content)),
            Err(StorageError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let relative = self.key_path(key)?;
        write_file(&relative, &self.root, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        let path = self.key_path(key)?.to_path(&self.root);
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Keys become file names, so only a single plain path component is allowed
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

/// Read a stored file and return its content
pub fn read_file(relative_path: &RelativePath, root: &Path) -> Result<String, StorageError> {
    let absolute_path = relative_path.to_path(root);
    fs::read_to_string(&absolute_path).map_err(StorageError::Io)
}

/// Write content to a stored file
pub fn write_file(
    relative_path: &RelativePath,
    root: &Path,
    content: &str,
) -> Result<(), StorageError> {
    let absolute_path = relative_path.to_path(root);

    // Create parent directories if they don't exist
    if let Some(parent) = absolute_path.parent() {
        fs::create_dir_all(parent).map_err(StorageError::Io)?;
    }

    fs::write(&absolute_path, content).map_err(StorageError::Io)
}

pub fn validate_storage_dir(path: &Path) -> Result<(), StorageError> {
    if !path.exists() || !path.is_dir() {
        return Err(StorageError::InvalidStorageDir(format!(
            "{} is not a directory",
            path.display()
        )));
    }

    Ok(())
}
