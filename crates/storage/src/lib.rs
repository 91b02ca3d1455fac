use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub mod auth;

pub use auth::AuthGate;

const FLAG_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("unable to resolve local data directory")]
    NoDataDirectory,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Durable home of the admin flag.
pub trait FlagStore {
    fn get(&self) -> Result<bool, StorageError>;
    fn set(&mut self) -> Result<(), StorageError>;
    fn clear(&mut self) -> Result<(), StorageError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryFlagStore {
    flag: bool,
}

impl MemoryFlagStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FlagStore for MemoryFlagStore {
    fn get(&self) -> Result<bool, StorageError> {
        Ok(self.flag)
    }

    fn set(&mut self) -> Result<(), StorageError> {
        self.flag = true;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.flag = false;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FlagEnvelope {
    version: u32,
    is_admin: bool,
}

/// Keeps the flag in `auth.json` under a data directory.
#[derive(Debug, Clone)]
pub struct FileFlagStore {
    root: PathBuf,
}

impl FileFlagStore {
    pub fn from_default_project() -> Result<Self, StorageError> {
        let dirs = ProjectDirs::from("dev", "PageAnalyzer", "PageAnalyzer")
            .ok_or(StorageError::NoDataDirectory)?;

        Ok(Self { root: dirs.data_local_dir().to_path_buf() })
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn flag_path(&self) -> PathBuf {
        self.root.join("auth.json")
    }
}

impl FlagStore for FileFlagStore {
    fn get(&self) -> Result<bool, StorageError> {
        let path = self.flag_path();
        if !path.exists() {
            return Ok(false);
        }

        let bytes = fs::read(path)?;
        let envelope: FlagEnvelope = serde_json::from_slice(&bytes)?;

        Ok(envelope.is_admin)
    }

    fn set(&mut self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root)?;

        let envelope = FlagEnvelope { version: FLAG_SCHEMA_VERSION, is_admin: true };
        let bytes = serde_json::to_vec_pretty(&envelope)?;
        fs::write(self.flag_path(), bytes)?;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        match fs::remove_file(self.flag_path()) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
