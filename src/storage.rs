use std::fs::{self, File};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::{AppConfig, ConfigFile};
use crate::models::Session;

const CONFIG_FILE: &str = "config.json";
const SESSION_FILE: &str = "session.json";
const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub struct Storage {
    root: PathBuf,
}

impl Storage {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ensure_dirs(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root)?;
        Ok(())
    }

    pub fn load_config(&self) -> Result<AppConfig, StorageError> {
        match self.load_json::<ConfigFile>(self.root.join(CONFIG_FILE)) {
            Ok(file) => Ok(file.settings),
            Err(StorageError::Io(err)) if err.kind() == ErrorKind::NotFound => {
                log::debug!("no config file in {}, using defaults", self.root.display());
                Ok(AppConfig::default())
            }
            Err(err) => Err(err),
        }
    }

    pub fn save_config(&self, config: &AppConfig) -> Result<(), StorageError> {
        let file = ConfigFile {
            schema_version: SCHEMA_VERSION,
            settings: config.clone(),
        };
        self.write_atomic(self.root.join(CONFIG_FILE), &file)
    }

    pub fn load_session(&self) -> Result<Option<Session>, StorageError> {
        match self.load_json(self.root.join(SESSION_FILE)) {
            Ok(session) => Ok(Some(session)),
            Err(StorageError::Io(err)) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub fn save_session(&self, session: &Session) -> Result<(), StorageError> {
        self.write_atomic(self.root.join(SESSION_FILE), session)
    }

    pub fn clear_session(&self) -> Result<(), StorageError> {
        match fs::remove_file(self.root.join(SESSION_FILE)) {
            Err(err) if err.kind() != ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }

    fn load_json<T: DeserializeOwned>(&self, path: PathBuf) -> Result<T, StorageError> {
        let mut file = File::open(path)?;
        let mut buf = String::new();
        file.read_to_string(&mut buf)?;
        Ok(serde_json::from_str(&buf)?)
    }

    fn write_atomic<T: Serialize>(&self, path: PathBuf, data: &T) -> Result<(), StorageError> {
        let temp_path = path.with_extension("tmp");
        let json = serde_json::to_vec_pretty(data)?;
        {
            let mut file = File::create(&temp_path)?;
            file.write_all(&json)?;
            file.sync_all()?;
        }
        fs::rename(temp_path, path)?;
        Ok(())
    }
}
