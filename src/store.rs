//! Durable storage for the contact book
//!
//! The whole book lives in a single JSON file inside a data directory. The
//! directory is created on demand; a missing file is the normal first-run
//! state and loads as an empty book.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use log::{debug, info, warn};
use thiserror::Error;

use crate::models::ContactBook;

/// Data directory used when nothing else is configured
pub const DEFAULT_CONTACTS_DIR: &str = "data/contacts";

/// File name of the contact book inside the data directory
pub const DEFAULT_CONTACTS_FILE: &str = "contacts.json";

/// Environment variable that overrides the data directory
pub const CONTACTS_DIR_ENV: &str = "CONTACTS_DIR";

/// Errors that can occur while reading or writing the contact book
#[derive(Debug, Error)]
pub enum StoreError {
    /// The file exists but could not be opened or read
    #[error("Contacts file not accessible: {path}: {source}")]
    Inaccessible { path: PathBuf, source: io::Error },

    /// The data directory could not be created
    #[error("Could not create contacts directory {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },

    /// The file was read but does not hold a contact book
    #[error("Contacts file is corrupt: {path}: {source}")]
    Corrupt { path: PathBuf, source: serde_json::Error },

    /// Writing the file failed
    #[error("Could not write contacts file {path}: {source}")]
    Write { path: PathBuf, source: io::Error },

    /// The book could not be serialized
    #[error("Could not serialize contacts: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Where the contact book is stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
    pub file_name: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(DEFAULT_CONTACTS_DIR)
    }
}

impl StoreConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        StoreConfig {
            data_dir: data_dir.into(),
            file_name: DEFAULT_CONTACTS_FILE.to_string(),
        }
    }

    pub fn with_file_name(mut self, file_name: &str) -> Self {
        self.file_name = file_name.to_string();
        self
    }

    /// Use `CONTACTS_DIR` if set, otherwise the relative default
    pub fn from_env() -> Self {
        match std::env::var_os(CONTACTS_DIR_ENV) {
            Some(dir) if !dir.is_empty() => Self::new(PathBuf::from(dir)),
            _ => Self::default(),
        }
    }

    /// Per-user location under the platform data directory
    pub fn user_data_dir() -> Result<Self> {
        let dir = dirs::data_dir()
            .ok_or_else(|| anyhow!("Could not determine data directory"))?
            .join("contactbook")
            .join("contacts");
        Ok(Self::new(dir))
    }

    pub fn contacts_path(&self) -> PathBuf {
        self.data_dir.join(&self.file_name)
    }
}

/// Result of [`ContactStore::load`].
///
/// Loading never fails outright. When something went wrong the book is
/// empty and `problem` says why, so the caller can decide how loudly to
/// complain.
#[derive(Debug)]
#[must_use]
pub struct LoadOutcome {
    pub contacts: ContactBook,
    pub problem: Option<StoreError>,
}

impl LoadOutcome {
    fn clean(contacts: ContactBook) -> Self {
        LoadOutcome { contacts, problem: None }
    }

    fn degraded(problem: StoreError) -> Self {
        warn!("Falling back to an empty contact book: {}", problem);
        LoadOutcome {
            contacts: ContactBook::new(),
            problem: Some(problem),
        }
    }

    /// Discard any problem and keep the book
    pub fn into_contacts(self) -> ContactBook {
        self.contacts
    }

    /// Keep the book only if saving it later cannot clobber data that
    /// failed to load. Callers that mutate and save should use this.
    pub fn into_writable(self) -> Result<ContactBook, StoreError> {
        match self.problem {
            Some(problem) => Err(problem),
            None => Ok(self.contacts),
        }
    }
}

/// Reads and writes the contact book file
#[derive(Debug, Clone)]
pub struct ContactStore {
    config: StoreConfig,
    path: PathBuf,
}

impl ContactStore {
    pub fn new(config: StoreConfig) -> Self {
        let path = config.contacts_path();
        ContactStore { config, path }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the contact book.
    ///
    /// A missing file gives an empty book. Any other open failure creates the
    /// data directory if it is absent; if the directory was already there the
    /// failure is reported through [`LoadOutcome::problem`].
    pub fn load(&self) -> LoadOutcome {
        debug!("Loading contacts from {}", self.path.display());

        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No contacts file at {}, starting empty", self.path.display());
                return LoadOutcome::clean(ContactBook::new());
            }
            Err(e) => {
                if self.config.data_dir.exists() {
                    return LoadOutcome::degraded(StoreError::Inaccessible {
                        path: self.path.clone(),
                        source: e,
                    });
                }
                return match self.create_data_dir() {
                    Ok(()) => LoadOutcome::clean(ContactBook::new()),
                    Err(problem) => LoadOutcome::degraded(problem),
                };
            }
        };

        match serde_json::from_reader::<_, ContactBook>(BufReader::new(file)) {
            Ok(contacts) => {
                debug!("Loaded {} contacts", contacts.len());
                LoadOutcome::clean(contacts)
            }
            // Read errors surface through serde_json as io-class errors
            Err(e) if e.is_io() => LoadOutcome::degraded(StoreError::Inaccessible {
                path: self.path.clone(),
                source: io::Error::from(e),
            }),
            Err(e) => LoadOutcome::degraded(StoreError::Corrupt {
                path: self.path.clone(),
                source: e,
            }),
        }
    }

    /// Write the contact book, replacing the previous file.
    ///
    /// If the data directory is missing it is created and the write is
    /// retried once. The write is not atomic.
    pub fn save(&self, contacts: &ContactBook) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(contacts).map_err(StoreError::Serialize)?;

        match self.write_file(&json) {
            Ok(()) => {}
            Err(StoreError::Write { source, .. })
                if source.kind() == ErrorKind::NotFound && !self.config.data_dir.exists() =>
            {
                debug!("Contacts directory missing, creating it and retrying");
                self.create_data_dir()?;
                self.write_file(&json)?;
            }
            Err(e) => return Err(e),
        }

        info!("Saved {} contacts to {}", contacts.len(), self.path.display());
        Ok(())
    }

    fn write_file(&self, json: &[u8]) -> Result<(), StoreError> {
        let write_err = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        let file = File::create(&self.path).map_err(write_err)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(json).map_err(write_err)?;
        writer.flush().map_err(write_err)?;
        Ok(())
    }

    fn create_data_dir(&self) -> Result<(), StoreError> {
        let dir = &self.config.data_dir;
        fs::create_dir_all(dir).map_err(|source| StoreError::CreateDir {
            path: dir.clone(),
            source,
        })?;
        info!("Created contacts directory {}", dir.display());
        Ok(())
    }
}
