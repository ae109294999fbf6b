//! Q-table persistence.
//!
//! The agent hands its table to a [`QTableStore`] as a flat
//! [`QTableSnapshot`] after every training call and reads it back when it is
//! constructed. Two stores are provided:
//! - [`MemoryStore`]: keeps the last snapshot in memory (the default).
//! - [`JsonFileStore`]: writes the snapshot to a JSON file.
//!
//! ## Example
//!
//! ```rust,ignore
//! use maze_agents::{JsonFileStore, OccupancyGrid, QLearningAgent, QLearningConfig};
//!
//! let store = JsonFileStore::new("qtable.json");
//! let mut agent = QLearningAgent::new(OccupancyGrid::bordered(8, 8), QLearningConfig::default())
//!     .with_store(Box::new(store));
//! agent.randomize_endpoints()?;
//! agent.train_once()?; // table saved to qtable.json
//! ```

use crate::types::Location;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Defines errors that can occur during table persistence operations.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// An error occurred during file I/O.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// An error occurred while serializing the table.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// An error occurred while deserializing the table.
    #[error("Deserialization error: {0}")]
    Deserialization(String),
    /// The stored data does not fit the agent's grid.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// One table row: a state and its action values in direction order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateEntry {
    pub location: Location,
    pub values: Vec<f64>,
}

/// A flat, serializable copy of a Q-table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QTableSnapshot {
    pub states: Vec<StateEntry>,
}

impl QTableSnapshot {
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Checks that every row has exactly `actions` values.
    pub fn check_width(&self, actions: usize) -> Result<(), PersistenceError> {
        match self.states.iter().find(|s| s.values.len() != actions) {
            Some(entry) => Err(PersistenceError::InvalidFormat(format!(
                "state {} has {} values, expected {}",
                entry.location,
                entry.values.len(),
                actions
            ))),
            None => Ok(()),
        }
    }

    pub fn to_json(&self, pretty: bool) -> Result<Vec<u8>, PersistenceError> {
        let bytes = if pretty {
            serde_json::to_vec_pretty(self)
        } else {
            serde_json::to_vec(self)
        };
        bytes.map_err(|e| PersistenceError::Serialization(e.to_string()))
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, PersistenceError> {
        serde_json::from_slice(bytes).map_err(|e| PersistenceError::Deserialization(e.to_string()))
    }
}

/// Load/save collaborator for the learned table.
pub trait QTableStore {
    /// Returns the stored table, or `None` if nothing has been saved.
    fn load(&self) -> Result<Option<QTableSnapshot>, PersistenceError>;

    /// Replaces the stored table.
    fn save(&mut self, snapshot: &QTableSnapshot) -> Result<(), PersistenceError>;

    /// Deletes the stored table.
    fn clear(&mut self) -> Result<(), PersistenceError>;
}

/// Keeps the most recent snapshot in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    snapshot: Option<QTableSnapshot>,
    saves: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `snapshot`.
    pub fn with_snapshot(snapshot: QTableSnapshot) -> Self {
        Self {
            snapshot: Some(snapshot),
            saves: 0,
        }
    }

    /// Number of successful saves.
    pub fn saves(&self) -> u64 {
        self.saves
    }
}

impl QTableStore for MemoryStore {
    fn load(&self) -> Result<Option<QTableSnapshot>, PersistenceError> {
        Ok(self.snapshot.clone())
    }

    fn save(&mut self, snapshot: &QTableSnapshot) -> Result<(), PersistenceError> {
        self.snapshot = Some(snapshot.clone());
        self.saves += 1;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), PersistenceError> {
        self.snapshot = None;
        Ok(())
    }
}

/// Options for [`JsonFileStore`].
#[derive(Debug, Clone)]
pub struct PersistenceOptions {
    /// If `true`, pretty-prints JSON output to be more human-readable.
    pub pretty: bool,
}

impl Default for PersistenceOptions {
    fn default() -> Self {
        Self { pretty: true }
    }
}

impl PersistenceOptions {
    /// Single-line JSON.
    pub fn compact() -> Self {
        Self { pretty: false }
    }
}

/// Stores the table as a JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    options: PersistenceOptions,
}

impl JsonFileStore {
    /// File name used by [`in_dir`](Self::in_dir).
    pub const DEFAULT_FILE_NAME: &'static str = "qtable_data.json";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            options: PersistenceOptions::default(),
        }
    }

    /// A store at `dir/qtable_data.json`.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(Self::DEFAULT_FILE_NAME))
    }

    pub fn with_options(mut self, options: PersistenceOptions) -> Self {
        self.options = options;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl QTableStore for JsonFileStore {
    fn load(&self) -> Result<Option<QTableSnapshot>, PersistenceError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&self.path)?;
        let snapshot = QTableSnapshot::from_json(&bytes)?;
        log::info!(
            "Loaded Q-table with {} states from {:?}",
            snapshot.len(),
            self.path
        );
        Ok(Some(snapshot))
    }

    fn save(&mut self, snapshot: &QTableSnapshot) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let bytes = snapshot.to_json(self.options.pretty)?;
        fs::write(&self.path, bytes)?;
        log::debug!("Saved Q-table with {} states to {:?}", snapshot.len(), self.path);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), PersistenceError> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
            log::info!("Removed Q-table file {:?}", self.path);
        }
        Ok(())
    }
}
