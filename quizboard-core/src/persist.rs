//! Game persistence.
//!
//! The store is the only writer of state; persistence observes each new
//! snapshot and writes it out. Failures never reach gameplay: a failed save
//! is logged and dropped, and a failed load starts a fresh game.

use crate::state::GameState;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Errors from persistence operations.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// Current save format version.
pub const SAVE_VERSION: u32 = 1;

/// A saved game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedGame {
    /// Save format version for compatibility checking.
    pub version: u32,

    /// When the save was created, in unix seconds.
    pub saved_at: String,

    pub state: GameState,
}

impl SavedGame {
    pub fn new(state: GameState) -> Self {
        Self {
            version: SAVE_VERSION,
            saved_at: chrono_now(),
            state,
        }
    }

    pub fn to_json(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, PersistError> {
        let saved: Self = serde_json::from_str(json)?;

        if saved.version != SAVE_VERSION {
            return Err(PersistError::VersionMismatch {
                expected: SAVE_VERSION,
                found: saved.version,
            });
        }

        Ok(saved)
    }
}

/// Somewhere a serialized game can live.
#[async_trait]
pub trait StateStorage: Send + Sync {
    async fn save(&self, serialized: &str) -> Result<(), PersistError>;

    /// `None` when nothing has been saved yet.
    async fn load(&self) -> Result<Option<String>, PersistError>;
}

/// A single JSON file on disk.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl StateStorage for JsonFileStorage {
    async fn save(&self, serialized: &str) -> Result<(), PersistError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&self.path, serialized).await?;
        Ok(())
    }

    async fn load(&self) -> Result<Option<String>, PersistError> {
        match fs::read_to_string(&self.path).await {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

/// In-memory storage; clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that starts out holding `serialized`.
    pub fn with_contents(serialized: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(serialized.into()))),
        }
    }

    pub async fn contents(&self) -> Option<String> {
        self.slot.lock().await.clone()
    }
}

#[async_trait]
impl StateStorage for MemoryStorage {
    async fn save(&self, serialized: &str) -> Result<(), PersistError> {
        *self.slot.lock().await = Some(serialized.to_string());
        Ok(())
    }

    async fn load(&self) -> Result<Option<String>, PersistError> {
        Ok(self.slot.lock().await.clone())
    }
}

/// Non-failing save and load over any [`StateStorage`].
pub struct Persistence {
    storage: Box<dyn StateStorage>,
}

impl Persistence {
    pub fn new(storage: impl StateStorage + 'static) -> Self {
        Self {
            storage: Box::new(storage),
        }
    }

    /// Persistence that keeps nothing beyond the process.
    pub fn in_memory() -> Self {
        Self::new(MemoryStorage::new())
    }

    /// Save a snapshot. Returns whether it was written.
    pub async fn save(&self, state: &GameState) -> bool {
        match self.try_save(state).await {
            Ok(()) => true,
            Err(err) => {
                warn!(%err, "Failed to save game, continuing without it");
                false
            }
        }
    }

    async fn try_save(&self, state: &GameState) -> Result<(), PersistError> {
        let json = SavedGame::new(state.clone()).to_json()?;
        self.storage.save(&json).await
    }

    /// Load the saved game, or a fresh state if there is none or it can't
    /// be read.
    pub async fn load_or_default(&self, fallback: GameState) -> GameState {
        match self.try_load().await {
            Ok(Some(saved)) => {
                info!(saved_at = %saved.saved_at, "Loaded saved game");
                saved.state
            }
            Ok(None) => {
                debug!("No saved game, starting fresh");
                fallback
            }
            Err(err) => {
                warn!(%err, "Saved game is unreadable, starting fresh");
                fallback
            }
        }
    }

    pub async fn try_load(&self) -> Result<Option<SavedGame>, PersistError> {
        match self.storage.load().await? {
            Some(json) => Ok(Some(SavedGame::from_json(&json)?)),
            None => Ok(None),
        }
    }
}

/// Get the current time as unix seconds.
fn chrono_now() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();

    format!("{}", now.as_secs())
}
