//! The device's remembered seat: which game it joined and as whom.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine};

/// Explicit handle to one seat in one session.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionHandle {
    #[serde(rename = "boardlink_game_id")]
    pub game_id: String,
    #[serde(rename = "boardlink_local_player_id")]
    pub player_id: String,
}

impl SessionHandle {
    pub fn new(game_id: impl Into<String>, player_id: impl Into<String>) -> Self {
        Self {
            game_id: game_id.into(),
            player_id: player_id.into(),
        }
    }
}

/// Persistence for the handle so a device can resume after a restart.
pub trait IdentityStore: Send + Sync {
    fn load(&self) -> ResultEngine<Option<SessionHandle>>;
    fn save(&self, handle: &SessionHandle) -> ResultEngine<()>;
    fn clear(&self) -> ResultEngine<()>;
}

/// Keeps the handle in a small JSON file.
#[derive(Clone, Debug)]
pub struct FileIdentityStore {
    path: PathBuf,
}

impl FileIdentityStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl IdentityStore for FileIdentityStore {
    fn load(&self) -> ResultEngine<Option<SessionHandle>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        if content.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn save(&self, handle: &SessionHandle) -> ResultEngine<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let payload = serde_json::to_string_pretty(handle)?;
        fs::write(&self.path, payload)?;
        Ok(())
    }

    fn clear(&self) -> ResultEngine<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Keeps the handle in memory only; forgets it when dropped.
#[derive(Debug, Default)]
pub struct MemoryIdentityStore {
    handle: Mutex<Option<SessionHandle>>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> ResultEngine<std::sync::MutexGuard<'_, Option<SessionHandle>>> {
        self.handle
            .lock()
            .map_err(|_| EngineError::Transport("identity lock poisoned".to_string()))
    }
}

impl IdentityStore for MemoryIdentityStore {
    fn load(&self) -> ResultEngine<Option<SessionHandle>> {
        Ok(self.lock()?.clone())
    }

    fn save(&self, handle: &SessionHandle) -> ResultEngine<()> {
        *self.lock()? = Some(handle.clone());
        Ok(())
    }

    fn clear(&self) -> ResultEngine<()> {
        *self.lock()? = None;
        Ok(())
    }
}
