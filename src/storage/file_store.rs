use serde::{de::DeserializeOwned, Serialize};
use shared::{config::StorageConfig, AccountConfig, AccountState, AppError, Result};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Account states keyed by phone, as stored in `state.json`
pub type StateMap = BTreeMap<String, AccountState>;

/// JSON-file persistence for the account list and the account states.
///
/// All writes go through one async mutex, so two writers never interleave.
/// Each write lands in a temp file that is renamed over the target, so a
/// concurrent reader sees either the old or the new document.
#[derive(Debug)]
pub struct FileStore {
    config_path: PathBuf,
    state_path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(config_path: impl Into<PathBuf>, state_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            state_path: state_path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn from_config(storage: &StorageConfig) -> Self {
        Self::new(storage.config_path.clone(), storage.state_path.clone())
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    /// Account list; a missing or unreadable file yields an empty list.
    pub async fn read_config(&self) -> Vec<AccountConfig> {
        match read_json(&self.config_path).await {
            Ok(Some(config)) => config,
            Ok(None) => {
                warn!("⚠️ {} not found. Returning empty account list.", self.config_path.display());
                Vec::new()
            }
            Err(e) => {
                warn!("⚠️ {} is invalid ({}). Returning empty account list.", self.config_path.display(), e);
                Vec::new()
            }
        }
    }

    /// Account states; a missing or unreadable file yields an empty map.
    pub async fn read_state(&self) -> StateMap {
        match read_json(&self.state_path).await {
            Ok(Some(state)) => state,
            Ok(None) => StateMap::new(),
            Err(e) => {
                warn!("⚠️ {} is invalid ({}). Starting from empty state.", self.state_path.display(), e);
                StateMap::new()
            }
        }
    }

    /// Account list for operations that must not mistake a broken file for
    /// an empty one. `None` means the file does not exist.
    pub async fn load_config(&self) -> Result<Option<Vec<AccountConfig>>> {
        read_json(&self.config_path).await
    }

    pub async fn write_config(&self, config: &[AccountConfig]) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        write_json(&self.config_path, &config).await
    }

    pub async fn write_state(&self, state: &StateMap) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        write_json(&self.state_path, state).await
    }

    /// Read-modify-write of the account list under the write lock.
    ///
    /// The file is only rewritten when `f` succeeds. Unlike [`read_config`],
    /// a corrupt file is an error here so it is never silently replaced.
    ///
    /// [`read_config`]: FileStore::read_config
    pub async fn update_config<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut Vec<AccountConfig>) -> Result<R>,
    {
        let _guard = self.write_lock.lock().await;
        let mut config: Vec<AccountConfig> = read_json(&self.config_path).await?.unwrap_or_default();
        let result = f(&mut config)?;
        write_json(&self.config_path, &config).await?;
        Ok(result)
    }

    /// Read-modify-write of the state map under the write lock.
    ///
    /// A corrupt state file is treated as empty: state is derived data and
    /// the next reconcile rebuilds it.
    pub async fn update_state<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut StateMap) -> Result<R>,
    {
        let _guard = self.write_lock.lock().await;
        let mut state = match read_json::<StateMap>(&self.state_path).await {
            Ok(state) => state.unwrap_or_default(),
            Err(e) => {
                warn!("⚠️ Discarding invalid {}: {}", self.state_path.display(), e);
                StateMap::new()
            }
        };
        let result = f(&mut state)?;
        write_json(&self.state_path, &state).await?;
        Ok(result)
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let data = match tokio::fs::read_to_string(path).await {
        Ok(data) => data,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(AppError::Io(e)),
    };
    Ok(Some(serde_json::from_str(&data)?))
}

async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let body = serde_json::to_string_pretty(value)?;

    let mut tmp_name = path
        .file_name()
        .map(|name| name.to_os_string())
        .ok_or_else(|| AppError::configuration(format!("invalid store path: {}", path.display())))?;
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    tokio::fs::write(&tmp_path, body).await?;
    tokio::fs::rename(&tmp_path, path).await?;
    debug!("💾 Wrote {}", path.display());
    Ok(())
}
