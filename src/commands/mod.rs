pub mod config;
pub mod init;
pub mod operate;
pub mod replay;
pub mod status;

use anyhow::Result;
use chrono::DateTime;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use dao_treasury::{Dao, DaoSnapshot, InMemoryBank, StateLock, SystemClock, Timestamp};

#[derive(Error, Debug)]
pub enum CliError {
    #[error("DAO state not found at {0}. Run 'dao-treasury init' first")]
    StateNotFound(PathBuf),

    #[error("DAO state already exists at {0}. Use --force to overwrite")]
    StateExists(PathBuf),

    #[error("Configuration file already exists at {0}. Use --force to overwrite")]
    ConfigExists(PathBuf),

    #[error("Invalid replay script: {0}")]
    InvalidScript(String),
}

/// Persisted DAO held under the state file lock until dropped
pub struct OpenDao {
    pub dao: Arc<Dao>,
    pub bank: Arc<InMemoryBank>,
    path: PathBuf,
    _lock: StateLock,
}

impl OpenDao {
    /// Lock the state file, then load the DAO paying out through the persisted bank
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CliError::StateNotFound(path.to_path_buf()).into());
        }
        let lock = StateLock::acquire(path)?;
        let snapshot = DaoSnapshot::load(path)?;
        let bank = Arc::new(InMemoryBank::from_state(snapshot.bank));
        let dao = Arc::new(Dao::from_state(
            snapshot.state,
            Arc::new(SystemClock),
            bank.clone(),
        ));
        Ok(Self {
            dao,
            bank,
            path: path.to_path_buf(),
            _lock: lock,
        })
    }

    /// Lock a state file that `init` is about to create or overwrite
    pub fn create(path: &Path, dao: Dao, bank: Arc<InMemoryBank>, force: bool) -> Result<Self> {
        let lock = StateLock::acquire(path)?;
        if path.exists() && !force {
            return Err(CliError::StateExists(path.to_path_buf()).into());
        }
        Ok(Self {
            dao: Arc::new(dao),
            bank,
            path: path.to_path_buf(),
            _lock: lock,
        })
    }

    pub fn save(&self) -> Result<()> {
        let snapshot = DaoSnapshot {
            state: self.dao.snapshot()?,
            bank: self.bank.state(),
        };
        snapshot.save(&self.path)
    }
}

/// Read the persisted DAO without locking; replacement by rename keeps it whole
pub fn read_snapshot(path: &Path) -> Result<DaoSnapshot> {
    if !path.exists() {
        return Err(CliError::StateNotFound(path.to_path_buf()).into());
    }
    DaoSnapshot::load(path)
}

pub fn format_time(timestamp: Timestamp) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_not_found_error() {
        let err = CliError::StateNotFound(PathBuf::from("dao.json"));
        assert_eq!(
            err.to_string(),
            "DAO state not found at dao.json. Run 'dao-treasury init' first"
        );
    }

    #[test]
    fn test_state_exists_error() {
        let err = CliError::StateExists(PathBuf::from("dao.json"));
        assert!(err.to_string().contains("--force"));
    }

    #[test]
    fn test_open_requires_state_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = OpenDao::open(&dir.path().join("state.json")).err().unwrap();
        assert!(err.to_string().contains("dao-treasury init"));
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0), "1970-01-01 00:00:00 UTC");
    }
}
