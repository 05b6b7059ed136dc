//! JSON persistence of a DAO between CLI invocations
//!
//! Writers serialize on an exclusive lock taken on a sibling `.lock` file and
//! replace the state file by rename, so readers never see a partial write.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::dao::DaoState;
use crate::transfer::BankState;

/// Ledger state plus the balances paid out so far
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaoSnapshot {
    pub state: DaoState,
    #[serde(default)]
    pub bank: BankState,
}

impl DaoSnapshot {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read DAO state from {}", path.display()))?;
        let snapshot = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse DAO state in {}", path.display()))?;
        debug!("Loaded DAO state from {}", path.display());
        Ok(snapshot)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let contents = serde_json::to_string_pretty(self).context("Failed to serialize DAO state")?;

        let tmp_path = sibling(path, "tmp");
        let mut file = File::create(&tmp_path)
            .with_context(|| format!("Failed to write DAO state to {}", tmp_path.display()))?;
        file.write_all(contents.as_bytes())
            .and_then(|()| file.sync_all())
            .with_context(|| format!("Failed to write DAO state to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path)
            .with_context(|| format!("Failed to replace DAO state at {}", path.display()))?;

        debug!("Saved DAO state to {}", path.display());
        Ok(())
    }
}

/// Exclusive lock over one state file, released on drop.
///
/// Hold it from load through save so concurrent writers apply in turn.
#[derive(Debug)]
pub struct StateLock {
    _file: File,
    path: PathBuf,
}

impl StateLock {
    /// Block until no other process holds the lock for `state_path`
    pub fn acquire<P: AsRef<Path>>(state_path: P) -> Result<Self> {
        let path = sibling(state_path.as_ref(), "lock");
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .with_context(|| format!("Failed to open lock file {}", path.display()))?;
        file.lock()
            .with_context(|| format!("Failed to lock {}", path.display()))?;
        debug!("Locked {}", path.display());
        Ok(Self { _file: file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// `state.json` -> `state.json.<suffix>`
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}
