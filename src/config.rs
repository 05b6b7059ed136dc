use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Deployment and runtime settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub dao: DaoSettings,
    pub logging: LoggingSettings,
    pub storage: StorageSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaoSettings {
    /// Length of the contribution window from deployment, in seconds
    pub contribution_duration_secs: u64,
    /// Length of each proposal's voting window, in seconds
    pub vote_duration_secs: u64,
    /// Minimum vote share (0-100) for a proposal to pass
    pub quorum_percent: u8,
    /// Remove redeemed shares from the total instead of tracking them apart
    #[serde(default)]
    pub burn_on_redeem: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Default tracing filter, overridden by RUST_LOG
    pub level: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSettings {
    /// JSON file holding the ledger between invocations
    pub state_path: PathBuf,
}

impl Default for DaoSettings {
    fn default() -> Self {
        Self {
            contribution_duration_secs: 7 * 24 * 3600,
            vote_duration_secs: 3 * 24 * 3600,
            quorum_percent: 50,
            burn_on_redeem: false,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dao: DaoSettings::default(),
            logging: LoggingSettings {
                level: "info".to_string(),
            },
            storage: StorageSettings {
                state_path: PathBuf::from("dao-state.json"),
            },
        }
    }
}

impl Settings {
    /// Load settings from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&contents)?;
        Ok(settings)
    }

    /// Save settings to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(&self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.dao.quorum_percent > 100 {
            anyhow::bail!(
                "Invalid quorum_percent: {} is not within 0-100",
                self.dao.quorum_percent
            );
        }

        if i64::try_from(self.dao.contribution_duration_secs).is_err() {
            anyhow::bail!("Invalid contribution_duration_secs: too large");
        }

        if i64::try_from(self.dao.vote_duration_secs).is_err() {
            anyhow::bail!("Invalid vote_duration_secs: too large");
        }

        if self.logging.level.trim().is_empty() {
            anyhow::bail!("Invalid logging level: cannot be empty");
        }

        if self.storage.state_path.as_os_str().is_empty() {
            anyhow::bail!("Invalid state_path: cannot be empty");
        }

        Ok(())
    }
}
