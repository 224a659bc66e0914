//! Worker configuration and the credentials file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use covdb_battlenet::oauth::DEFAULT_TOKEN_URL;
use covdb_battlenet::profile::DEFAULT_API_BASE;
use covdb_battlenet::Credentials;
use covdb_core::CovdbError;
use serde::Deserialize;

/// Worker configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub database_url: String,
    pub credentials_file: PathBuf,
    pub realms_file: PathBuf,
    /// Directory holding `characters_{region}_{faction}.toml` seed lists.
    pub characters_dir: PathBuf,
    pub export_dir: PathBuf,
    pub token_url: String,
    /// API base URL template; `{region}` is substituted per call.
    pub api_base_url: String,
    pub min_interval: Duration,
    pub request_timeout: Duration,
}

fn var_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.into())
}

fn parse_u64(name: &str, default: u64) -> Result<u64, CovdbError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| CovdbError::Validation(format!("{name} must be a valid u64, got '{raw}'"))),
        Err(_) => Ok(default),
    }
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default                              |
    /// |--------------------------|--------------------------------------|
    /// | `DATABASE_URL`           | required                             |
    /// | `COVDB_CREDENTIALS_FILE` | `config/credentials.toml`            |
    /// | `COVDB_REALMS_FILE`      | `config/realms.toml`                 |
    /// | `COVDB_CHARACTERS_DIR`   | `data/characters`                    |
    /// | `COVDB_EXPORT_DIR`       | `CovDB_Addon`                        |
    /// | `BNET_TOKEN_URL`         | `https://eu.battle.net/oauth/token`  |
    /// | `BNET_API_BASE_URL`      | `https://{region}.api.blizzard.com`  |
    /// | `API_MIN_INTERVAL_MS`    | `100`                                |
    /// | `API_TIMEOUT_SECS`       | `30`                                 |
    pub fn from_env() -> Result<Self, CovdbError> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| CovdbError::Validation("DATABASE_URL must be set".into()))?;

        Ok(Self {
            database_url,
            credentials_file: var_or("COVDB_CREDENTIALS_FILE", "config/credentials.toml").into(),
            realms_file: var_or("COVDB_REALMS_FILE", "config/realms.toml").into(),
            characters_dir: var_or("COVDB_CHARACTERS_DIR", "data/characters").into(),
            export_dir: var_or("COVDB_EXPORT_DIR", "CovDB_Addon").into(),
            token_url: var_or("BNET_TOKEN_URL", DEFAULT_TOKEN_URL),
            api_base_url: var_or("BNET_API_BASE_URL", DEFAULT_API_BASE),
            min_interval: Duration::from_millis(parse_u64("API_MIN_INTERVAL_MS", 100)?),
            request_timeout: Duration::from_secs(parse_u64("API_TIMEOUT_SECS", 30)?),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct WorkerEntry {
    client_id: String,
    client_secret: String,
}

/// API credentials keyed by worker identity.
///
/// ```toml
/// [workers.covdb-worker-1]
/// client_id = "..."
/// client_secret = "..."
/// ```
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CredentialsFile {
    #[serde(default)]
    workers: BTreeMap<String, WorkerEntry>,
}

impl CredentialsFile {
    pub fn load(path: &Path) -> Result<Self, CovdbError> {
        let raw = std::fs::read_to_string(path).map_err(|source| CovdbError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| CovdbError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Credentials for `worker_id`. Blank ids or secrets count as missing.
    pub fn credentials_for(&self, worker_id: &str) -> Result<Credentials, CovdbError> {
        match self.workers.get(worker_id) {
            Some(entry) if !entry.client_id.is_empty() && !entry.client_secret.is_empty() => {
                Ok(Credentials {
                    client_id: entry.client_id.clone(),
                    client_secret: entry.client_secret.clone(),
                })
            }
            _ => Err(CovdbError::MissingCredentials(worker_id.to_string())),
        }
    }
}
