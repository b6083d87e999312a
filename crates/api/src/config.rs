use std::collections::HashMap;
use std::path::{Path, PathBuf};

use floors_core::{AccountFloorConfig, FloorError, RateTable};
use serde::Deserialize;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// JSON file with per-account floor settings. Unset means every
    /// account runs with the default settings.
    pub accounts_file: Option<PathBuf>,
    /// JSON file with currency conversion rates (`{"USD": {"EUR": 0.9}}`).
    pub rates_file: Option<PathBuf>,
    /// HTTP request timeout in seconds (default: `5`).
    pub request_timeout_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default    |
    /// |------------------------|------------|
    /// | `HOST`                 | `0.0.0.0`  |
    /// | `PORT`                 | `3000`     |
    /// | `ACCOUNTS_FILE`        | unset      |
    /// | `RATES_FILE`           | unset      |
    /// | `REQUEST_TIMEOUT_SECS` | `5`        |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let accounts_file = std::env::var("ACCOUNTS_FILE").ok().map(PathBuf::from);
        let rates_file = std::env::var("RATES_FILE").ok().map(PathBuf::from);

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "5".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        Self {
            host,
            port,
            accounts_file,
            rates_file,
            request_timeout_secs,
        }
    }
}

// ---------------------------------------------------------------------------
// Config files
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid floor settings for account '{account_id}': {source}")]
    InvalidAccount {
        account_id: String,
        source: FloorError,
    },
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Floor settings for every known account.
///
/// Accounts file shape:
///
/// ```json
/// {
///   "default": { "enforce_floors_rate": 100 },
///   "accounts": { "pub-123": { "use_dynamic_data": true, "fetch": { ... } } }
/// }
/// ```
///
/// Without a `default` entry, unknown accounts are rejected.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountRegistry {
    #[serde(default)]
    pub default: Option<AccountFloorConfig>,
    #[serde(default)]
    pub accounts: HashMap<String, AccountFloorConfig>,
}

impl AccountRegistry {
    /// Registry serving the default settings to every account.
    pub fn open() -> Self {
        Self {
            default: Some(AccountFloorConfig::default()),
            accounts: HashMap::new(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let registry: Self = read_json(path)?;
        registry.validate()?;
        Ok(registry)
    }

    pub fn with_account(mut self, account_id: &str, config: AccountFloorConfig) -> Self {
        self.accounts.insert(account_id.to_string(), config);
        self
    }

    pub fn get(&self, account_id: &str) -> Option<&AccountFloorConfig> {
        self.accounts.get(account_id).or(self.default.as_ref())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let check = |account_id: &str, config: &AccountFloorConfig| {
            config
                .validate()
                .map_err(|source| ConfigError::InvalidAccount {
                    account_id: account_id.to_string(),
                    source,
                })
        };

        if let Some(default) = &self.default {
            check("default", default)?;
        }
        for (account_id, config) in &self.accounts {
            check(account_id, config)?;
        }
        Ok(())
    }
}

/// Load the conversion rate table from `path`.
pub fn load_rates(path: &Path) -> Result<RateTable, ConfigError> {
    read_json(path)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
