//! API configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.
//! A `.env` file in the working directory is read first when present.

use serde::{Deserialize, Serialize};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use tally_core::{DebtTracking, EditBalancePolicy, LedgerPolicy};
use tally_db::DbConfig;

/// API server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Bind address
    pub host: String,

    /// HTTP port
    pub port: u16,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Max pooled connections
    pub max_connections: u32,

    /// How sale create/edit maintain client debt
    pub debt_tracking: DebtTracking,

    /// What an edit does to a credit sale's balance
    pub edit_balance: EditBalancePolicy,
}

impl ApiConfig {
    /// Load configuration from the environment (and `.env`, if any).
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let config = ApiConfig {
            host: lookup("TALLY_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),

            port: lookup("TALLY_PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("TALLY_PORT".to_string()))?,

            database_path: lookup("TALLY_DATABASE_PATH")
                .unwrap_or_else(|| "./tally.db".to_string())
                .into(),

            max_connections: lookup("TALLY_MAX_CONNECTIONS")
                .unwrap_or_else(|| "5".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("TALLY_MAX_CONNECTIONS".to_string()))?,

            debt_tracking: lookup("TALLY_DEBT_TRACKING")
                .map(|v| v.parse::<DebtTracking>())
                .transpose()
                .map_err(|_| ConfigError::InvalidValue("TALLY_DEBT_TRACKING".to_string()))?
                .unwrap_or_default(),

            edit_balance: lookup("TALLY_EDIT_BALANCE_POLICY")
                .map(|v| v.parse::<EditBalancePolicy>())
                .transpose()
                .map_err(|_| ConfigError::InvalidValue("TALLY_EDIT_BALANCE_POLICY".to_string()))?
                .unwrap_or_default(),
        };

        if config.max_connections == 0 {
            return Err(ConfigError::InvalidValue("TALLY_MAX_CONNECTIONS".to_string()));
        }

        Ok(config)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::InvalidValue("TALLY_HOST".to_string()))
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database_path.clone()).max_connections(self.max_connections)
    }

    pub fn ledger_policy(&self) -> LedgerPolicy {
        LedgerPolicy::default()
            .debt_tracking(self.debt_tracking)
            .edit_balance(self.edit_balance)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
