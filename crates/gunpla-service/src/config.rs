//! Shop configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use gunpla_core::auth::MAX_ROLES;
use gunpla_db::DbConfig;
use serde::{Deserialize, Serialize};

/// Shop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopConfig {
    /// SQLite database file
    pub database_path: PathBuf,

    /// Pool size
    pub db_max_connections: u32,

    /// Budget for each staged write step, in seconds
    pub db_write_timeout_secs: u64,

    /// Deadline for list and single reads, in seconds
    pub request_timeout_secs: u64,

    /// Number of roles in the role list (bit width of every mask)
    pub role_count: u32,

    /// 1-based id of the role allowed to set any order status
    pub admin_role_id: u32,

    /// Directory that holds `images/...`
    pub file_root: PathBuf,
}

impl Default for ShopConfig {
    fn default() -> Self {
        ShopConfig {
            database_path: PathBuf::from("./gunpla.db"),
            db_max_connections: 5,
            db_write_timeout_secs: 10,
            request_timeout_secs: 30,
            role_count: 2,
            admin_role_id: 2,
            file_root: PathBuf::from("./static"),
        }
    }
}

impl ShopConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = ShopConfig::default();

        let config = ShopConfig {
            database_path: env::var("DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),

            db_max_connections: parse_var("DB_MAX_CONNECTIONS", defaults.db_max_connections)?,

            db_write_timeout_secs: parse_var(
                "DB_WRITE_TIMEOUT_SECS",
                defaults.db_write_timeout_secs,
            )?,

            request_timeout_secs: parse_var("REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs)?,

            role_count: parse_var("ROLE_COUNT", defaults.role_count)?,

            admin_role_id: parse_var("ADMIN_ROLE_ID", defaults.admin_role_id)?,

            file_root: env::var("FILE_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.file_root),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()));
        }
        if self.role_count == 0 || self.role_count > MAX_ROLES {
            return Err(ConfigError::InvalidValue("ROLE_COUNT".to_string()));
        }
        if self.admin_role_id == 0 || self.admin_role_id > self.role_count {
            return Err(ConfigError::AdminRoleOutOfRange {
                admin_role_id: self.admin_role_id,
                role_count: self.role_count,
            });
        }
        Ok(())
    }

    /// Database settings derived from this configuration.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path)
            .max_connections(self.db_max_connections)
            .write_timeout(Duration::from_secs(self.db_write_timeout_secs))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(name.to_string())),
        Err(_) => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("ADMIN_ROLE_ID {admin_role_id} is outside 1..={role_count}")]
    AdminRoleOutOfRange { admin_role_id: u32, role_count: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ShopConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.db_config().write_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_admin_role_must_fit_role_list() {
        let config = ShopConfig {
            role_count: 3,
            admin_role_id: 4,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::AdminRoleOutOfRange { .. })
        ));

        let config = ShopConfig {
            role_count: 65,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));
    }
}
