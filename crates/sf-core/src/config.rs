//! Configuration types and loading
//!
//! Sources, lowest precedence first: built-in defaults, an optional
//! `salesflow.{toml,yaml,json}` file, `SALESFLOW__SECTION__KEY` environment
//! variables, then the conventional `DATABASE_URL`, `HOST`, `PORT` and
//! `JWT_SECRET` variables.

use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub pipeline: PipelineConfig,
    pub discount: DiscountConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Requests running longer are answered with 408
    pub request_timeout_seconds: u64,
    pub max_body_size_bytes: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// PostgreSQL URL; in-memory storage is used when unset
    pub url: Option<String>,
    pub pool_size: u32,
    pub connect_timeout_seconds: u64,
    /// Apply the bundled schema on startup
    pub migrate: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// JWT secret for token signing
    pub jwt_secret: String,
    /// Token expiration in seconds
    pub token_expiration_seconds: u64,
    /// Account seeded at startup when both values are set
    pub bootstrap_admin_login: Option<String>,
    pub bootstrap_admin_password: Option<String>,
    pub password_min_length: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Ordered board stages, by wire name (e.g. `PRE_SALES`)
    pub board_stages: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DiscountConfig {
    /// Applies when none of a user's roles has a policy
    pub default_authority_limit: f64,
    pub default_max_limit: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
    /// Default filter when `RUST_LOG` is unset
    pub filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                request_timeout_seconds: 10,
                max_body_size_bytes: 25 * 1024 * 1024, // 25MB
            },
            database: DatabaseConfig {
                url: None,
                pool_size: 10,
                connect_timeout_seconds: 5,
                migrate: true,
            },
            auth: AuthConfig {
                jwt_secret: "change-me-in-production".to_string(),
                token_expiration_seconds: 8 * 3600,
                bootstrap_admin_login: None,
                bootstrap_admin_password: None,
                password_min_length: 10,
            },
            pipeline: PipelineConfig {
                board_stages: [
                    "PROSPECT",
                    "MEETING_SCHEDULED",
                    "PRE_SALES",
                    "PROPOSAL_DELIVERED",
                    "WON",
                    "LOST",
                ]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            },
            discount: DiscountConfig {
                default_authority_limit: 0.0,
                default_max_limit: 100.0,
            },
            logging: LoggingConfig {
                json: false,
                filter: "info,sf_server=debug,sf_api=debug,tower_http=debug".to_string(),
            },
        }
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
    #[error("Config source error: {0}")]
    Source(#[from] config::ConfigError),
}

impl AppConfig {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, ConfigError> {
        let file = std::env::var("SALESFLOW_CONFIG").unwrap_or_else(|_| "salesflow".to_string());

        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(config::File::with_name(&file).required(false))
            .add_source(
                config::Environment::with_prefix("SALESFLOW")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("pipeline.board_stages"),
            )
            .build()?;

        let mut config: AppConfig = settings.try_deserialize()?;
        config.apply_conventional_env();
        config.validate()?;
        Ok(config)
    }

    /// Overrides honoured by most hosting platforms
    fn apply_conventional_env(&mut self) {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.database.url = Some(url);
        }
        if let Ok(host) = std::env::var("HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!(%port, "ignoring unparsable PORT"),
            }
        }
        if let Ok(secret) = std::env::var("JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let d = &self.discount;
        if !(0.0..=100.0).contains(&d.default_max_limit) {
            return Err(ConfigError::InvalidValue {
                key: "discount.default_max_limit".into(),
                message: "must be between 0 and 100".into(),
            });
        }
        if d.default_authority_limit < 0.0 || d.default_authority_limit > d.default_max_limit {
            return Err(ConfigError::InvalidValue {
                key: "discount.default_authority_limit".into(),
                message: "must be between 0 and default_max_limit".into(),
            });
        }
        if self.pipeline.board_stages.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "pipeline.board_stages".into(),
                message: "must list at least one stage".into(),
            });
        }
        if self.auth.jwt_secret.len() < 16 {
            return Err(ConfigError::InvalidValue {
                key: "auth.jwt_secret".into(),
                message: "must be at least 16 bytes".into(),
            });
        }
        Ok(())
    }

    /// Get the server address
    pub fn server_addr(&self) -> std::net::SocketAddr {
        use std::net::SocketAddr;
        let ip: std::net::IpAddr = self.server.host.parse().unwrap_or([0, 0, 0, 0].into());
        SocketAddr::new(ip, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.request_timeout_seconds, 10);
        assert_eq!(config.pipeline.board_stages.len(), 6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_authority_above_max_is_rejected() {
        let mut config = AppConfig::default();
        config.discount.default_authority_limit = 30.0;
        config.discount.default_max_limit = 20.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_board_is_rejected() {
        let mut config = AppConfig::default();
        config.pipeline.board_stages.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_server_addr() {
        let config = AppConfig::default();
        let addr = config.server_addr();
        assert_eq!(addr.port(), 8080);
    }
}
