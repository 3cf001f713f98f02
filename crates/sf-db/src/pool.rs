//! Database connection pool management
//!
//! Provides PostgreSQL connection pooling using SQLx.

use sf_core::config::DatabaseConfig;
use sqlx::migrate::MigrateError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

/// Pool settings derived from the application configuration
#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

impl PoolSettings {
    /// `None` when no URL is configured
    pub fn from_config(config: &DatabaseConfig) -> Option<Self> {
        let url = config.url.as_deref()?.trim();
        if url.is_empty() {
            return None;
        }
        Some(Self {
            url: url.to_string(),
            max_connections: config.pool_size.max(1),
            min_connections: 1,
            connect_timeout_secs: config.connect_timeout_seconds,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
        })
    }

    /// Create settings with a specific URL
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout_secs: 5,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
        }
    }
}

/// Database connection pool
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool
    pub async fn connect(settings: &PoolSettings) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .acquire_timeout(Duration::from_secs(settings.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(settings.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(settings.max_lifetime_secs))
            .connect(&settings.url)
            .await?;

        tracing::info!(
            "Database pool created with {} max connections",
            settings.max_connections
        );

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the bundled schema
    pub async fn migrate(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("Database schema is up to date");
        Ok(())
    }

    /// Check if the database is reachable
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Close the connection pool
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Database pool closed");
    }

    /// Get pool statistics
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            size: self.pool.size(),
            idle: self.pool.num_idle(),
        }
    }
}

/// Pool statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct PoolStats {
    pub size: u32,
    pub idle: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: Option<&str>) -> DatabaseConfig {
        DatabaseConfig {
            url: url.map(str::to_string),
            pool_size: 0,
            connect_timeout_seconds: 3,
            migrate: true,
        }
    }

    #[test]
    fn test_no_url_means_no_pool() {
        assert!(PoolSettings::from_config(&config(None)).is_none());
        assert!(PoolSettings::from_config(&config(Some("  "))).is_none());
    }

    #[test]
    fn test_settings_from_config() {
        let settings =
            PoolSettings::from_config(&config(Some("postgres://localhost/salesflow"))).unwrap();
        assert_eq!(settings.url, "postgres://localhost/salesflow");
        assert_eq!(settings.max_connections, 1);
        assert_eq!(settings.connect_timeout_secs, 3);
    }

    #[test]
    fn test_settings_with_url() {
        let settings = PoolSettings::with_url("postgres://test/db");
        assert_eq!(settings.url, "postgres://test/db");
        assert_eq!(settings.max_connections, 10);
    }
}
