//! Configuration management
//!
//! Everything is injected through the environment (optionally seeded from a
//! `.env` file). The search credential and the database URL are only
//! required by the command that uses them, so `import` runs without an API
//! key and `paginate` runs without a database.

use crate::error::{IngestError, IngestResult};
use crate::fetcher::SearchFilters;
use prospect_common::env;
use std::path::PathBuf;
use std::time::Duration;

// ============================================================================
// Ingestion Configuration Constants
// ============================================================================

/// Default search API host.
pub const DEFAULT_API_HOST: &str = "https://api.crustdata.com";

/// Default region filter values.
pub const DEFAULT_REGIONS: &[&str] = &[
    "San Francisco Bay Area",
    "San Francisco, California, United States",
    "San Francisco County, California, United States",
];

/// Default current-title filter values.
pub const DEFAULT_TITLES: &[&str] = &["Founder", "Co-Founder"];

/// Default number of profiles requested per page.
pub const DEFAULT_PAGE_SIZE: u32 = 25;

/// Default highest page number a pagination run will fetch.
pub const DEFAULT_MAX_PAGE: u32 = 20;

/// Default pause between two search requests, in milliseconds.
pub const DEFAULT_REQUEST_INTERVAL_MS: u64 = 1000;

/// Default HTTP timeout for one search request, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default checkpoint file location.
pub const DEFAULT_CHECKPOINT_PATH: &str = "scraping-state.json";

/// Default number of records per import batch.
pub const DEFAULT_IMPORT_BATCH_SIZE: usize = 50;

/// Default maximum database connections in the pool.
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 5;

/// Default database connection timeout in seconds.
pub const DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Settings for a pagination run
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    pub api_host: String,
    pub api_key: String,
    pub filters: SearchFilters,
    pub page_size: u32,
    pub max_page: u32,
    pub request_interval: Duration,
    pub request_timeout: Duration,
    pub checkpoint_path: PathBuf,
}

/// Settings for an import run
#[derive(Debug, Clone)]
pub struct ImportConfig {
    pub checkpoint_path: PathBuf,
    pub batch_size: usize,
    pub database: DatabaseConfig,
}

/// Database connection settings
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

impl PaginationConfig {
    /// Load pagination settings; fails if the API key is missing
    pub fn from_env() -> IngestResult<Self> {
        let config = Self {
            api_host: env::optional("PROSPECT_API_HOST")
                .unwrap_or_else(|| DEFAULT_API_HOST.to_string()),
            api_key: env::required("PROSPECT_API_KEY")?,
            filters: SearchFilters {
                regions: env::list_or("PROSPECT_SEARCH_REGIONS", DEFAULT_REGIONS),
                titles: env::list_or("PROSPECT_SEARCH_TITLES", DEFAULT_TITLES),
            },
            page_size: env::parsed_or("PROSPECT_PAGE_SIZE", DEFAULT_PAGE_SIZE)?,
            max_page: env::parsed_or("PROSPECT_MAX_PAGE", DEFAULT_MAX_PAGE)?,
            request_interval: Duration::from_millis(env::parsed_or(
                "PROSPECT_REQUEST_INTERVAL_MS",
                DEFAULT_REQUEST_INTERVAL_MS,
            )?),
            request_timeout: Duration::from_secs(env::parsed_or(
                "PROSPECT_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?),
            checkpoint_path: checkpoint_path_from_env(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> IngestResult<()> {
        if self.api_key.trim().is_empty() {
            return Err(IngestError::config("PROSPECT_API_KEY cannot be empty"));
        }

        if self.api_host.trim().is_empty() {
            return Err(IngestError::config("PROSPECT_API_HOST cannot be empty"));
        }

        if self.page_size == 0 {
            return Err(IngestError::config("PROSPECT_PAGE_SIZE must be greater than 0"));
        }

        if self.filters.regions.is_empty() || self.filters.titles.is_empty() {
            return Err(IngestError::config(
                "search filters need at least one region and one title",
            ));
        }

        if self.request_interval.is_zero() {
            tracing::warn!("PROSPECT_REQUEST_INTERVAL_MS is 0 - requests will not be paced");
        }

        Ok(())
    }
}

impl ImportConfig {
    /// Load import settings; fails if DATABASE_URL is missing
    pub fn from_env() -> IngestResult<Self> {
        let config = Self {
            checkpoint_path: checkpoint_path_from_env(),
            batch_size: env::parsed_or("PROSPECT_IMPORT_BATCH_SIZE", DEFAULT_IMPORT_BATCH_SIZE)?,
            database: DatabaseConfig::from_env()?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> IngestResult<()> {
        if self.batch_size == 0 {
            return Err(IngestError::config(
                "PROSPECT_IMPORT_BATCH_SIZE must be greater than 0",
            ));
        }

        if self.database.max_connections == 0 {
            return Err(IngestError::config("DB_MAX_CONNECTIONS must be greater than 0"));
        }

        Ok(())
    }
}

impl DatabaseConfig {
    pub fn from_env() -> IngestResult<Self> {
        Ok(Self {
            url: env::required("DATABASE_URL")?,
            max_connections: env::parsed_or(
                "DB_MAX_CONNECTIONS",
                DEFAULT_DATABASE_MAX_CONNECTIONS,
            )?,
            connect_timeout_secs: env::parsed_or(
                "DB_CONNECT_TIMEOUT",
                DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
            )?,
        })
    }
}

/// Checkpoint location shared by every command
pub fn checkpoint_path_from_env() -> PathBuf {
    env::optional("PROSPECT_CHECKPOINT_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CHECKPOINT_PATH))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn pagination() -> PaginationConfig {
        PaginationConfig {
            api_host: DEFAULT_API_HOST.to_string(),
            api_key: "key".to_string(),
            filters: SearchFilters {
                regions: vec!["SF".to_string()],
                titles: vec!["Founder".to_string()],
            },
            page_size: DEFAULT_PAGE_SIZE,
            max_page: DEFAULT_MAX_PAGE,
            request_interval: Duration::from_millis(DEFAULT_REQUEST_INTERVAL_MS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            checkpoint_path: PathBuf::from(DEFAULT_CHECKPOINT_PATH),
        }
    }

    #[test]
    fn test_valid_pagination_config() {
        assert!(pagination().validate().is_ok());
    }

    #[test]
    fn test_blank_api_key_is_rejected() {
        let config = PaginationConfig {
            api_key: "  ".to_string(),
            ..pagination()
        };
        assert!(matches!(config.validate(), Err(IngestError::Config(_))));
    }

    #[test]
    fn test_zero_page_size_is_rejected() {
        let config = PaginationConfig {
            page_size: 0,
            ..pagination()
        };
        assert!(matches!(config.validate(), Err(IngestError::Config(_))));
    }

    #[test]
    fn test_empty_filters_are_rejected() {
        let mut config = pagination();
        config.filters.titles.clear();
        assert!(matches!(config.validate(), Err(IngestError::Config(_))));
    }

    #[test]
    fn test_import_batch_size_must_be_positive() {
        let config = ImportConfig {
            checkpoint_path: PathBuf::from(DEFAULT_CHECKPOINT_PATH),
            batch_size: 0,
            database: DatabaseConfig {
                url: "postgresql://localhost/prospect".to_string(),
                max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
                connect_timeout_secs: DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
            },
        };
        assert!(matches!(config.validate(), Err(IngestError::Config(_))));
    }
}
