//! Configuration module
//!
//! The application is configured from a JSON file (`application.json` by default).
//! Keys are camelCase. Optional values carry defaults so a minimal file only needs
//! the security, database, upload and filestore sections.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};

use crate::storage_types::StorageBackend;

const MAX_CONNECTIONS: u32 = 10;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_CACHE_DURATION: &str = "10m";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    pub security: SecurityConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub file_server: FileServerConfig,
    pub upload: UploadConfig,
    pub filestore: FilestoreConfig,
}

/// The claim a user must hold to access the application
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequiredClaim {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityConfig {
    pub jwt_issuer: String,
    pub jwt_secret: String,
    #[serde(default)]
    pub cookie_name: String,
    #[serde(default)]
    pub login_redirect: String,
    #[serde(default)]
    pub claim: RequiredClaim,
    #[serde(default = "default_cache_duration")]
    pub cache_duration: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseConfig {
    pub connection_string: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file_path: None,
            log_level: default_log_level(),
        }
    }
}

// Static file serving is handled outside this service; the section is parsed so
// existing configuration files keep loading.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileServerConfig {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub spa_index_file: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadConfig {
    pub allowed_file_types: Vec<String>,
    pub max_upload_size: u64,
    pub upload_path: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilestoreConfig {
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub bucket: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub secret: String,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub backend: Option<StorageBackend>,
    #[serde(default)]
    pub local_path: Option<String>,
}

impl FilestoreConfig {
    pub fn backend(&self) -> StorageBackend {
        self.backend.unwrap_or(StorageBackend::S3)
    }
}

fn default_max_connections() -> u32 {
    MAX_CONNECTIONS
}

fn default_timeout_seconds() -> u64 {
    CONNECTION_TIMEOUT_SECS
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_cache_duration() -> String {
    DEFAULT_CACHE_DURATION.to_string()
}

impl AppConfig {
    /// Read and validate the configuration file at `path`
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("could not read config file '{}'", path.display()))?;
        let config = Self::from_json(&raw)
            .with_context(|| format!("could not parse config file '{}'", path.display()))?;
        Ok(config)
    }

    pub fn from_json(raw: &str) -> Result<Self, anyhow::Error> {
        let config: AppConfig = serde_json::from_str(raw).context("invalid JSON configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.security.jwt_secret.is_empty() {
            return Err(anyhow!("security.jwtSecret must not be empty"));
        }
        if self.security.jwt_issuer.is_empty() {
            return Err(anyhow!("security.jwtIssuer must not be empty"));
        }
        self.cache_duration()
            .context("security.cacheDuration is not a valid duration")?;

        if self.database.connection_string.is_empty() {
            return Err(anyhow!("database.connectionString must not be empty"));
        }

        if self.upload.max_upload_size == 0 {
            return Err(anyhow!("upload.maxUploadSize must be greater than zero"));
        }
        if self.upload.upload_path.is_empty() {
            return Err(anyhow!("upload.uploadPath must not be empty"));
        }

        match self.filestore.backend() {
            StorageBackend::S3 => {
                if self.filestore.bucket.is_empty() {
                    return Err(anyhow!(
                        "filestore.bucket must be set when using the s3 backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.filestore.local_path.is_none() {
                    return Err(anyhow!(
                        "filestore.localPath must be set when using the local backend"
                    ));
                }
            }
            StorageBackend::Memory => {}
        }

        Ok(())
    }

    pub fn cache_duration(&self) -> Result<Duration, anyhow::Error> {
        parse_duration(&self.security.cache_duration)
    }

    /// Normalised list of allowed upload extensions (lowercase, no leading dot)
    pub fn allowed_file_types(&self) -> Vec<String> {
        self.upload
            .allowed_file_types
            .iter()
            .map(|t| t.trim_start_matches('.').to_lowercase())
            .collect()
    }
}

/// Parse a humane duration such as `10m`, `30s`, `1h30m` or `250ms`.
pub fn parse_duration(input: &str) -> Result<Duration, anyhow::Error> {
    let input = input.trim();
    if input.is_empty() {
        return Err(anyhow!("empty duration"));
    }

    let mut total = Duration::ZERO;
    let mut rest = input;
    while !rest.is_empty() {
        let digits = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        if digits == 0 {
            return Err(anyhow!("invalid duration '{}'", input));
        }
        let value: u64 = rest[..digits]
            .parse()
            .with_context(|| format!("invalid duration '{}'", input))?;
        rest = &rest[digits..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(rest.len());
        let unit = &rest[..unit_len];
        rest = &rest[unit_len..];

        let part = match unit {
            "ms" => Duration::from_millis(value),
            "s" => Duration::from_secs(value),
            "m" => Duration::from_secs(value * 60),
            "h" => Duration::from_secs(value * 3600),
            "" => return Err(anyhow!("missing unit in duration '{}'", input)),
            other => return Err(anyhow!("unknown unit '{}' in duration '{}'", other, input)),
        };
        total += part;
    }

    Ok(total)
}
