use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub security: SecurityConfig,

    pub storage: StorageConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/smartfarm.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub enabled: bool,

    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 8000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    pub argon2_parallelism: u32,

    /// HMAC secret used to sign access tokens.
    /// When unset a random secret is generated at startup, so tokens do not
    /// survive a restart.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_secret: Option<String>,

    /// One of HS256, HS384, HS512
    pub token_algorithm: String,

    pub access_token_ttl_minutes: u32,

    pub min_password_length: usize,

    /// Admin account created at startup if the username does not exist yet.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bootstrap_admin: Option<BootstrapAdminConfig>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
            token_secret: None,
            token_algorithm: "HS256".to_string(),
            access_token_ttl_minutes: 30,
            min_password_length: 6,
            bootstrap_admin: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapAdminConfig {
    pub username: String,
    pub password: String,
    pub email: String,
}

/// Where user credentials live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialBackend {
    #[default]
    Database,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub credential_backend: CredentialBackend,

    /// Upper bound for a single store call made while serving a request.
    pub operation_timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            credential_backend: CredentialBackend::Database,
            operation_timeout_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("smartfarm").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".smartfarm").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            Self::default().save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        jsonwebtoken::Algorithm::from_str(&self.security.token_algorithm)
            .ok()
            .filter(|alg| {
                matches!(
                    alg,
                    jsonwebtoken::Algorithm::HS256
                        | jsonwebtoken::Algorithm::HS384
                        | jsonwebtoken::Algorithm::HS512
                )
            })
            .with_context(|| {
                format!(
                    "Unsupported token algorithm '{}' (expected HS256, HS384 or HS512)",
                    self.security.token_algorithm
                )
            })?;

        if let Some(secret) = &self.security.token_secret
            && secret.len() < 32
        {
            anyhow::bail!("Token secret must be at least 32 bytes long");
        }

        if self.security.access_token_ttl_minutes == 0 {
            anyhow::bail!("Access token TTL must be > 0");
        }

        if self.storage.operation_timeout_ms == 0 {
            anyhow::bail!("Storage operation timeout must be > 0");
        }

        if let Some(admin) = &self.security.bootstrap_admin
            && admin.password.len() < self.security.min_password_length
        {
            anyhow::bail!(
                "Bootstrap admin password must be at least {} characters",
                self.security.min_password_length
            );
        }

        Ok(())
    }

    #[must_use]
    pub fn access_token_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.security.access_token_ttl_minutes))
    }

    #[must_use]
    pub const fn operation_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.storage.operation_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.security.token_algorithm, "HS256");
        assert_eq!(config.security.access_token_ttl_minutes, 30);
        assert_eq!(config.storage.credential_backend, CredentialBackend::Database);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[security]"));
        assert!(toml_str.contains("[storage]"));
        assert!(!toml_str.contains("token_secret"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [storage]
            credential_backend = "memory"

            [security]
            token_algorithm = "HS512"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.storage.credential_backend, CredentialBackend::Memory);
        assert_eq!(config.security.token_algorithm, "HS512");
        assert_eq!(config.security.min_password_length, 6);
    }

    #[test]
    fn test_validate_rejects_bad_security_settings() {
        let mut config = Config::default();
        config.security.token_algorithm = "RS256".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.security.token_secret = Some("short".to_string());
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.security.access_token_ttl_minutes = 0;
        assert!(config.validate().is_err());
    }
}
