use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::crypto::CredentialHasher;
use crate::db::{Permission, PermissionMap, Role};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Per-role permission overrides; roles not listed keep the standard set
    #[serde(default)]
    pub permissions: HashMap<String, Vec<Permission>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Minimum password length accepted at registration
    #[serde(default = "default_min_password_length")]
    pub min_password_length: usize,
    /// Argon2 memory cost in KiB
    #[serde(default = "default_hash_memory_kib")]
    pub hash_memory_kib: u32,
    /// Argon2 iteration count
    #[serde(default = "default_hash_iterations")]
    pub hash_iterations: u32,
    /// Seed the demo accounts on start-up
    #[serde(default = "default_seed_demo_accounts")]
    pub seed_demo_accounts: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            min_password_length: default_min_password_length(),
            hash_memory_kib: default_hash_memory_kib(),
            hash_iterations: default_hash_iterations(),
            seed_demo_accounts: default_seed_demo_accounts(),
        }
    }
}

fn default_min_password_length() -> usize {
    8
}

fn default_hash_memory_kib() -> u32 {
    19 * 1024
}

fn default_hash_iterations() -> u32 {
    2
}

fn default_seed_demo_accounts() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the durable storage file
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Key the session record is stored under in both scopes
    #[serde(default = "default_session_key")]
    pub session_key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            session_key: default_session_key(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_session_key() -> String {
    "qms_user".to_string()
}

impl StorageConfig {
    pub fn durable_path(&self) -> PathBuf {
        self.data_dir.join("local_storage.json")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            info!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::parse(&content)
        } else {
            info!("No config file found, using defaults");
            Ok(Config::default())
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).with_context(|| "Failed to parse configuration file")?;
        config.validate()?;
        Ok(config)
    }

    /// Check settings that deserialization alone cannot
    pub fn validate(&self) -> Result<()> {
        if self.auth.min_password_length == 0 {
            anyhow::bail!("auth.min_password_length must be at least 1");
        }
        if self.storage.session_key.is_empty() {
            anyhow::bail!("storage.session_key must not be empty");
        }
        self.hasher()?;
        self.permission_map()?;
        Ok(())
    }

    pub fn hasher(&self) -> Result<CredentialHasher> {
        CredentialHasher::new(self.auth.hash_memory_kib, self.auth.hash_iterations)
            .context("Invalid argon2 parameters in [auth]")
    }

    pub fn permission_map(&self) -> Result<PermissionMap> {
        let mut overrides = HashMap::new();
        for (role, permissions) in &self.permissions {
            let role: Role = role
                .parse()
                .map_err(|e: String| anyhow::anyhow!("Invalid [permissions] table: {}", e))?;
            overrides.insert(role, permissions.clone());
        }
        PermissionMap::with_overrides(overrides).context("Invalid [permissions] table")
    }
}
