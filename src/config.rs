use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

use crate::errors::SdkError;
use crate::network::Network;

pub const DEFAULT_API_BASE_URL: &str = "https://api.tenderly.co/api";

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

/// Account, project and network context every request is made in.
///
/// Values are never mutated once a client holds them; use [`Configuration::with`]
/// to derive a new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    pub account_name: String,
    pub project_name: String,
    pub access_key: String,
    pub network: Network,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

/// Partial configuration; every `Some` field replaces the original value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigurationOverride {
    pub account_name: Option<String>,
    pub project_name: Option<String>,
    pub access_key: Option<String>,
    pub network: Option<Network>,
    pub api_base_url: Option<String>,
}

impl Configuration {
    pub fn new(
        account_name: impl Into<String>,
        project_name: impl Into<String>,
        access_key: impl Into<String>,
        network: Network,
    ) -> Self {
        Self {
            account_name: account_name.into(),
            project_name: project_name.into(),
            access_key: access_key.into(),
            network,
            api_base_url: default_api_base_url(),
        }
    }

    pub fn with_api_base_url(mut self, api_base_url: impl Into<String>) -> Self {
        self.api_base_url = api_base_url.into();
        self
    }

    /// Shallow merge of `overrides` onto a copy of `self`.
    pub fn with(&self, overrides: ConfigurationOverride) -> Self {
        Self {
            account_name: overrides
                .account_name
                .unwrap_or_else(|| self.account_name.clone()),
            project_name: overrides
                .project_name
                .unwrap_or_else(|| self.project_name.clone()),
            access_key: overrides
                .access_key
                .unwrap_or_else(|| self.access_key.clone()),
            network: overrides.network.unwrap_or(self.network),
            api_base_url: overrides
                .api_base_url
                .unwrap_or_else(|| self.api_base_url.clone()),
        }
    }

    /// Rejects configurations a client must not be built from.
    pub fn validate(&self) -> std::result::Result<(), SdkError> {
        let missing: Vec<&str> = [
            ("accessKey", &self.access_key),
            ("accountName", &self.account_name),
            ("projectName", &self.project_name),
        ]
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();

        if !missing.is_empty() {
            return Err(SdkError::invalid_constructor(format!(
                "Missing required configuration: {}",
                missing.join(", ")
            )));
        }

        // Both names are interpolated into request paths as single segments.
        for (name, value) in [
            ("accountName", &self.account_name),
            ("projectName", &self.project_name),
        ] {
            if let Some(bad) = value
                .chars()
                .find(|&c| matches!(c, '/' | '?' | '#' | '%' | '\\') || c.is_whitespace())
            {
                return Err(SdkError::invalid_constructor(format!(
                    "{} '{}' contains the character {:?}, which is not allowed in a path segment",
                    name, value, bad
                )));
            }
        }

        if self.api_base_url.trim().is_empty() {
            return Err(SdkError::invalid_constructor("API base URL cannot be empty"));
        }

        Ok(())
    }
}

/// On-disk settings for the MCP binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub account: AccountSettings,
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSettings {
    pub account_name: String,
    pub project_name: String,
    #[serde(default)]
    pub access_key: String,
    pub network: Network,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    pub base_url: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_api_base_url(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub allow_write_operations: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            account: AccountSettings {
                account_name: String::new(),
                project_name: String::new(),
                access_key: String::new(),
                network: Network::Mainnet,
            },
            api: ApiSettings::default(),
            security: SecurityConfig::default(),
        }
    }
}

impl Settings {
    /// Settings for the binary, in increasing precedence: built-in defaults,
    /// the config file, then `TENDERLY_*` environment variables.
    ///
    /// An explicit `path` must exist and parse. Without one the default path
    /// is used when a file is present there.
    pub async fn resolve(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(path) => Self::read(path).await?,
            None => match Self::default_config_path() {
                Ok(default) if default.is_file() => Self::read(&default).await?,
                _ => {
                    tracing::info!("No configuration file found, using defaults");
                    Self::default()
                }
            },
        };

        settings.apply_env_vars();
        Ok(settings)
    }

    async fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Cannot read settings from {}", path.display()))?;
        let settings = toml::from_str(&content)
            .with_context(|| format!("Malformed settings in {}", path.display()))?;

        tracing::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Environment variables take precedence over file values.
    fn apply_env_vars(&mut self) {
        if let Ok(access_key) = std::env::var("TENDERLY_ACCESS_KEY") {
            tracing::info!("Using TENDERLY_ACCESS_KEY environment variable");
            self.account.access_key = access_key;
        } else if self.account.access_key.is_empty() {
            tracing::warn!("No access key configured, set TENDERLY_ACCESS_KEY");
        }

        if let Ok(account_name) = std::env::var("TENDERLY_ACCOUNT_NAME") {
            tracing::debug!("Using TENDERLY_ACCOUNT_NAME environment variable");
            self.account.account_name = account_name;
        }

        if let Ok(project_name) = std::env::var("TENDERLY_PROJECT_NAME") {
            tracing::debug!("Using TENDERLY_PROJECT_NAME environment variable");
            self.account.project_name = project_name;
        }

        if let Ok(base_url) = std::env::var("TENDERLY_API_BASE_URL") {
            tracing::debug!("Using TENDERLY_API_BASE_URL environment variable");
            self.api.base_url = base_url;
        }
    }

    pub fn to_configuration(&self) -> Configuration {
        Configuration::new(
            self.account.account_name.clone(),
            self.account.project_name.clone(),
            self.account.access_key.clone(),
            self.account.network,
        )
        .with_api_base_url(self.api.base_url.clone())
    }

    /// Get default config file path
    pub fn default_config_path() -> Result<std::path::PathBuf> {
        let config_dir =
            dirs::config_dir().ok_or_else(|| anyhow!("Could not determine config directory"))?;
        Ok(config_dir.join("tenderly-mcp").join("config.toml"))
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        let sample_config = r#"# Tenderly MCP Server Configuration File

[account]
account_name = "my-account"
project_name = "my-project"
# access_key = "..."  # prefer the TENDERLY_ACCESS_KEY environment variable
network = 1

[api]
base_url = "https://api.tenderly.co/api"

# Security settings
[security]
allow_write_operations = false

# Environment variables that can be used:
# TENDERLY_ACCESS_KEY - API access key
# TENDERLY_ACCOUNT_NAME - overrides account.account_name
# TENDERLY_PROJECT_NAME - overrides account.project_name
# TENDERLY_API_BASE_URL - overrides api.base_url
"#;
        sample_config.to_string()
    }
}
