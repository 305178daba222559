//! `glvar.toml`: connection settings plus declared instances.

use anyhow::{Context, Result};
use declarative::{Address, Attributes};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Environment variable consulted when the config has no token
pub const ENV_TOKEN: &str = "GITLAB_TOKEN";

#[derive(Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub gitlab: GitlabConfig,

    #[serde(default)]
    pub retry: RetrySettings,

    /// `[resource.<type>.<name>]` tables
    #[serde(default)]
    pub resource: BTreeMap<String, BTreeMap<String, Attributes>>,
}

// Attribute values may be secrets; only instance names are shown.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let instances: BTreeMap<&str, Vec<&str>> = self
            .resource
            .iter()
            .map(|(ty, names)| (ty.as_str(), names.keys().map(String::as_str).collect()))
            .collect();
        f.debug_struct("Config")
            .field("gitlab", &self.gitlab)
            .field("retry", &self.retry)
            .field("resource", &instances)
            .finish()
    }
}

#[derive(Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GitlabConfig {
    pub base_url: Option<String>,
    pub token: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl std::fmt::Debug for GitlabConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitlabConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| gitlab::REDACTED))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetrySettings {
    pub max_attempts: Option<u32>,
    pub base_delay_ms: Option<u64>,
    pub backoff_factor: Option<f64>,
}

impl Config {
    /// Load and parse the config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).with_context(|| {
            format!(
                "Could not read config {} (pass --config or set GLVAR_CONFIG_DIR)",
                path.display()
            )
        })?;
        let config = Self::parse(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Like [`Config::load`], but a missing file yields an empty config.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            log::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Declared instances keyed by address.
    pub fn desired(&self) -> Result<BTreeMap<Address, Attributes>> {
        let mut desired = BTreeMap::new();
        for (resource_type, instances) in &self.resource {
            for (name, attributes) in instances {
                let address: Address = format!("{resource_type}.{name}")
                    .parse()
                    .with_context(|| format!("Invalid instance name in [resource.{resource_type}]"))?;
                desired.insert(address, attributes.clone());
            }
        }
        Ok(desired)
    }

    /// Client settings, falling back to `$GITLAB_TOKEN` for the token.
    pub fn client_config(&self) -> gitlab::ClientConfig {
        let defaults = gitlab::ClientConfig::default();
        let retry_defaults = gitlab::RetryConfig::default();

        let token = self
            .gitlab
            .token
            .clone()
            .or_else(|| std::env::var(ENV_TOKEN).ok())
            .filter(|t| !t.is_empty());
        if token.is_none() {
            log::warn!("No GitLab token configured; requests will be unauthenticated");
        }

        gitlab::ClientConfig {
            base_url: self.gitlab.base_url.clone().unwrap_or(defaults.base_url),
            token,
            timeout: self
                .gitlab
                .timeout_secs
                .map(Duration::from_secs)
                .or(defaults.timeout),
            retry: gitlab::RetryConfig {
                max_attempts: self.retry.max_attempts.unwrap_or(retry_defaults.max_attempts),
                base_delay: self
                    .retry
                    .base_delay_ms
                    .map(Duration::from_millis)
                    .unwrap_or(retry_defaults.base_delay),
                backoff_factor: self
                    .retry
                    .backoff_factor
                    .unwrap_or(retry_defaults.backoff_factor),
                max_delay: retry_defaults.max_delay,
            },
        }
    }
}
