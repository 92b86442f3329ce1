//! Engine configuration loading and validation

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{AuthzError, Result};

/// Cache sizing and background refresh settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AuthzConfig {
    #[serde(default = "default_role_not_found_cache_size")]
    pub role_not_found_cache_size: usize,
    /// Zero disables expiry
    #[serde(default)]
    pub role_not_found_ttl_secs: u64,
    #[serde(default = "default_role_permissions_high_water")]
    pub role_permissions_high_water: usize,
    #[serde(default = "default_privilege_cache_high_water")]
    pub privilege_cache_high_water: usize,
    #[serde(default = "default_permission_factory_high_water")]
    pub permission_factory_high_water: usize,
    #[serde(default = "default_role_set_high_water")]
    pub role_set_high_water: usize,
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_ms: u64,
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_ms: u64,
    #[serde(default = "default_realm_name")]
    pub realm_name: String,
}

fn default_role_not_found_cache_size() -> usize { 100_000 }
fn default_role_permissions_high_water() -> usize { 50_000 }
fn default_privilege_cache_high_water() -> usize { 100_000 }
fn default_permission_factory_high_water() -> usize { 100_000 }
fn default_role_set_high_water() -> usize { 50_000 }
fn default_refresh_interval() -> u64 { 3_000 }
fn default_shutdown_grace() -> u64 { 2_000 }
fn default_realm_name() -> String { "XmlAuthorizingRealm".to_string() }

impl Default for AuthzConfig {
    fn default() -> Self {
        Self {
            role_not_found_cache_size: default_role_not_found_cache_size(),
            role_not_found_ttl_secs: 0,
            role_permissions_high_water: default_role_permissions_high_water(),
            privilege_cache_high_water: default_privilege_cache_high_water(),
            permission_factory_high_water: default_permission_factory_high_water(),
            role_set_high_water: default_role_set_high_water(),
            refresh_interval_ms: default_refresh_interval(),
            shutdown_grace_ms: default_shutdown_grace(),
            realm_name: default_realm_name(),
        }
    }
}

impl AuthzConfig {
    /// Load configuration from a TOML file, then apply environment overrides
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read {}", path.as_ref().display()))?;

        let mut config = Self::from_toml_str(&contents)?;
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text; missing fields take defaults
    pub fn from_toml_str(contents: &str) -> anyhow::Result<Self> {
        toml::from_str(contents).context("Failed to parse authorization configuration")
    }

    /// Apply `AUTHZ_*` environment overrides
    pub fn apply_env(&mut self) -> anyhow::Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("AUTHZ_ROLE_NOT_FOUND_CACHE_SIZE") {
            self.role_not_found_cache_size = value
                .trim()
                .parse()
                .context("Invalid AUTHZ_ROLE_NOT_FOUND_CACHE_SIZE")?;
        }
        if let Some(value) = lookup("AUTHZ_REFRESH_INTERVAL_MS") {
            self.refresh_interval_ms = value
                .trim()
                .parse()
                .context("Invalid AUTHZ_REFRESH_INTERVAL_MS")?;
        }
        if let Some(value) = lookup("AUTHZ_SHUTDOWN_GRACE_MS") {
            self.shutdown_grace_ms = value
                .trim()
                .parse()
                .context("Invalid AUTHZ_SHUTDOWN_GRACE_MS")?;
        }
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.role_not_found_cache_size == 0 {
            return Err(AuthzError::Config(
                "role_not_found_cache_size must be greater than 0".to_string(),
            ));
        }

        if self.refresh_interval_ms == 0 {
            return Err(AuthzError::Config(
                "refresh_interval_ms must be greater than 0".to_string(),
            ));
        }

        if self.realm_name.trim().is_empty() {
            return Err(AuthzError::Config("realm_name cannot be empty".to_string()));
        }

        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    /// `None` when negative role lookups never expire
    pub fn role_not_found_ttl(&self) -> Option<Duration> {
        (self.role_not_found_ttl_secs > 0).then(|| Duration::from_secs(self.role_not_found_ttl_secs))
    }
}
