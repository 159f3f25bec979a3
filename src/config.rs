//! Configuration for Hubble.
//!
//! Handles loading and merging configuration from multiple sources:
//! - Default values
//! - Project configuration (./hubble.toml or an explicit path)
//! - Environment variables (AZURE_* overrides)

use crate::client::arm::ArmCredentials;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File consulted when no explicit configuration path is given.
pub const DEFAULT_CONFIG_FILE: &str = "hubble.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Azure credentials and endpoints
    pub azure: AzureConfig,
}

/// Azure service-principal and endpoint settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AzureConfig {
    pub tenant_id: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub subscription_id: Option<String>,
    /// Management endpoint override (sovereign clouds, testing)
    pub endpoint: Option<String>,
    /// Login authority override
    pub authority: Option<String>,
}

impl Config {
    /// Loads configuration from an explicit path, or ./hubble.toml when
    /// present, with environment variables applied on top.
    pub fn load(path: Option<&PathBuf>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::from_file(default)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env();
        Ok(config)
    }

    /// Parses a TOML configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    fn apply_env(&mut self) {
        env_override(&mut self.azure.tenant_id, "AZURE_TENANT_ID");
        env_override(&mut self.azure.client_id, "AZURE_CLIENT_ID");
        env_override(&mut self.azure.client_secret, "AZURE_CLIENT_SECRET");
        env_override(&mut self.azure.subscription_id, "AZURE_SUBSCRIPTION_ID");
    }

    /// Service-principal credentials, or a configuration error naming every
    /// missing field.
    pub fn credentials(&self) -> Result<ArmCredentials> {
        let mut missing = Vec::new();
        if self.azure.tenant_id.is_none() {
            missing.push("tenant_id");
        }
        if self.azure.client_id.is_none() {
            missing.push("client_id");
        }
        if self.azure.client_secret.is_none() {
            missing.push("client_secret");
        }
        if self.azure.subscription_id.is_none() {
            missing.push("subscription_id");
        }
        if !missing.is_empty() {
            return Err(Error::Config(format!(
                "missing Azure credentials: {} (set them in the [azure] section of {} or via AZURE_* environment variables)",
                missing.join(", "),
                DEFAULT_CONFIG_FILE
            )));
        }

        Ok(ArmCredentials {
            tenant_id: self.azure.tenant_id.clone().unwrap_or_default(),
            client_id: self.azure.client_id.clone().unwrap_or_default(),
            client_secret: self.azure.client_secret.clone().unwrap_or_default(),
            subscription_id: self.azure.subscription_id.clone().unwrap_or_default(),
        })
    }
}

fn env_override(slot: &mut Option<String>, key: &str) {
    if let Ok(value) = std::env::var(key) {
        if !value.is_empty() {
            *slot = Some(value);
        }
    }
}
