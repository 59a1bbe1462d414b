use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::client::{FileTokenRefresher, HttpServiceClient};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the tenant's service, e.g. `https://mytenant.dpa.cyberark.cloud`
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// File holding the current token; re-read when the service rejects it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_file: Option<PathBuf>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_timeout_seconds() -> u64 {
    30
}

impl ServiceConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: None,
            token_file: None,
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        toml::from_str(&contents).context("Failed to parse config file")
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let service = ServiceConfig {
            url: std::env::var("SIA_URL").context("SIA_URL environment variable not set")?,
            token: std::env::var("SIA_TOKEN").ok(),
            token_file: std::env::var("SIA_TOKEN_FILE").ok().map(PathBuf::from),
            timeout_seconds: std::env::var("SIA_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_timeout_seconds),
        };

        Ok(Self { service })
    }

    /// Create a sample configuration file
    pub fn create_sample<P: AsRef<Path>>(path: P) -> Result<()> {
        let sample = Self {
            service: ServiceConfig {
                url: "https://mytenant.dpa.cyberark.cloud".to_string(),
                token: Some("your-access-token-here".to_string()),
                token_file: None,
                timeout_seconds: default_timeout_seconds(),
            },
        };

        let toml_string =
            toml::to_string_pretty(&sample).context("Failed to serialize sample config")?;
        fs::write(path.as_ref(), toml_string)
            .with_context(|| format!("Failed to write sample config to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Token to start with: the inline token, else the token file's contents
    pub fn initial_token(&self) -> Result<SecretString> {
        if let Some(ref token) = self.service.token {
            return Ok(SecretString::from(token.clone()));
        }
        let path = self.service.token_file.as_ref().ok_or_else(|| {
            anyhow::anyhow!("No token configured. Set SIA_TOKEN/SIA_TOKEN_FILE or token/token_file in [service]")
        })?;
        let token = fs::read_to_string(path)
            .with_context(|| format!("Failed to read token file: {:?}", path))?;
        let token = token.trim();
        if token.is_empty() {
            anyhow::bail!("Token file {:?} is empty", path);
        }
        Ok(SecretString::from(token.to_string()))
    }

    /// Build the HTTP client, wiring token-file refresh when a file is configured
    pub fn build_client(&self) -> Result<HttpServiceClient> {
        let client = HttpServiceClient::with_timeout(
            self.service.url.clone(),
            self.initial_token()?,
            Duration::from_secs(self.service.timeout_seconds),
        )
        .context("Failed to create HTTP client")?;

        Ok(match self.service.token_file {
            Some(ref path) => client.with_refresher(Arc::new(FileTokenRefresher::new(path))),
            None => client,
        })
    }
}
