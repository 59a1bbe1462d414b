use secrecy::SecretString;
use std::path::PathBuf;
use tracing::debug;

use crate::error::{Result, SecretsError};

/// Supplies a fresh token after the service rejected the current one
#[async_trait::async_trait]
pub trait ConnectionRefresher: Send + Sync {
    async fn refresh(&self) -> Result<SecretString>;
}

/// Re-reads the token from a file kept current by an external login helper
pub struct FileTokenRefresher {
    path: PathBuf,
}

impl FileTokenRefresher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub async fn read_token(&self) -> Result<SecretString> {
        let contents = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            SecretsError::Refresh(format!(
                "failed to read token file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let token = contents.trim();
        if token.is_empty() {
            return Err(SecretsError::Refresh(format!(
                "token file {} is empty",
                self.path.display()
            )));
        }

        Ok(SecretString::from(token.to_string()))
    }
}

#[async_trait::async_trait]
impl ConnectionRefresher for FileTokenRefresher {
    async fn refresh(&self) -> Result<SecretString> {
        debug!("Reloading token from {}", self.path.display());
        self.read_token().await
    }
}
