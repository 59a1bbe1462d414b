use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::Validate;

use super::{SecretType, StoreType, Tag};

/// Query over the secrets list
///
/// `secret_type` and `tags` are sent to the server, the remaining fields are
/// applied locally on the fetched list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct SecretsFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_type: Option<SecretType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(nested)]
    pub tags: Option<Vec<Tag>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_type: Option<StoreType>,
    /// Shell-style glob matched against the secret name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl SecretsFilter {
    pub fn by_name(pattern: impl Into<String>) -> Self {
        Self {
            secret_name: Some(pattern.into()),
            ..Default::default()
        }
    }

    /// Query parameters understood by the list endpoint
    pub fn query_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(secret_type) = self.secret_type {
            params.push(("secret_type".to_string(), secret_type.as_str().to_string()));
        }
        for tag in self.tags.iter().flatten() {
            params.push((tag.key.clone(), tag.value.clone()));
        }
        params
    }
}

/// Aggregates computed over a full secrets listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretsStats {
    pub secrets_count: usize,
    pub active_secrets_count: usize,
    pub inactive_secrets_count: usize,
    pub secrets_count_by_secret_type: BTreeMap<SecretType, usize>,
    pub secrets_count_by_store_type: BTreeMap<StoreType, usize>,
}
