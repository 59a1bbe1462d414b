use secrecy::SecretString;
use validator::Validate;

use super::{SecretType, StoreType, Tag};

/// Request to create a db secret
///
/// Only the companion fields matching `secret_type` are sent, the rest are
/// ignored. Sensitive values stay wrapped until the payload is built.
#[derive(Debug, Validate)]
pub struct AddSecret {
    #[validate(length(min = 1, max = 256, message = "Secret name must be 1-256 characters"))]
    pub secret_name: String,
    #[validate(length(max = 1024))]
    pub description: Option<String>,
    #[validate(length(max = 1024))]
    pub purpose: Option<String>,
    pub secret_type: SecretType,
    pub store_type: Option<StoreType>,
    #[validate(nested)]
    pub tags: Vec<Tag>,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub pam_safe: Option<String>,
    pub pam_account_name: Option<String>,
    pub iam_account: Option<String>,
    pub iam_username: Option<String>,
    pub iam_access_key_id: Option<SecretString>,
    pub iam_secret_access_key: Option<SecretString>,
    pub atlas_public_key: Option<String>,
    pub atlas_private_key: Option<SecretString>,
}

impl AddSecret {
    pub fn new(secret_name: impl Into<String>, secret_type: SecretType) -> Self {
        Self {
            secret_name: secret_name.into(),
            description: None,
            purpose: None,
            secret_type,
            store_type: None,
            tags: Vec::new(),
            username: None,
            password: None,
            pam_safe: None,
            pam_account_name: None,
            iam_account: None,
            iam_username: None,
            iam_access_key_id: None,
            iam_secret_access_key: None,
            atlas_public_key: None,
            atlas_private_key: None,
        }
    }

    /// Store type sent to the server, falling back to the secret type's default
    pub fn effective_store_type(&self) -> StoreType {
        self.store_type
            .unwrap_or_else(|| self.secret_type.default_store_type())
    }
}

/// Partial update of an existing secret, addressed by id or by name
#[derive(Debug, Default, Validate)]
pub struct UpdateSecret {
    pub secret_id: Option<String>,
    #[validate(length(min = 1, max = 256))]
    pub secret_name: Option<String>,
    #[validate(length(min = 1, max = 256, message = "New secret name must be 1-256 characters"))]
    pub new_secret_name: Option<String>,
    #[validate(length(max = 1024))]
    pub description: Option<String>,
    #[validate(length(max = 1024))]
    pub purpose: Option<String>,
    #[validate(nested)]
    pub tags: Option<Vec<Tag>>,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub pam_safe: Option<String>,
    pub pam_account_name: Option<String>,
    pub iam_account: Option<String>,
    pub iam_username: Option<String>,
    pub iam_access_key_id: Option<SecretString>,
    pub iam_secret_access_key: Option<SecretString>,
    pub atlas_public_key: Option<String>,
    pub atlas_private_key: Option<SecretString>,
}

impl UpdateSecret {
    pub fn target(&self) -> SecretRef {
        SecretRef {
            secret_id: self.secret_id.clone(),
            secret_name: self.secret_name.clone(),
        }
    }
}

/// Identifies a single secret by id, or by a name that must resolve to one id
#[derive(Debug, Clone, Default, PartialEq, Eq, Validate)]
pub struct SecretRef {
    pub secret_id: Option<String>,
    #[validate(length(min = 1, max = 256))]
    pub secret_name: Option<String>,
}

impl SecretRef {
    pub fn by_id(secret_id: impl Into<String>) -> Self {
        Self {
            secret_id: Some(secret_id.into()),
            secret_name: None,
        }
    }

    pub fn by_name(secret_name: impl Into<String>) -> Self {
        Self {
            secret_id: None,
            secret_name: Some(secret_name.into()),
        }
    }
}

pub type GetSecret = SecretRef;
pub type DeleteSecret = SecretRef;
pub type EnableSecret = SecretRef;
pub type DisableSecret = SecretRef;
