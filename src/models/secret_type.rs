use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SecretsError;

/// Shape of a db secret, deciding which companion fields are required
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SecretType {
    #[serde(rename = "username_password")]
    UsernamePassword,
    #[serde(rename = "cyberark_pam")]
    CyberArkPam,
    #[serde(rename = "iam_user")]
    IamUser,
    #[serde(rename = "atlas_access_keys")]
    AtlasAccessKeys,
}

/// Backend holding the secret
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StoreType {
    #[serde(rename = "managed")]
    Managed,
    #[serde(rename = "pam")]
    Pam,
}

impl SecretType {
    pub const ALL: [SecretType; 4] = [
        SecretType::UsernamePassword,
        SecretType::CyberArkPam,
        SecretType::IamUser,
        SecretType::AtlasAccessKeys,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SecretType::UsernamePassword => "username_password",
            SecretType::CyberArkPam => "cyberark_pam",
            SecretType::IamUser => "iam_user",
            SecretType::AtlasAccessKeys => "atlas_access_keys",
        }
    }

    /// Store type used when a request does not name one explicitly
    pub fn default_store_type(&self) -> StoreType {
        match self {
            SecretType::UsernamePassword => StoreType::Managed,
            SecretType::CyberArkPam => StoreType::Pam,
            SecretType::IamUser => StoreType::Managed,
            SecretType::AtlasAccessKeys => StoreType::Managed,
        }
    }
}

impl StoreType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreType::Managed => "managed",
            StoreType::Pam => "pam",
        }
    }
}

impl fmt::Display for SecretType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for StoreType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SecretType {
    type Err = SecretsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        SecretType::ALL
            .into_iter()
            .find(|t| t.as_str() == lower)
            .ok_or_else(|| SecretsError::InvalidValue {
                kind: "secret type",
                value: s.to_string(),
            })
    }
}

impl FromStr for StoreType {
    type Err = SecretsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "managed" => Ok(StoreType::Managed),
            "pam" => Ok(StoreType::Pam),
            _ => Err(SecretsError::InvalidValue {
                kind: "store type",
                value: s.to_string(),
            }),
        }
    }
}
