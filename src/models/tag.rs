use serde::{Deserialize, Serialize};
use std::str::FromStr;
use validator::Validate;

use crate::error::SecretsError;

/// Key/value label attached to a secret
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Tag {
    #[validate(length(min = 1, max = 128, message = "Tag key must be 1-128 characters"))]
    pub key: String,
    #[validate(length(max = 256, message = "Tag value must be at most 256 characters"))]
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Parses `key=value`
impl FromStr for Tag {
    type Err = SecretsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, value) = s.split_once('=').ok_or_else(|| SecretsError::InvalidValue {
            kind: "tag",
            value: s.to_string(),
        })?;
        let tag = Tag::new(key.trim(), value.trim());
        tag.validate()?;
        Ok(tag)
    }
}
