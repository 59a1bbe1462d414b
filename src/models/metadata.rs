use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{SecretType, StoreType, Tag};
use crate::error::Result;
use crate::variant::{self, ExposedData};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretStore {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_type: Option<StoreType>,
}

/// Pointer to a credential held in an external vault
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretLink {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safe: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_name: Option<String>,
}

/// Server-side view of a db secret. Never carries the sensitive values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecretMetadata {
    pub secret_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_type: Option<SecretType>,
    #[serde(default)]
    pub secret_store: SecretStore,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_link: Option<SecretLink>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_exposed_data: Option<serde_json::Value>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "timestamp"
    )]
    pub creation_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated_by: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "timestamp"
    )]
    pub last_update_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_active: bool,
}

impl SecretMetadata {
    pub fn store_type(&self) -> Option<StoreType> {
        self.secret_store.store_type
    }

    /// Decode `secret_exposed_data` according to the secret type
    pub fn exposed_data(&self) -> Result<Option<ExposedData>> {
        match (self.secret_type, &self.secret_exposed_data) {
            (Some(secret_type), Some(raw)) => variant::decode_exposed_data(secret_type, raw),
            _ => Ok(None),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecretMetadataList {
    #[serde(default)]
    pub secrets: Vec<SecretMetadata>,
    #[serde(default)]
    pub total_count: usize,
}

/// Timestamps arrive either as RFC 3339 or as naive ISO-8601 in UTC
mod timestamp {
    use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => {
                serializer.serialize_some(&dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|s| parse(&s).map_err(de::Error::custom)).transpose()
    }

    pub(super) fn parse(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
        match DateTime::parse_from_rfc3339(s) {
            Ok(dt) => Ok(dt.with_timezone(&Utc)),
            Err(_) => NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").map(|n| n.and_utc()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn full_metadata() -> SecretMetadata {
        SecretMetadata {
            secret_id: "sec-1".to_string(),
            secret_name: Some("db-orders".to_string()),
            description: Some("orders db admin".to_string()),
            purpose: Some("ops".to_string()),
            secret_type: Some(SecretType::UsernamePassword),
            secret_store: SecretStore {
                store_id: Some("store-1".to_string()),
                store_type: Some(StoreType::Managed),
            },
            secret_link: None,
            secret_exposed_data: Some(json!({"username": "svc"})),
            tags: vec![Tag::new("env", "prod")],
            created_by: Some("admin@tenant".to_string()),
            creation_time: Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap()),
            last_updated_by: Some("admin@tenant".to_string()),
            last_update_time: Some(Utc.with_ymd_and_hms(2024, 3, 2, 8, 0, 5).unwrap()),
            is_active: true,
        }
    }

    #[test]
    fn test_metadata_json_roundtrip() {
        let metadata = full_metadata();
        let json = serde_json::to_string(&metadata).unwrap();
        let back: SecretMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(back, metadata);
    }

    #[test]
    fn test_metadata_omits_absent_fields() {
        let metadata = SecretMetadata {
            secret_name: None,
            description: None,
            purpose: None,
            secret_exposed_data: None,
            created_by: None,
            creation_time: None,
            ..full_metadata()
        };
        let value = serde_json::to_value(&metadata).unwrap();
        let object = value.as_object().unwrap();
        assert!(!object.contains_key("secret_name"));
        assert!(!object.contains_key("creation_time"));
        assert!(!object.contains_key("secret_link"));
        assert_eq!(object["secret_id"], "sec-1");
    }

    #[test]
    fn test_metadata_tolerates_unknown_fields_and_naive_timestamps() {
        let body = json!({
            "secret_id": "sec-2",
            "secret_name": "pam-link",
            "secret_type": "cyberark_pam",
            "secret_store": {"store_type": "pam", "region": "us-east-1"},
            "secret_link": {"safe": "Ops", "account_name": "dbadmin"},
            "creation_time": "2024-05-01T10:00:00.123456",
            "is_active": false,
            "tenant_id": "t-1"
        });
        let metadata: SecretMetadata = serde_json::from_value(body).unwrap();
        assert_eq!(metadata.store_type(), Some(StoreType::Pam));
        assert_eq!(
            metadata.secret_link.as_ref().and_then(|l| l.safe.as_deref()),
            Some("Ops")
        );
        assert!(metadata.tags.is_empty());
        assert!(!metadata.is_active);
        let created = metadata.creation_time.unwrap();
        assert_eq!(created.timestamp_subsec_micros(), 123456);
    }

    #[test]
    fn test_metadata_rejects_unknown_secret_type() {
        let body = json!({"secret_id": "x", "secret_type": "ssh_key"});
        assert!(serde_json::from_value::<SecretMetadata>(body).is_err());
    }

    #[test]
    fn test_timestamp_parse_rfc3339_offset() {
        let dt = timestamp::parse("2024-01-01T02:00:00+02:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_metadata_list_defaults() {
        let list: SecretMetadataList = serde_json::from_str("{}").unwrap();
        assert!(list.secrets.is_empty());
        assert_eq!(list.total_count, 0);
    }
}
