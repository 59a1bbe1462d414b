//! Mapping between secret variants and their wire representation
//!
//! Each [`SecretType`] owns a fixed group of companion fields. A request
//! either supplies the whole group or none of it; the complete group is
//! turned into a [`SecretVariant`], which in turn renders the `secret_data`
//! or `secret_link` sub-object of the outbound payload.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::warn;

use crate::error::{Result, SecretsError};
use crate::models::{AddSecret, SecretType, UpdateSecret};

pub const SECRET_DATA_KEY: &str = "secret_data";
pub const SECRET_LINK_KEY: &str = "secret_link";

/// A complete set of companion fields for one secret type
#[derive(Debug)]
pub enum SecretVariant<'a> {
    UsernamePassword {
        username: &'a str,
        password: &'a SecretString,
    },
    CyberArkPam {
        safe: &'a str,
        account_name: &'a str,
    },
    IamUser {
        account: &'a str,
        username: &'a str,
        access_key_id: &'a SecretString,
        secret_access_key: &'a SecretString,
    },
    AtlasAccessKeys {
        public_key: &'a str,
        private_key: &'a SecretString,
    },
}

impl<'a> SecretVariant<'a> {
    pub fn username_password(username: &'a str, password: &'a SecretString) -> Self {
        SecretVariant::UsernamePassword { username, password }
    }

    pub fn cyberark_pam(safe: &'a str, account_name: &'a str) -> Self {
        SecretVariant::CyberArkPam { safe, account_name }
    }

    pub fn iam_user(
        account: &'a str,
        username: &'a str,
        access_key_id: &'a SecretString,
        secret_access_key: &'a SecretString,
    ) -> Self {
        SecretVariant::IamUser {
            account,
            username,
            access_key_id,
            secret_access_key,
        }
    }

    pub fn atlas_access_keys(public_key: &'a str, private_key: &'a SecretString) -> Self {
        SecretVariant::AtlasAccessKeys {
            public_key,
            private_key,
        }
    }

    pub fn secret_type(&self) -> SecretType {
        match self {
            SecretVariant::UsernamePassword { .. } => SecretType::UsernamePassword,
            SecretVariant::CyberArkPam { .. } => SecretType::CyberArkPam,
            SecretVariant::IamUser { .. } => SecretType::IamUser,
            SecretVariant::AtlasAccessKeys { .. } => SecretType::AtlasAccessKeys,
        }
    }

    /// Payload key the variant is sent under
    pub fn wire_key(&self) -> &'static str {
        match self {
            SecretVariant::CyberArkPam { .. } => SECRET_LINK_KEY,
            _ => SECRET_DATA_KEY,
        }
    }

    /// Render the sub-object. This is the only place secret values are revealed.
    pub fn to_wire(&self) -> Value {
        match self {
            SecretVariant::UsernamePassword { username, password } => json!({
                "username": username,
                "password": password.expose_secret(),
            }),
            SecretVariant::CyberArkPam { safe, account_name } => json!({
                "safe": safe,
                "account_name": account_name,
            }),
            SecretVariant::IamUser {
                account,
                username,
                access_key_id,
                secret_access_key,
            } => json!({
                "account": account,
                "username": username,
                "access_key_id": access_key_id.expose_secret(),
                "secret_access_key": secret_access_key.expose_secret(),
            }),
            SecretVariant::AtlasAccessKeys {
                public_key,
                private_key,
            } => json!({
                "public_key": public_key,
                "private_key": private_key.expose_secret(),
            }),
        }
    }
}

/// Request field names making up each secret type's group
pub fn required_fields(secret_type: SecretType) -> &'static [&'static str] {
    match secret_type {
        SecretType::UsernamePassword => &["username", "password"],
        SecretType::CyberArkPam => &["pam_safe", "pam_account_name"],
        SecretType::IamUser => &[
            "iam_account",
            "iam_username",
            "iam_access_key_id",
            "iam_secret_access_key",
        ],
        SecretType::AtlasAccessKeys => &["atlas_public_key", "atlas_private_key"],
    }
}

fn incomplete(secret_type: SecretType) -> SecretsError {
    SecretsError::InvalidRequest(format!(
        "when specifying a {} secret, all of [{}] must be supplied",
        secret_type,
        required_fields(secret_type).join(", ")
    ))
}

/// Companion fields of a request. Empty strings count as absent.
struct CompanionFields<'a> {
    username: Option<&'a str>,
    password: Option<&'a SecretString>,
    pam_safe: Option<&'a str>,
    pam_account_name: Option<&'a str>,
    iam_account: Option<&'a str>,
    iam_username: Option<&'a str>,
    iam_access_key_id: Option<&'a SecretString>,
    iam_secret_access_key: Option<&'a SecretString>,
    atlas_public_key: Option<&'a str>,
    atlas_private_key: Option<&'a SecretString>,
}

fn text(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

fn secret(value: &Option<SecretString>) -> Option<&SecretString> {
    value.as_ref().filter(|s| !s.expose_secret().is_empty())
}

impl<'a> From<&'a AddSecret> for CompanionFields<'a> {
    fn from(r: &'a AddSecret) -> Self {
        Self {
            username: text(&r.username),
            password: secret(&r.password),
            pam_safe: text(&r.pam_safe),
            pam_account_name: text(&r.pam_account_name),
            iam_account: text(&r.iam_account),
            iam_username: text(&r.iam_username),
            iam_access_key_id: secret(&r.iam_access_key_id),
            iam_secret_access_key: secret(&r.iam_secret_access_key),
            atlas_public_key: text(&r.atlas_public_key),
            atlas_private_key: secret(&r.atlas_private_key),
        }
    }
}

impl<'a> From<&'a UpdateSecret> for CompanionFields<'a> {
    fn from(r: &'a UpdateSecret) -> Self {
        Self {
            username: text(&r.username),
            password: secret(&r.password),
            pam_safe: text(&r.pam_safe),
            pam_account_name: text(&r.pam_account_name),
            iam_account: text(&r.iam_account),
            iam_username: text(&r.iam_username),
            iam_access_key_id: secret(&r.iam_access_key_id),
            iam_secret_access_key: secret(&r.iam_secret_access_key),
            atlas_public_key: text(&r.atlas_public_key),
            atlas_private_key: secret(&r.atlas_private_key),
        }
    }
}

impl<'a> CompanionFields<'a> {
    /// `Ok(None)` when no field of the group is set, an error when only some are
    fn group(&self, secret_type: SecretType) -> Result<Option<SecretVariant<'a>>> {
        let variant = match secret_type {
            SecretType::UsernamePassword => match (self.username, self.password) {
                (None, None) => None,
                (Some(username), Some(password)) => {
                    Some(SecretVariant::username_password(username, password))
                }
                _ => return Err(incomplete(secret_type)),
            },
            SecretType::CyberArkPam => match (self.pam_safe, self.pam_account_name) {
                (None, None) => None,
                (Some(safe), Some(account_name)) => {
                    Some(SecretVariant::cyberark_pam(safe, account_name))
                }
                _ => return Err(incomplete(secret_type)),
            },
            SecretType::IamUser => match (
                self.iam_account,
                self.iam_username,
                self.iam_access_key_id,
                self.iam_secret_access_key,
            ) {
                (None, None, None, None) => None,
                (Some(account), Some(username), Some(key_id), Some(secret_key)) => {
                    Some(SecretVariant::iam_user(account, username, key_id, secret_key))
                }
                _ => return Err(incomplete(secret_type)),
            },
            SecretType::AtlasAccessKeys => match (self.atlas_public_key, self.atlas_private_key)
            {
                (None, None) => None,
                (Some(public_key), Some(private_key)) => {
                    Some(SecretVariant::atlas_access_keys(public_key, private_key))
                }
                _ => return Err(incomplete(secret_type)),
            },
        };
        Ok(variant)
    }

    fn touches(&self, secret_type: SecretType) -> bool {
        match secret_type {
            SecretType::UsernamePassword => self.username.is_some() || self.password.is_some(),
            SecretType::CyberArkPam => self.pam_safe.is_some() || self.pam_account_name.is_some(),
            SecretType::IamUser => {
                self.iam_account.is_some()
                    || self.iam_username.is_some()
                    || self.iam_access_key_id.is_some()
                    || self.iam_secret_access_key.is_some()
            }
            SecretType::AtlasAccessKeys => {
                self.atlas_public_key.is_some() || self.atlas_private_key.is_some()
            }
        }
    }
}

impl AddSecret {
    /// The variant selected by `secret_type`, which must be complete
    pub fn variant(&self) -> Result<SecretVariant<'_>> {
        let fields = CompanionFields::from(self);
        for other in SecretType::ALL {
            if other != self.secret_type && fields.touches(other) {
                warn!(
                    "Ignoring {} fields on a {} secret",
                    other, self.secret_type
                );
            }
        }
        fields
            .group(self.secret_type)?
            .ok_or_else(|| incomplete(self.secret_type))
    }
}

/// Build the body of an add-secret request
pub fn add_payload(request: &AddSecret) -> Result<Value> {
    let variant = request.variant()?;

    let mut body = Map::new();
    body.insert("secret_name".into(), json!(request.secret_name));
    if let Some(ref description) = request.description {
        body.insert("description".into(), json!(description));
    }
    if let Some(ref purpose) = request.purpose {
        body.insert("purpose".into(), json!(purpose));
    }
    body.insert("secret_type".into(), json!(request.secret_type));
    body.insert("tags".into(), json!(request.tags));
    body.insert(
        "secret_store".into(),
        json!({ "store_type": request.effective_store_type() }),
    );
    body.insert(variant.wire_key().into(), variant.to_wire());

    Ok(Value::Object(body))
}

/// Build the body of an update-secret request
///
/// Every group is checked on its own. A link and one data group may be sent
/// together, two data groups may not.
pub fn update_payload(request: &UpdateSecret) -> Result<Value> {
    let fields = CompanionFields::from(request);

    let mut body = Map::new();
    if let Some(ref new_name) = request.new_secret_name {
        body.insert("secret_name".into(), json!(new_name));
    }
    if let Some(ref description) = request.description {
        body.insert("description".into(), json!(description));
    }
    if let Some(ref purpose) = request.purpose {
        body.insert("purpose".into(), json!(purpose));
    }
    if let Some(ref tags) = request.tags {
        body.insert("tags".into(), json!(tags));
    }

    let mut data_type: Option<SecretType> = None;
    for secret_type in SecretType::ALL {
        let Some(variant) = fields.group(secret_type)? else {
            continue;
        };
        if variant.wire_key() == SECRET_DATA_KEY {
            // Only one `secret_data` object can be sent. A second complete
            // group is an error rather than silently replacing the first.
            if let Some(previous) = data_type {
                return Err(SecretsError::InvalidRequest(format!(
                    "conflicting secret data, both {} and {} fields were supplied",
                    previous, secret_type
                )));
            }
            data_type = Some(secret_type);
        }
        body.insert(variant.wire_key().into(), variant.to_wire());
    }

    Ok(Value::Object(body))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExposedUsernamePassword {
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExposedIamUser {
    pub account: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExposedAtlasAccessKeys {
    pub public_key: String,
}

/// Non-sensitive part of a secret's data as returned by the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExposedData {
    UsernamePassword(ExposedUsernamePassword),
    IamUser(ExposedIamUser),
    AtlasAccessKeys(ExposedAtlasAccessKeys),
}

/// Decode a `secret_exposed_data` object for the given secret type
pub fn decode_exposed_data(secret_type: SecretType, raw: &Value) -> Result<Option<ExposedData>> {
    if raw.is_null() {
        return Ok(None);
    }
    let parse_err = |source: serde_json::Error| SecretsError::ResponseParse {
        operation: "secret exposed data",
        source,
    };
    let decoded = match secret_type {
        SecretType::CyberArkPam => None,
        SecretType::UsernamePassword => Some(ExposedData::UsernamePassword(
            ExposedUsernamePassword::deserialize(raw).map_err(parse_err)?,
        )),
        SecretType::IamUser => Some(ExposedData::IamUser(
            ExposedIamUser::deserialize(raw).map_err(parse_err)?,
        )),
        SecretType::AtlasAccessKeys => Some(ExposedData::AtlasAccessKeys(
            ExposedAtlasAccessKeys::deserialize(raw).map_err(parse_err)?,
        )),
    };
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{StoreType, Tag};

    fn s(value: &str) -> Option<SecretString> {
        Some(SecretString::from(value.to_string()))
    }

    fn o(value: &str) -> Option<String> {
        Some(value.to_string())
    }

    fn complete_add(secret_type: SecretType) -> AddSecret {
        let mut request = AddSecret::new("db-orders", secret_type);
        match secret_type {
            SecretType::UsernamePassword => {
                request.username = o("svc");
                request.password = s("p@ss");
            }
            SecretType::CyberArkPam => {
                request.pam_safe = o("Ops");
                request.pam_account_name = o("dbadmin");
            }
            SecretType::IamUser => {
                request.iam_account = o("123456789012");
                request.iam_username = o("svc-iam");
                request.iam_access_key_id = s("AKIAEXAMPLE");
                request.iam_secret_access_key = s("wJalrXUtnFEMI");
            }
            SecretType::AtlasAccessKeys => {
                request.atlas_public_key = o("pub");
                request.atlas_private_key = s("priv");
            }
        }
        request
    }

    #[test]
    fn test_add_payload_username_password() {
        let request = complete_add(SecretType::UsernamePassword);
        let body = add_payload(&request).unwrap();
        assert_eq!(
            body["secret_data"],
            json!({"username": "svc", "password": "p@ss"})
        );
        assert_eq!(body["secret_store"], json!({"store_type": "managed"}));
        assert_eq!(body["secret_type"], "username_password");
        assert_eq!(body["secret_name"], "db-orders");
        assert!(body.get("secret_link").is_none());
        assert!(body.get("username").is_none());
        assert!(body.get("description").is_none());
    }

    #[test]
    fn test_add_payload_wire_keys_per_type() {
        let expected = [
            (SecretType::UsernamePassword, SECRET_DATA_KEY, StoreType::Managed),
            (SecretType::CyberArkPam, SECRET_LINK_KEY, StoreType::Pam),
            (SecretType::IamUser, SECRET_DATA_KEY, StoreType::Managed),
            (SecretType::AtlasAccessKeys, SECRET_DATA_KEY, StoreType::Managed),
        ];
        for (secret_type, key, store) in expected {
            let body = add_payload(&complete_add(secret_type)).unwrap();
            assert!(body.get(key).is_some(), "{secret_type} should use {key}");
            assert_eq!(body["secret_store"]["store_type"], store.as_str());
        }
    }

    #[test]
    fn test_add_payload_iam_and_atlas_shapes() {
        let body = add_payload(&complete_add(SecretType::IamUser)).unwrap();
        assert_eq!(
            body["secret_data"],
            json!({
                "account": "123456789012",
                "username": "svc-iam",
                "access_key_id": "AKIAEXAMPLE",
                "secret_access_key": "wJalrXUtnFEMI",
            })
        );

        let body = add_payload(&complete_add(SecretType::CyberArkPam)).unwrap();
        assert_eq!(
            body["secret_link"],
            json!({"safe": "Ops", "account_name": "dbadmin"})
        );

        let body = add_payload(&complete_add(SecretType::AtlasAccessKeys)).unwrap();
        assert_eq!(
            body["secret_data"],
            json!({"public_key": "pub", "private_key": "priv"})
        );
    }

    #[test]
    fn test_add_payload_rejects_partial_groups() {
        let mut request = complete_add(SecretType::UsernamePassword);
        request.password = None;
        assert!(matches!(
            add_payload(&request),
            Err(SecretsError::InvalidRequest(_))
        ));

        let mut request = complete_add(SecretType::IamUser);
        request.iam_secret_access_key = None;
        assert!(matches!(
            add_payload(&request),
            Err(SecretsError::InvalidRequest(_))
        ));

        let mut request = complete_add(SecretType::CyberArkPam);
        request.pam_safe = Some(String::new());
        assert!(matches!(
            add_payload(&request),
            Err(SecretsError::InvalidRequest(_))
        ));

        let mut request = complete_add(SecretType::AtlasAccessKeys);
        request.atlas_public_key = None;
        assert!(matches!(
            add_payload(&request),
            Err(SecretsError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_add_payload_requires_group_for_type() {
        let request = AddSecret::new("empty", SecretType::AtlasAccessKeys);
        let err = add_payload(&request).unwrap_err();
        assert!(err.to_string().contains("atlas_public_key"));
    }

    #[test]
    fn test_add_payload_ignores_other_groups() {
        let mut request = complete_add(SecretType::UsernamePassword);
        request.pam_safe = o("Ops");
        let body = add_payload(&request).unwrap();
        assert!(body.get("secret_link").is_none());
        assert_eq!(body["secret_data"]["username"], "svc");
    }

    #[test]
    fn test_add_payload_explicit_store_and_tags() {
        let mut request = complete_add(SecretType::UsernamePassword);
        request.store_type = Some(StoreType::Pam);
        request.tags = vec![Tag::new("env", "prod")];
        request.description = o("orders");
        let body = add_payload(&request).unwrap();
        assert_eq!(body["secret_store"]["store_type"], "pam");
        assert_eq!(body["tags"], json!([{"key": "env", "value": "prod"}]));
        assert_eq!(body["description"], "orders");
    }

    #[test]
    fn test_update_payload_rename_and_link() {
        let request = UpdateSecret {
            secret_id: o("sec-1"),
            secret_name: o("old"),
            new_secret_name: o("new"),
            pam_safe: o("Ops"),
            pam_account_name: o("dbadmin"),
            ..Default::default()
        };
        let body = update_payload(&request).unwrap();
        assert_eq!(
            body,
            json!({
                "secret_name": "new",
                "secret_link": {"safe": "Ops", "account_name": "dbadmin"},
            })
        );
    }

    #[test]
    fn test_update_payload_metadata_only() {
        let request = UpdateSecret {
            secret_id: o("sec-1"),
            description: o("rotated quarterly"),
            tags: Some(vec![]),
            ..Default::default()
        };
        let body = update_payload(&request).unwrap();
        assert_eq!(body, json!({"description": "rotated quarterly", "tags": []}));
    }

    #[test]
    fn test_update_payload_checks_each_group() {
        let request = UpdateSecret {
            secret_id: o("sec-1"),
            username: o("svc"),
            password: s("p@ss"),
            atlas_private_key: s("priv"),
            ..Default::default()
        };
        let err = update_payload(&request).unwrap_err();
        assert!(err.to_string().contains("atlas_access_keys"));
    }

    #[test]
    fn test_update_payload_link_with_data() {
        let request = UpdateSecret {
            secret_id: o("sec-1"),
            username: o("svc"),
            password: s("p@ss"),
            pam_safe: o("Ops"),
            pam_account_name: o("dbadmin"),
            ..Default::default()
        };
        let body = update_payload(&request).unwrap();
        assert!(body.get(SECRET_DATA_KEY).is_some());
        assert!(body.get(SECRET_LINK_KEY).is_some());
    }

    #[test]
    fn test_update_payload_rejects_two_data_groups() {
        let request = UpdateSecret {
            secret_id: o("sec-1"),
            username: o("svc"),
            password: s("p@ss"),
            atlas_public_key: o("pub"),
            atlas_private_key: s("priv"),
            ..Default::default()
        };
        assert!(matches!(
            update_payload(&request),
            Err(SecretsError::InvalidRequest(msg)) if msg.contains("conflicting")
        ));
    }

    #[test]
    fn test_secret_values_redacted_in_debug() {
        let request = complete_add(SecretType::UsernamePassword);
        let debug = format!("{:?}", request.variant().unwrap());
        assert!(!debug.contains("p@ss"));
        assert!(!format!("{:?}", request).contains("p@ss"));
    }

    #[test]
    fn test_decode_exposed_data() {
        let decoded =
            decode_exposed_data(SecretType::UsernamePassword, &json!({"username": "svc"}))
                .unwrap();
        assert_eq!(
            decoded,
            Some(ExposedData::UsernamePassword(ExposedUsernamePassword {
                username: "svc".to_string()
            }))
        );

        let decoded = decode_exposed_data(
            SecretType::IamUser,
            &json!({"account": "1234", "username": "svc-iam"}),
        )
        .unwrap();
        assert!(matches!(
            decoded,
            Some(ExposedData::IamUser(ExposedIamUser { access_key_id: None, .. }))
        ));

        assert_eq!(
            decode_exposed_data(SecretType::CyberArkPam, &json!({"safe": "Ops"})).unwrap(),
            None
        );
        assert_eq!(
            decode_exposed_data(SecretType::AtlasAccessKeys, &Value::Null).unwrap(),
            None
        );
    }

    #[test]
    fn test_decode_exposed_data_mismatch() {
        let err = decode_exposed_data(SecretType::AtlasAccessKeys, &json!({"username": "svc"}))
            .unwrap_err();
        assert!(matches!(err, SecretsError::ResponseParse { .. }));
    }
}
