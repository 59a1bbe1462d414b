//! Db secrets directory service
//!
//! Wraps the secrets management routes: every operation validates its input,
//! sends one request (two when a secret is addressed by name) and decodes the
//! response into the typed models.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{error, info};
use validator::Validate;

use crate::client::{ServiceClient, ServiceResponse, SharedClient};
use crate::error::{Result, SecretsError};
use crate::filtering::{apply_local_filters, compute_stats, glob_escape};
use crate::models::{
    AddSecret, DeleteSecret, DisableSecret, EnableSecret, GetSecret, SecretMetadata,
    SecretMetadataList, SecretRef, SecretType, SecretsFilter, SecretsStats, Tag, UpdateSecret,
};
use crate::variant::{add_payload, update_payload};

pub const SECRETS_ROUTE: &str = "api/adb/secretsmgmt/secrets";

fn secret_route(secret_id: &str) -> String {
    format!("{}/{}", SECRETS_ROUTE, secret_id)
}

fn enable_route(secret_id: &str) -> String {
    format!("{}/{}/enable", SECRETS_ROUTE, secret_id)
}

fn disable_route(secret_id: &str) -> String {
    format!("{}/{}/disable", SECRETS_ROUTE, secret_id)
}

pub struct DbSecretsService {
    client: SharedClient,
}

impl DbSecretsService {
    pub fn new(client: SharedClient) -> Self {
        Self { client }
    }

    async fn list_with_filters(
        &self,
        secret_type: Option<SecretType>,
        tags: Option<&[Tag]>,
    ) -> Result<SecretMetadataList> {
        let filter = SecretsFilter {
            secret_type,
            tags: tags.map(<[Tag]>::to_vec),
            ..Default::default()
        };
        let response = self
            .client
            .get(SECRETS_ROUTE, &filter.query_params())
            .await?;
        expect_status(&response, StatusCode::OK, "list db secrets")?;
        parse_response(&response, "list db secrets")
    }

    /// List all secrets of the tenant
    pub async fn list(&self) -> Result<SecretMetadataList> {
        info!("Listing all db secrets ({})", self.client.client_type());
        self.list_with_filters(None, None).await
    }

    /// List secrets matching a filter
    ///
    /// Type and tags are evaluated by the server, the rest locally.
    /// `total_count` reflects the filtered result.
    pub async fn list_by(&self, filter: &SecretsFilter) -> Result<SecretMetadataList> {
        filter.validate()?;
        info!("Listing db secrets by filters [{:?}]", filter);
        let secrets = self
            .list_with_filters(filter.secret_type, filter.tags.as_deref())
            .await?;
        apply_local_filters(secrets, filter)
    }

    /// Resolve a reference to exactly one secret id
    pub async fn resolve_secret_id(&self, target: &SecretRef) -> Result<String> {
        target.validate()?;
        if let Some(id) = target.secret_id.as_deref().filter(|id| !id.is_empty()) {
            return Ok(id.to_string());
        }
        let Some(name) = target.secret_name.as_deref() else {
            return Err(SecretsError::InvalidRequest(
                "either secret_id or secret_name must be supplied".to_string(),
            ));
        };

        let matches = self
            .list_by(&SecretsFilter::by_name(glob_escape(name)))
            .await?;
        match matches.secrets.as_slice() {
            [] => {
                error!("No db secret named [{}]", name);
                Err(SecretsError::NotFound {
                    name: name.to_string(),
                })
            }
            [secret] => Ok(secret.secret_id.clone()),
            many => {
                error!("Db secret name [{}] matches {} secrets", name, many.len());
                Err(SecretsError::AmbiguousName {
                    name: name.to_string(),
                    count: many.len(),
                })
            }
        }
    }

    /// Add a new secret to the secret store
    pub async fn add(&self, request: &AddSecret) -> Result<SecretMetadata> {
        request.validate()?;
        let payload = add_payload(request)?;
        info!(
            "Adding new db secret [{}] of type {}",
            request.secret_name, request.secret_type
        );

        let response = self.client.post(SECRETS_ROUTE, Some(&payload)).await?;
        expect_status(&response, StatusCode::CREATED, "add db secret")?;
        let metadata: SecretMetadata = parse_response(&response, "add db secret")?;
        info!("Added db secret with id [{}]", metadata.secret_id);
        Ok(metadata)
    }

    /// Update an existing secret
    pub async fn update(&self, request: &UpdateSecret) -> Result<SecretMetadata> {
        request.validate()?;
        let payload = update_payload(request)?;
        let secret_id = self.resolve_secret_id(&request.target()).await?;
        info!("Updating existing db secret with id [{}]", secret_id);

        let response = self
            .client
            .patch(&secret_route(&secret_id), &payload)
            .await?;
        expect_status(&response, StatusCode::OK, "update db secret")?;
        parse_response(&response, "update db secret")
    }

    pub async fn delete(&self, request: &DeleteSecret) -> Result<()> {
        let secret_id = self.resolve_secret_id(request).await?;
        info!("Deleting db secret by id [{}]", secret_id);

        let response = self.client.delete(&secret_route(&secret_id)).await?;
        expect_status(&response, StatusCode::NO_CONTENT, "delete db secret")
    }

    pub async fn enable(&self, request: &EnableSecret) -> Result<()> {
        let secret_id = self.resolve_secret_id(request).await?;
        info!("Enabling db secret by id [{}]", secret_id);

        let response = self.client.post(&enable_route(&secret_id), None).await?;
        expect_status(&response, StatusCode::OK, "enable db secret")
    }

    pub async fn disable(&self, request: &DisableSecret) -> Result<()> {
        let secret_id = self.resolve_secret_id(request).await?;
        info!("Disabling db secret by id [{}]", secret_id);

        let response = self.client.post(&disable_route(&secret_id), None).await?;
        expect_status(&response, StatusCode::OK, "disable db secret")
    }

    /// Retrieve a single secret's metadata
    pub async fn get(&self, request: &GetSecret) -> Result<SecretMetadata> {
        let secret_id = self.resolve_secret_id(request).await?;
        info!("Retrieving db secret by id [{}]", secret_id);

        let response = self.client.get(&secret_route(&secret_id), &[]).await?;
        expect_status(&response, StatusCode::OK, "retrieve db secret")?;
        parse_response(&response, "retrieve db secret")
    }

    /// Counts over the full secrets listing
    pub async fn stats(&self) -> Result<SecretsStats> {
        info!("Calculating secrets statistics");
        let secrets = self.list().await?;
        Ok(compute_stats(&secrets))
    }
}

fn expect_status(
    response: &ServiceResponse,
    expected: StatusCode,
    operation: &'static str,
) -> Result<()> {
    if response.status == expected {
        return Ok(());
    }
    error!(
        "Failed to {} [{}] - [{}]",
        operation, response.body, response.status
    );
    Err(SecretsError::Remote {
        operation,
        status: response.status.as_u16(),
        body: response.body.clone(),
    })
}

fn parse_response<T: DeserializeOwned>(
    response: &ServiceResponse,
    operation: &'static str,
) -> Result<T> {
    response.json().map_err(|source| {
        error!(
            "Failed to parse {} response [{}] - [{}]",
            operation, source, response.body
        );
        SecretsError::ResponseParse { operation, source }
    })
}
