use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::Result;

/// Raw outcome of a service call: status plus the body as text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceResponse {
    pub status: StatusCode,
    pub body: String,
}

impl ServiceResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(&self.body)
    }
}

/// Authenticated access to a platform service (HTTP, or a fake in tests)
///
/// Routes are relative to the service base URL.
#[async_trait::async_trait]
pub trait ServiceClient: Send + Sync {
    async fn execute(
        &self,
        method: Method,
        route: &str,
        query: &[(String, String)],
        body: Option<&Value>,
    ) -> Result<ServiceResponse>;

    async fn get(&self, route: &str, query: &[(String, String)]) -> Result<ServiceResponse> {
        self.execute(Method::GET, route, query, None).await
    }

    async fn post(&self, route: &str, body: Option<&Value>) -> Result<ServiceResponse> {
        self.execute(Method::POST, route, &[], body).await
    }

    async fn patch(&self, route: &str, body: &Value) -> Result<ServiceResponse> {
        self.execute(Method::PATCH, route, &[], Some(body)).await
    }

    async fn delete(&self, route: &str) -> Result<ServiceResponse> {
        self.execute(Method::DELETE, route, &[], None).await
    }

    /// Name used in log lines
    fn client_type(&self) -> &'static str;
}
