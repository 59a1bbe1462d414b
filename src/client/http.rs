use reqwest::{Client, Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::refresh::ConnectionRefresher;
use super::service_client::{ServiceClient, ServiceResponse};
use crate::error::Result;

const USER_AGENT: &str = concat!("sia-db-secrets/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Bearer-token HTTP client for a platform service
///
/// When a call comes back `401 Unauthorized` and a refresher is attached, the
/// token is replaced and the call is sent once more.
pub struct HttpServiceClient {
    client: Client,
    base_url: String,
    token: RwLock<SecretString>,
    refresher: Option<Arc<dyn ConnectionRefresher>>,
}

impl HttpServiceClient {
    /// Create a client with the default timeout
    pub fn new(base_url: impl Into<String>, token: SecretString) -> Result<Self> {
        Self::with_timeout(
            base_url,
            token,
            Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
        )
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        token: SecretString,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            token: RwLock::new(token),
            refresher: None,
        })
    }

    /// Attach the callback used to renew the token on authentication failure
    pub fn with_refresher(mut self, refresher: Arc<dyn ConnectionRefresher>) -> Self {
        self.refresher = Some(refresher);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn build_url(&self, route: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            route.trim_start_matches('/')
        )
    }

    async fn send_once(
        &self,
        method: &Method,
        url: &str,
        query: &[(String, String)],
        body: Option<&Value>,
    ) -> Result<reqwest::Response> {
        // The header is copied into the builder, so the guard is released
        // before the request is sent
        let mut request = {
            let token = self.token.read().await;
            self.client
                .request(method.clone(), url)
                .bearer_auth(token.expose_secret())
        };
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        Ok(request.send().await?)
    }
}

#[async_trait::async_trait]
impl ServiceClient for HttpServiceClient {
    async fn execute(
        &self,
        method: Method,
        route: &str,
        query: &[(String, String)],
        body: Option<&Value>,
    ) -> Result<ServiceResponse> {
        let url = self.build_url(route);
        debug!("{} {} {:?}", method, url, query);

        let mut response = self.send_once(&method, &url, query, body).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            if let Some(ref refresher) = self.refresher {
                warn!("Request to {} was unauthorized, refreshing connection", url);
                let token = refresher.refresh().await?;
                *self.token.write().await = token;
                response = self.send_once(&method, &url, query, body).await?;
            }
        }

        let status = response.status();
        let body = response.text().await?;
        Ok(ServiceResponse { status, body })
    }

    fn client_type(&self) -> &'static str {
        "HTTP"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> HttpServiceClient {
        HttpServiceClient::new(base_url, SecretString::from("test-token".to_string())).unwrap()
    }

    #[test]
    fn test_http_client_new() {
        let client = client("https://tenant.dpa.example.com");
        assert_eq!(client.base_url(), "https://tenant.dpa.example.com");
        assert!(client.refresher.is_none());
    }

    #[test]
    fn test_url_construction() {
        let client = client("https://tenant.dpa.example.com/");
        assert_eq!(
            client.build_url("api/adb/secretsmgmt/secrets"),
            "https://tenant.dpa.example.com/api/adb/secretsmgmt/secrets"
        );
        assert_eq!(
            client.build_url("/api/adb/secretsmgmt/secrets/abc/enable"),
            "https://tenant.dpa.example.com/api/adb/secretsmgmt/secrets/abc/enable"
        );
    }

    #[tokio::test]
    async fn test_token_unlocked_while_request_in_flight() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (connected_tx, connected_rx) = tokio::sync::oneshot::channel();
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let _ = connected_tx.send(());
            // never answer
            tokio::time::sleep(Duration::from_secs(30)).await;
            drop(socket);
        });

        let client = Arc::new(client(&format!("http://{addr}")));
        let in_flight = {
            let client = client.clone();
            tokio::spawn(async move { client.get("api/adb/secretsmgmt/secrets", &[]).await })
        };
        connected_rx.await.unwrap();

        let write = tokio::time::timeout(Duration::from_secs(5), client.token.write()).await;
        assert!(write.is_ok());

        in_flight.abort();
        server.abort();
    }
}
