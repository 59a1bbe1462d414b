//! Service client implementations
//!
//! The secrets service talks to the platform through the [`ServiceClient`]
//! trait; [`HttpServiceClient`] is the reqwest-backed implementation.

mod http;
mod refresh;
mod service_client;

pub use http::HttpServiceClient;
pub use refresh::{ConnectionRefresher, FileTokenRefresher};
pub use service_client::{ServiceClient, ServiceResponse};

/// Shared handle to a service client
pub type SharedClient = std::sync::Arc<dyn ServiceClient>;
