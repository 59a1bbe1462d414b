use thiserror::Error;

/// Errors returned by the secrets service and its models
#[derive(Debug, Error)]
pub enum SecretsError {
    /// A model failed its declared field constraints
    #[error("validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// A value could not be parsed into one of the known enum members
    #[error("invalid {kind}: {value}")]
    InvalidValue { kind: &'static str, value: String },

    /// The request is missing companion fields or is otherwise inconsistent
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("no db secret named [{name}] was found")]
    NotFound { name: String },

    #[error("secret name [{name}] is ambiguous, {count} secrets match")]
    AmbiguousName { name: String, count: usize },

    /// The server answered with a status the operation does not accept
    #[error("Failed to {operation} [{body}] - [{status}]")]
    Remote {
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error("Failed to parse {operation} response [{source}]")]
    ResponseParse {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to refresh connection: {0}")]
    Refresh(String),
}

pub type Result<T> = std::result::Result<T, SecretsError>;

impl SecretsError {
    /// HTTP status carried by a remote failure, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            SecretsError::Remote { status, .. } => Some(*status),
            SecretsError::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
