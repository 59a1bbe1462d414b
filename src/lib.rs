//! SIA DB Secrets Library
//!
//! Typed client for the database secrets management API: add, update,
//! delete, enable, disable, get, list and aggregate db secrets.

pub mod client;
pub mod config;
pub mod error;
pub mod filtering;
pub mod models;
pub mod service;
pub mod variant;

pub use client::{HttpServiceClient, ServiceClient};
pub use config::Config;
pub use error::{Result, SecretsError};
pub use service::DbSecretsService;
