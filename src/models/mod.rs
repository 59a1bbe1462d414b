//! Request and response models for the db secrets API

mod filter;
mod metadata;
mod requests;
mod secret_type;
mod tag;

pub use filter::{SecretsFilter, SecretsStats};
pub use metadata::{SecretLink, SecretMetadata, SecretMetadataList, SecretStore};
pub use requests::{
    AddSecret, DeleteSecret, DisableSecret, EnableSecret, GetSecret, SecretRef, UpdateSecret,
};
pub use secret_type::{SecretType, StoreType};
pub use tag::Tag;
