//! CLI parsing and command execution
//!
//! This module handles command-line argument parsing and routes commands to the secrets service.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use secrecy::SecretString;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use sia_db_secrets::config::{Config, ServiceConfig};
use sia_db_secrets::models::{
    AddSecret, SecretRef, SecretType, SecretsFilter, StoreType, Tag, UpdateSecret,
};
use sia_db_secrets::DbSecretsService;

#[derive(Parser)]
#[command(name = "sia-secrets")]
#[command(about = "Manage SIA database secrets", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "SIA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Service base URL (overrides config file)
    #[arg(long, env = "SIA_URL")]
    pub url: Option<String>,

    /// Access token (overrides config file)
    #[arg(long, env = "SIA_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// File holding the access token, re-read when the token expires
    #[arg(long, env = "SIA_TOKEN_FILE")]
    pub token_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a sample configuration file
    Init {
        /// Output path for the configuration file
        #[arg(short, long, default_value = "sia-secrets.toml")]
        output: PathBuf,
    },

    /// Add a new db secret
    Add {
        /// Name of the secret
        #[arg(long)]
        name: String,

        /// Secret type (username_password, cyberark_pam, iam_user, atlas_access_keys)
        #[arg(long)]
        secret_type: SecretType,

        /// Store type, defaults according to the secret type
        #[arg(long)]
        store_type: Option<StoreType>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        purpose: Option<String>,

        /// Tag as key=value, may be repeated
        #[arg(long = "tag")]
        tags: Vec<Tag>,

        #[command(flatten)]
        fields: SecretFieldArgs,
    },

    /// Update an existing db secret
    Update {
        #[command(flatten)]
        target: TargetArgs,

        /// Rename the secret
        #[arg(long)]
        new_name: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        purpose: Option<String>,

        /// Replace the tags with these key=value pairs
        #[arg(long = "tag")]
        tags: Vec<Tag>,

        #[command(flatten)]
        fields: SecretFieldArgs,
    },

    /// Delete a db secret
    Delete {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Enable a db secret
    Enable {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Disable a db secret
    Disable {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Show a db secret's metadata
    Get {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// List db secrets, optionally filtered
    List {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Show db secrets statistics
    Stats,
}

/// Secret addressed by id or by name
#[derive(Args)]
#[group(required = true, multiple = false)]
pub struct TargetArgs {
    /// Secret id
    #[arg(long)]
    pub id: Option<String>,

    /// Secret name, resolved to an id
    #[arg(long)]
    pub name: Option<String>,
}

impl From<TargetArgs> for SecretRef {
    fn from(args: TargetArgs) -> Self {
        SecretRef {
            secret_id: args.id,
            secret_name: args.name,
        }
    }
}

/// Companion fields for each secret type
#[derive(Args, Default)]
pub struct SecretFieldArgs {
    #[arg(long)]
    pub username: Option<String>,

    #[arg(long, env = "SIA_SECRET_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    #[arg(long)]
    pub pam_safe: Option<String>,

    #[arg(long)]
    pub pam_account_name: Option<String>,

    #[arg(long)]
    pub iam_account: Option<String>,

    #[arg(long)]
    pub iam_username: Option<String>,

    #[arg(long, env = "SIA_IAM_ACCESS_KEY_ID", hide_env_values = true)]
    pub iam_access_key_id: Option<String>,

    #[arg(long, env = "SIA_IAM_SECRET_ACCESS_KEY", hide_env_values = true)]
    pub iam_secret_access_key: Option<String>,

    #[arg(long)]
    pub atlas_public_key: Option<String>,

    #[arg(long, env = "SIA_ATLAS_PRIVATE_KEY", hide_env_values = true)]
    pub atlas_private_key: Option<String>,
}

#[derive(Args, Default)]
pub struct FilterArgs {
    #[arg(long)]
    pub secret_type: Option<SecretType>,

    #[arg(long)]
    pub store_type: Option<StoreType>,

    /// Name glob, e.g. "db-*"
    #[arg(long)]
    pub name: Option<String>,

    /// Only active secrets
    #[arg(long, conflicts_with = "inactive")]
    pub active: bool,

    /// Only inactive secrets
    #[arg(long)]
    pub inactive: bool,

    /// Tag as key=value, may be repeated
    #[arg(long = "tag")]
    pub tags: Vec<Tag>,
}

impl FilterArgs {
    fn into_filter(self) -> SecretsFilter {
        let is_active = match (self.active, self.inactive) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        };
        SecretsFilter {
            secret_type: self.secret_type,
            tags: (!self.tags.is_empty()).then_some(self.tags),
            store_type: self.store_type,
            secret_name: self.name,
            is_active,
        }
    }
}

fn wrap(value: Option<String>) -> Option<SecretString> {
    value.map(SecretString::from)
}

fn build_add(
    name: String,
    secret_type: SecretType,
    store_type: Option<StoreType>,
    description: Option<String>,
    purpose: Option<String>,
    tags: Vec<Tag>,
    fields: SecretFieldArgs,
) -> AddSecret {
    AddSecret {
        description,
        purpose,
        store_type,
        tags,
        username: fields.username,
        password: wrap(fields.password),
        pam_safe: fields.pam_safe,
        pam_account_name: fields.pam_account_name,
        iam_account: fields.iam_account,
        iam_username: fields.iam_username,
        iam_access_key_id: wrap(fields.iam_access_key_id),
        iam_secret_access_key: wrap(fields.iam_secret_access_key),
        atlas_public_key: fields.atlas_public_key,
        atlas_private_key: wrap(fields.atlas_private_key),
        ..AddSecret::new(name, secret_type)
    }
}

fn build_update(
    target: TargetArgs,
    new_name: Option<String>,
    description: Option<String>,
    purpose: Option<String>,
    tags: Vec<Tag>,
    fields: SecretFieldArgs,
) -> UpdateSecret {
    UpdateSecret {
        secret_id: target.id,
        secret_name: target.name,
        new_secret_name: new_name,
        description,
        purpose,
        tags: (!tags.is_empty()).then_some(tags),
        username: fields.username,
        password: wrap(fields.password),
        pam_safe: fields.pam_safe,
        pam_account_name: fields.pam_account_name,
        iam_account: fields.iam_account,
        iam_username: fields.iam_username,
        iam_access_key_id: wrap(fields.iam_access_key_id),
        iam_secret_access_key: wrap(fields.iam_secret_access_key),
        atlas_public_key: fields.atlas_public_key,
        atlas_private_key: wrap(fields.atlas_private_key),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to render output")?;
    println!("{}", rendered);
    Ok(())
}

/// Load configuration, then apply command-line overrides
fn load_config(
    config_path: Option<PathBuf>,
    url: Option<String>,
    token: Option<String>,
    token_file: Option<PathBuf>,
) -> Result<Config> {
    let mut config = match (config_path, &url) {
        (Some(path), _) => Config::from_file(&path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        (None, Some(url)) => Config {
            service: ServiceConfig::new(url.clone()),
        },
        (None, None) => Config::from_env().context("Failed to load config from environment")?,
    };

    if let Some(url) = url {
        config.service.url = url;
    }
    if let Some(token) = token {
        config.service.token = Some(token);
    }
    if let Some(token_file) = token_file {
        config.service.token_file = Some(token_file);
    }

    Ok(config)
}

/// Execute a CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    // Handle init command separately as it doesn't need a connection
    if let Commands::Init { output } = cli.command {
        Config::create_sample(&output)
            .with_context(|| format!("Failed to create sample config at {:?}", output))?;
        info!("Sample configuration created at {:?}", output);
        return Ok(());
    }

    let config = load_config(cli.config, cli.url, cli.token, cli.token_file)?;
    let client = config.build_client()?;
    let service = DbSecretsService::new(Arc::new(client));

    match cli.command {
        Commands::Init { .. } => unreachable!(), // Handled above

        Commands::Add {
            name,
            secret_type,
            store_type,
            description,
            purpose,
            tags,
            fields,
        } => {
            let request = build_add(
                name,
                secret_type,
                store_type,
                description,
                purpose,
                tags,
                fields,
            );
            let metadata = service
                .add(&request)
                .await
                .context("Failed to add secret")?;
            print_json(&metadata)?;
        }

        Commands::Update {
            target,
            new_name,
            description,
            purpose,
            tags,
            fields,
        } => {
            let request = build_update(target, new_name, description, purpose, tags, fields);
            let metadata = service
                .update(&request)
                .await
                .context("Failed to update secret")?;
            print_json(&metadata)?;
        }

        Commands::Delete { target } => {
            service
                .delete(&target.into())
                .await
                .context("Failed to delete secret")?;
            println!("Secret deleted");
        }

        Commands::Enable { target } => {
            service
                .enable(&target.into())
                .await
                .context("Failed to enable secret")?;
            println!("Secret enabled");
        }

        Commands::Disable { target } => {
            service
                .disable(&target.into())
                .await
                .context("Failed to disable secret")?;
            println!("Secret disabled");
        }

        Commands::Get { target } => {
            let metadata = service
                .get(&target.into())
                .await
                .context("Failed to retrieve secret")?;
            print_json(&metadata)?;
        }

        Commands::List { filter } => {
            let filter = filter.into_filter();
            let secrets = if filter == SecretsFilter::default() {
                service.list().await
            } else {
                service.list_by(&filter).await
            }
            .context("Failed to list secrets")?;
            print_json(&secrets)?;
        }

        Commands::Stats => {
            let stats = service
                .stats()
                .await
                .context("Failed to calculate secrets statistics")?;
            print_json(&stats)?;
        }
    }

    Ok(())
}
