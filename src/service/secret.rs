//! Secret resolution and the credentials derived from it.
//!
//! The `GenericSecretProvider` trait is the only way the bot reaches secret
//! material. The default implementation reads the `[secrets]` table of the
//! configuration and falls back to process environment variables.

use std::{collections::HashMap, fmt, ops::Deref, sync::Arc};

use async_trait::async_trait;
use tracing::{info, instrument};

use crate::base::{config::Config, types::Res};

// Traits.

/// Generic secret store trait that providers must implement.
#[async_trait]
pub trait GenericSecretProvider: Send + Sync + 'static {
    /// Resolve the decrypted value of the named secret.
    async fn resolve(&self, name: &str) -> Res<String>;
}

// Structs.

/// Secret provider for the application.
///
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct SecretProvider {
    inner: Arc<dyn GenericSecretProvider>,
}

impl Deref for SecretProvider {
    type Target = dyn GenericSecretProvider;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl SecretProvider {
    pub fn new(inner: Arc<dyn GenericSecretProvider>) -> Self {
        Self { inner }
    }

    /// Creates a provider backed by the configuration, with environment fallback.
    pub fn config(config: &Config) -> Self {
        Self::new(Arc::new(ConfigSecretProvider::new(config.secrets.clone())))
    }
}

/// Secret provider that reads a static map first, then the environment.
pub struct ConfigSecretProvider {
    secrets: HashMap<String, String>,
}

impl ConfigSecretProvider {
    pub fn new(secrets: HashMap<String, String>) -> Self {
        Self { secrets }
    }
}

#[async_trait]
impl GenericSecretProvider for ConfigSecretProvider {
    async fn resolve(&self, name: &str) -> Res<String> {
        if let Some(value) = self.secrets.get(name).filter(|v| !v.is_empty()) {
            return Ok(value.clone());
        }

        match std::env::var(env_var_name(name)) {
            Ok(value) if !value.is_empty() => Ok(value),
            _ => Err(anyhow::anyhow!("Secret `{}` is not configured.", name)),
        }
    }
}

/// Environment variable consulted for a secret name: `slack_app_id-development` -> `SLACK_APP_ID_DEVELOPMENT`.
pub fn env_var_name(name: &str) -> String {
    name.chars().map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' }).collect()
}

// Credentials.

/// The Slack app identity and token, resolved once at startup.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub app_id: String,
    pub access_token: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials").field("app_id", &self.app_id).field("access_token", &"<redacted>").finish()
    }
}

impl Credentials {
    /// Resolve both secrets for `environment`; either failing is fatal.
    #[instrument(name = "Credentials::resolve", skip(secrets))]
    pub async fn resolve(secrets: &SecretProvider, environment: &str) -> Res<Self> {
        let app_id = secrets.resolve(&app_id_secret_name(environment)).await?;
        let access_token = secrets.resolve(&access_token_secret_name(environment)).await?;

        info!("Resolved Slack credentials for app `{}`.", app_id);

        Ok(Self { app_id, access_token })
    }
}

pub fn app_id_secret_name(environment: &str) -> String {
    format!("slack_app_id-{environment}")
}

pub fn access_token_secret_name(environment: &str) -> String {
    format!("slack_app_access_token-{environment}")
}

// Tests.
