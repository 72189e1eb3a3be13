//! Load configuration via `config` crate with env-override support.

use std::{collections::HashMap, ops::Deref, sync::Arc};

use serde::Deserialize;

use super::types::Res;

/// Default deployment environment, used as the secret name suffix.
fn default_environment() -> String {
    "development".to_string()
}

/// Default base URL for Slack Web API calls.
fn default_slack_api_base_url() -> String {
    "https://slack.com/api".to_string()
}

/// Default address for the webhook listener.
fn default_bind_address() -> String {
    "0.0.0.0:3000".to_string()
}

/// Default route for Slack event deliveries.
fn default_events_path() -> String {
    "/slack/events".to_string()
}

/// Configuration for the history-bot application.
///
/// Only [`ConfigInner`] is deserialized; this wrapper shares it cheaply.
#[derive(Debug, Clone)]
pub struct Config {
    /// The shared configuration values.
    pub inner: Arc<ConfigInner>,
}

impl Deref for Config {
    type Target = ConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Configuration values, as loaded from the environment and config file.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ConfigInner {
    /// Deployment environment (`ENVIRONMENT`).
    /// Secrets are resolved as `slack_app_id-<environment>` and `slack_app_access_token-<environment>`.
    #[serde(default = "default_environment")]
    pub environment: String,
    /// Slack Web API base URL (`SLACK_API_BASE_URL`).
    #[serde(default = "default_slack_api_base_url")]
    pub slack_api_base_url: String,
    /// Listener address for the events webhook (`BIND_ADDRESS`).
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Route that receives Slack event deliveries (`EVENTS_PATH`).
    #[serde(default = "default_events_path")]
    pub events_path: String,
    /// Slack signing secret (`SLACK_SIGNING_SECRET`).
    /// When set, every delivery must carry a valid `X-Slack-Signature`.
    #[serde(default)]
    pub slack_signing_secret: Option<String>,
    /// Timeout for outbound Slack calls, in seconds (`HTTP_TIMEOUT_SECS`).
    /// Outbound calls wait indefinitely when unset.
    #[serde(default)]
    pub http_timeout_secs: Option<u64>,
    /// Static secret values keyed by secret name (`[secrets]` table in the config file).
    #[serde(default)]
    pub secrets: HashMap<String, String>,
}

impl Config {
    /// Load from `HISTORY_BOT_*` environment variables, then the explicit file or `.hidden/config.toml`.
    pub fn load(explicit_path: Option<&std::path::Path>) -> Res<Self> {
        let mut cfg = config::Config::builder().add_source(config::Environment::default().prefix("HISTORY_BOT"));

        if let Some(p) = explicit_path {
            cfg = cfg.add_source(config::File::from(p.to_path_buf()));
        } else if std::path::Path::new(".hidden/config.toml").exists() {
            cfg = cfg.add_source(config::File::with_name(".hidden/config.toml"));
        }

        let result = Config {
            inner: Arc::new(cfg.build()?.try_deserialize()?),
        };

        result.validate()?;

        Ok(result)
    }

    fn validate(&self) -> Res<()> {
        if self.environment.is_empty() {
            return Err(anyhow::anyhow!("Environment must not be empty."));
        }

        if !self.slack_api_base_url.starts_with("http") {
            return Err(anyhow::anyhow!("Slack API base URL must be an http(s) URL."));
        }

        if !self.events_path.starts_with('/') {
            return Err(anyhow::anyhow!("Events path must start with `/`."));
        }

        Ok(())
    }
}

impl From<ConfigInner> for Config {
    fn from(inner: ConfigInner) -> Self {
        Self { inner: Arc::new(inner) }
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_config(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("history-bot-{}-{name}.toml", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_defaults() {
        let path = write_config("defaults", "");

        let config = Config::load(Some(&path)).unwrap();

        assert_eq!(config.environment, "development");
        assert_eq!(config.slack_api_base_url, "https://slack.com/api");
        assert_eq!(config.events_path, "/slack/events");
        assert!(config.slack_signing_secret.is_none());
        assert!(config.http_timeout_secs.is_none());
        assert!(config.secrets.is_empty());
    }

    #[test]
    fn test_load_file_values() {
        let path = write_config(
            "values",
            r#"
environment = "production"
bind_address = "127.0.0.1:8080"
http_timeout_secs = 10

[secrets]
"slack_app_id-production" = "A123"
"#,
        );

        let config = Config::load(Some(&path)).unwrap();

        assert_eq!(config.environment, "production");
        assert_eq!(config.bind_address, "127.0.0.1:8080");
        assert_eq!(config.http_timeout_secs, Some(10));
        assert_eq!(config.secrets.get("slack_app_id-production").map(String::as_str), Some("A123"));
    }

    #[test]
    fn test_load_rejects_bad_events_path() {
        let path = write_config("bad-path", r#"events_path = "slack/events""#);

        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_base_url() {
        let config = Config::from(ConfigInner {
            environment: "development".to_string(),
            slack_api_base_url: "slack.com/api".to_string(),
            events_path: "/slack/events".to_string(),
            ..Default::default()
        });

        assert!(config.validate().is_err());
    }
}
