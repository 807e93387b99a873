//! Configuration file support for hookwatch.
//!
//! Configuration is loaded using the `config` crate with the following priority
//! (highest to lowest):
//! 1. Legacy flat variables (`HOOK_GITHUB_TOKEN`, `HOOK_ELASTIC_PASSWORD`)
//! 2. Environment variables (`HOOK_` prefix, `__` between nested keys)
//! 3. `./{name}.{toml,yaml,yml}`
//! 4. `/app/{name}.{toml,yaml,yml}`
//! 5. Default values
//!
//! Example config file (`config.yaml`):
//! ```yaml
//! port: 8080
//! logging:
//!   level: info
//!   format: json
//! elastic:
//!   addresses: ["https://search.internal:9200"]
//!   username: github-hook
//!   index: application-github-webhook
//! github:
//!   public_address: https://hooks.example.com
//!   endpoint: /webhook
//!   poll_interval_secs: 600
//! ```

use std::time::Duration;

use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;

use hookwatch::{DEFAULT_API_URL, SearchSettings, webhook_url};

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub port: u16,
    pub prometheus: PrometheusConfig,
    pub elastic: ElasticConfig,
    pub github: GitHubConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            port: 8080,
            prometheus: PrometheusConfig::default(),
            elastic: ElasticConfig::default(),
            github: GitHubConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of `debug`, `info`, `warn`, `error`.
    pub level: String,
    /// `text` or `json`.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PrometheusConfig {
    pub enabled: bool,
    pub endpoint: String,
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "/metrics".to_string(),
        }
    }
}

/// Search engine connection.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ElasticConfig {
    pub addresses: Vec<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Base64-encoded PEM certificate.
    pub cacert: Option<String>,
    pub index: String,
}

impl Default for ElasticConfig {
    fn default() -> Self {
        Self {
            addresses: vec!["http://localhost:9200".to_string()],
            username: Some("github-hook".to_string()),
            password: None,
            cacert: None,
            index: "application-github-webhook-test".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    pub api_url: String,
    pub token: Option<String>,
    /// Externally reachable base address of this service.
    pub public_address: Option<String>,
    pub endpoint: String,
    /// `0` leaves the page size to the server.
    pub pr_page_size: u32,
    pub webhook_page_size: u32,
    pub poll_interval_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
            public_address: None,
            endpoint: "/webhook".to_string(),
            pr_page_size: 50,
            webhook_page_size: 0,
            poll_interval_secs: 600,
            request_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Load configuration from files and environment.
    ///
    /// Missing files are skipped. The caller falls back to defaults when the
    /// sources cannot be merged or deserialized.
    pub fn load(name: &str) -> Result<Self, ConfigError> {
        Self::build(name)?.try_deserialize().map(Self::validated)
    }

    /// Replace zero durations with their defaults.
    fn validated(mut self) -> Self {
        let defaults = GitHubConfig::default();
        if self.github.poll_interval_secs == 0 {
            tracing::warn!(
                default = defaults.poll_interval_secs,
                "github.poll_interval_secs must be positive, using default"
            );
            self.github.poll_interval_secs = defaults.poll_interval_secs;
        }
        if self.github.request_timeout_secs == 0 {
            tracing::warn!(
                default = defaults.request_timeout_secs,
                "github.request_timeout_secs must be positive, using default"
            );
            self.github.request_timeout_secs = defaults.request_timeout_secs;
        }
        self
    }

    fn build(name: &str) -> Result<ConfigBuilder, ConfigError> {
        ConfigBuilder::builder()
            .add_source(File::with_name(&format!("/app/{name}")).required(false))
            .add_source(File::with_name(name).required(false))
            .add_source(environment())
            .set_override_option("github.token", std::env::var("HOOK_GITHUB_TOKEN").ok())?
            .set_override_option(
                "elastic.password",
                std::env::var("HOOK_ELASTIC_PASSWORD").ok(),
            )?
            .build()
    }

    /// Absolute URL the repositories' webhooks should point at.
    pub fn webhook_target(&self) -> Option<String> {
        let public_address = self.github.public_address.as_deref()?;
        webhook_url(public_address, &self.github.endpoint)
    }

    pub fn search_settings(&self) -> SearchSettings {
        SearchSettings {
            addresses: self.elastic.addresses.clone(),
            username: self.elastic.username.clone().filter(|u| !u.is_empty()),
            password: self.elastic.password.clone(),
            ca_cert: self.elastic.cacert.clone().filter(|c| !c.trim().is_empty()),
            index: self.elastic.index.clone(),
            timeout: self.request_timeout(),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.github.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.github.request_timeout_secs)
    }

    /// Prometheus route, or `None` when disabled.
    pub fn metrics_path(&self) -> Option<String> {
        if !self.prometheus.enabled {
            return None;
        }
        let endpoint = self.prometheus.endpoint.trim();
        if endpoint.starts_with('/') {
            Some(endpoint.to_string())
        } else {
            Some(format!("/{endpoint}"))
        }
    }
}

fn environment() -> Environment {
    Environment::with_prefix("HOOK")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("elastic.addresses")
}
