use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use crate::http::request::Credentials;
use crate::pipeline::{self, StageSpec};

/// Environment variable naming a YAML configuration file.
pub const CONFIG_ENV: &str = "HERALD_CONFIG";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub user_agent: String,
    /// Extra headers sent with every request unless the request sets them
    pub headers: BTreeMap<String, String>,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub retry_count: u32,
    pub redirect_count: u32,
    pub auth: Option<AuthConfig>,
    /// Stage order; `None` means the default chain
    pub middlewares: Option<Vec<StageSpec>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub username: String,
    pub password: String,
}

impl From<AuthConfig> for Credentials {
    fn from(auth: AuthConfig) -> Self {
        Credentials::new(auth.username, auth.password)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_agent: format!("herald/{}", env!("CARGO_PKG_VERSION")),
            headers: BTreeMap::new(),
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
            retry_count: pipeline::DEFAULT_BUDGET,
            redirect_count: pipeline::DEFAULT_BUDGET,
            auth: None,
            middlewares: None,
        }
    }
}

impl Config {
    /// Loads the file named by `HERALD_CONFIG`, or the defaults when the
    /// variable is unset.
    pub fn load() -> anyhow::Result<Self> {
        match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(&path),
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn from_yaml(text: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(text).context("invalid client configuration")?;
        Ok(config)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Stage list for the pipeline. Retry and redirect entries without a
    /// budget inherit `retry_count` and `redirect_count`.
    pub fn stage_specs(&self) -> Vec<StageSpec> {
        let mut specs = self
            .middlewares
            .clone()
            .unwrap_or_else(pipeline::default_stages);

        for spec in &mut specs {
            if spec.budget.is_some() {
                continue;
            }
            spec.budget = match spec.name.as_str() {
                pipeline::RETRY => Some(self.retry_count),
                pipeline::REDIRECT => Some(self.redirect_count),
                _ => None,
            };
        }
        specs
    }
}
