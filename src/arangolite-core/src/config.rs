use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// One or more server endpoints, e.g. `http://localhost:8529`
    #[serde(default = "default_url")]
    pub url: Vec<String>,
    #[serde(default = "default_database_name")]
    pub database_name: String,
    #[serde(default)]
    pub auth: Option<AuthConfig>,

    // Host routing
    #[serde(default)]
    pub load_balancing_strategy: LoadBalancingStrategy,
    /// Extra attempts after the first one; `None` means one attempt per known host
    #[serde(default)]
    pub max_retries: Option<usize>,

    // Transport configuration
    #[serde(default)]
    pub transport: TransportKind,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default = "default_keep_alive")]
    pub keep_alive: bool,
    #[serde(default = "default_max_idle_per_host")]
    pub max_idle_per_host: usize,
    #[serde(default)]
    pub insecure_skip_verify: bool,

    /// Sent with every request unless the request sets the same header
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AuthConfig {
    Basic { username: String, password: String },
    Bearer { token: String },
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LoadBalancingStrategy {
    /// Stay on one host until it fails, then move to the next
    #[default]
    None,
    RoundRobin,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// Full control over headers, pooling and credentials
    #[default]
    Native,
    /// Restricted to what a same-origin fetch primitive allows
    Sandboxed,
}

fn default_url() -> Vec<String> {
    vec!["http://localhost:8529".to_string()]
}

fn default_database_name() -> String {
    "_system".to_string()
}

fn default_keep_alive() -> bool {
    true
}

fn default_max_idle_per_host() -> usize {
    32
}

impl Config {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Reads `ARANGO_URL` (comma separated), `ARANGO_DATABASE`,
    /// `ARANGO_USERNAME` and `ARANGO_PASSWORD`, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Config::default();

        if let Ok(urls) = std::env::var("ARANGO_URL") {
            let urls: Vec<String> = urls
                .split(',')
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .map(str::to_string)
                .collect();
            if !urls.is_empty() {
                config.url = urls;
            }
        }
        if let Ok(name) = std::env::var("ARANGO_DATABASE") {
            config.database_name = name;
        }
        if let Ok(username) = std::env::var("ARANGO_USERNAME") {
            config.auth = Some(AuthConfig::Basic {
                username,
                password: std::env::var("ARANGO_PASSWORD").unwrap_or_default(),
            });
        }

        tracing::debug!(
            "Configuration from environment: hosts={:?}, database={}",
            config.url,
            config.database_name
        );
        config
    }

    pub fn with_urls<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.url = urls.into_iter().map(Into::into).collect();
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: default_url(),
            database_name: default_database_name(),
            auth: None,
            load_balancing_strategy: LoadBalancingStrategy::default(),
            max_retries: None,
            transport: TransportKind::default(),
            timeout_ms: None,
            keep_alive: default_keep_alive(),
            max_idle_per_host: default_max_idle_per_host(),
            insecure_skip_verify: false,
            headers: BTreeMap::new(),
        }
    }
}
