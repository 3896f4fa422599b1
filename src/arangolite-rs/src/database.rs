use arangolite_core::error::{ClientError, Result};
use arangolite_core::models::{ServiceOptions, VersionInfo};
use arangolite_core::{
    AuthConfig, Config, FieldValue, Fields, HostId, Request, TransportKind,
};
use base64::Engine;
use bytes::Bytes;
use serde_json::Value;
use std::sync::Arc;

use crate::connection::Connection;
use crate::graph::Graph;
use crate::router::{Endpoint, Router};
use crate::sandboxed::SandboxedTransport;
use crate::transport::{NativeTransport, Transport};

/// Entry point: one database on one or more hosts
#[derive(Clone)]
pub struct Database {
    connection: Connection,
}

impl Database {
    /// Connects using the transport named in the configuration
    pub async fn new(config: Config) -> Result<Self> {
        let transport: Arc<dyn Transport> = match config.transport {
            TransportKind::Native => Arc::new(NativeTransport::new(&config)?),
            TransportKind::Sandboxed => Arc::new(SandboxedTransport::new(&config)?),
        };
        Self::with_transport(config, transport).await
    }

    pub async fn with_transport(config: Config, transport: Arc<dyn Transport>) -> Result<Self> {
        if config.url.is_empty() {
            return Err(ClientError::Config("at least one host url is required".to_string()));
        }

        let router = Arc::new(Router::new(
            transport,
            config.load_balancing_strategy,
            config.max_retries,
        ));
        router.add_hosts(&config.url).await?;

        let mut connection = Connection::new(router, config.database_name.clone());
        connection.set_timeout(config.timeout());
        for (name, value) in &config.headers {
            connection.set_header(name, value.clone());
        }

        let mut db = Self { connection };
        match &config.auth {
            Some(AuthConfig::Basic { username, password }) => {
                db.use_basic_auth(username, password);
            }
            Some(AuthConfig::Bearer { token }) => {
                db.use_bearer_auth(token);
            }
            None => {}
        }

        tracing::info!(
            "Database {} configured with {} host(s), {:?} transport",
            config.database_name,
            config.url.len(),
            config.transport
        );
        Ok(db)
    }

    pub fn name(&self) -> &str {
        self.connection.database_name()
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Switches the database for handles created from now on
    pub fn use_database(&mut self, name: impl Into<String>) -> &mut Self {
        self.connection.set_database_name(name);
        self
    }

    pub fn use_basic_auth(&mut self, username: &str, password: &str) -> &mut Self {
        let raw = format!("{}:{}", username, password);
        let encoded = base64::engine::general_purpose::STANDARD.encode(raw);
        self.connection
            .set_header("authorization", format!("Basic {}", encoded));
        self
    }

    pub fn use_bearer_auth(&mut self, token: &str) -> &mut Self {
        self.connection
            .set_header("authorization", format!("Bearer {}", token));
        self
    }

    pub fn graph(&self, name: impl Into<String>) -> Graph {
        Graph::new(self.connection.clone(), name)
    }

    /// Lists the graph definitions of this database
    pub async fn list_graphs(&self) -> Result<Vec<Value>> {
        let graphs = self
            .connection
            .request(Request::get("/_api/gharial"))
            .await?
            .take_field("graphs")?;
        Ok(serde_json::from_value(graphs)?)
    }

    pub async fn version(&self) -> Result<VersionInfo> {
        let response = self.connection.request(Request::get("/_api/version")).await?;
        Ok(serde_json::from_value(response.into_json())?)
    }

    pub async fn add_hosts<I, S>(&self, urls: I) -> Result<Vec<HostId>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.connection.router().add_hosts(urls).await
    }

    pub async fn hosts(&self) -> Vec<Endpoint> {
        self.connection.router().hosts().await
    }

    pub async fn deactivate_host(&self, id: HostId) -> Result<()> {
        self.connection.router().deactivate_host(id).await
    }

    /// Asks the cluster for its coordinator endpoints and adds the unknown ones
    pub async fn acquire_host_list(&self) -> Result<Vec<HostId>> {
        let endpoints = self
            .connection
            .request(Request::get("/_api/cluster/endpoints"))
            .await?
            .take_field("endpoints")?;

        let urls: Vec<String> = endpoints
            .as_array()
            .map(|list| {
                list.iter()
                    .filter_map(|e| e.get("endpoint").and_then(Value::as_str))
                    .filter_map(|endpoint| {
                        let url = endpoint_to_url(endpoint);
                        if url.is_none() {
                            tracing::warn!("Skipping unsupported cluster endpoint {}", endpoint);
                        }
                        url
                    })
                    .collect()
            })
            .unwrap_or_default();

        let known = self.hosts().await.len();
        let ids = self.add_hosts(&urls).await?;
        let added = self.hosts().await.len() - known;
        tracing::info!(
            "Acquired host list: {} endpoint(s), {} new",
            urls.len(),
            added
        );
        Ok(ids)
    }

    /// Uploads a service bundle and mounts it at `mount`
    pub async fn install_service(
        &self,
        mount: &str,
        source: Bytes,
        configuration: Option<Value>,
        dependencies: Option<Value>,
        options: Option<ServiceOptions>,
    ) -> Result<Value> {
        let form = Fields::new()
            .field("source", source)
            .optional("configuration", configuration.map(FieldValue::Json))
            .optional("dependencies", dependencies.map(FieldValue::Json))
            .encode()
            .await?;

        let request = Request::post("/_api/foxx")
            .with_query(&options.unwrap_or_default())?
            .query_param("mount", mount)
            .headers(form.headers)
            .bytes(form.body);

        let response = self.connection.request(request).await?;
        Ok(response.into_json())
    }

    /// Downloads the bundle of the service mounted at `mount` as raw bytes
    pub async fn download_service(&self, mount: &str) -> Result<Bytes> {
        let request = Request::post("/_api/foxx/download")
            .query_param("mount", mount)
            .expect_binary();
        Ok(self.connection.request(request).await?.into_bytes())
    }
}

/// Maps cluster endpoint notation to an HTTP url, `None` for other schemes
fn endpoint_to_url(endpoint: &str) -> Option<String> {
    if let Some(rest) = endpoint.strip_prefix("tcp://") {
        Some(format!("http://{}", rest))
    } else if let Some(rest) = endpoint.strip_prefix("ssl://") {
        Some(format!("https://{}", rest))
    } else if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        Some(endpoint.to_string())
    } else {
        None
    }
}
