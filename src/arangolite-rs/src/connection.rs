use arangolite_core::error::Result;
use arangolite_core::{Request, Response};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::router::Router;

/// Per-database view over a shared router.
///
/// Cloning is cheap; graph and collection handles each keep their own copy,
/// so switching database or credentials only affects handles created later.
#[derive(Clone)]
pub struct Connection {
    router: Arc<Router>,
    database_name: String,
    headers: BTreeMap<String, String>,
    timeout: Option<Duration>,
}

impl Connection {
    pub fn new(router: Arc<Router>, database_name: impl Into<String>) -> Self {
        Self {
            router,
            database_name: database_name.into(),
            headers: BTreeMap::new(),
            timeout: None,
        }
    }

    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    pub fn set_database_name(&mut self, name: impl Into<String>) {
        self.database_name = name.into();
    }

    /// Default header, overridden by the same header on a request
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
    }

    pub fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout = timeout;
    }

    /// Sends a request scoped to this connection's database
    pub async fn request(&self, request: Request) -> Result<Response> {
        let request = self.prepare(request);
        tracing::debug!("Dispatching {}", request.summary());
        self.router.route(request).await
    }

    fn prepare(&self, mut request: Request) -> Request {
        request.path = format!(
            "/_db/{}/{}",
            self.database_name,
            request.path.trim_start_matches('/')
        );
        for (name, value) in &self.headers {
            request
                .headers
                .entry(name.clone())
                .or_insert_with(|| value.clone());
        }
        if request.timeout.is_none() {
            request.timeout = self.timeout;
        }
        request
    }
}
