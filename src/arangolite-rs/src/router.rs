//! Host selection and failover
//!
//! The router owns the endpoint table. Every request is planned against one
//! consistent snapshot of the table, then attempted host by host until one
//! answers or the attempt budget runs out. Only retryable transport errors
//! move on to another host; a protocol error is the server's final word.

use arangolite_core::error::{ClientError, Result};
use arangolite_core::request::DIRTY_READ_HEADER;
use arangolite_core::{HostId, LoadBalancingStrategy, Request, Response};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::transport::{HostTarget, Transport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostHealth {
    Healthy,
    /// The last attempt failed at the transport level
    SuspectedDown,
    /// Removed from selection
    Deactivated,
}

#[derive(Debug, Clone)]
pub struct Endpoint {
    pub target: HostTarget,
    pub health: HostHealth,
    pub last_failure: Option<DateTime<Utc>>,
}

impl Endpoint {
    pub fn id(&self) -> HostId {
        self.target.id
    }
}

pub struct Router {
    transport: Arc<dyn Transport>,
    endpoints: RwLock<Vec<Endpoint>>,
    strategy: LoadBalancingStrategy,
    max_retries: Option<usize>,
    /// Host used by the `None` strategy until it fails
    active: AtomicUsize,
    /// Rotation counter for round robin and dirty reads
    cursor: AtomicUsize,
}

impl Router {
    pub fn new(
        transport: Arc<dyn Transport>,
        strategy: LoadBalancingStrategy,
        max_retries: Option<usize>,
    ) -> Self {
        Self {
            transport,
            endpoints: RwLock::new(Vec::new()),
            strategy,
            max_retries,
            active: AtomicUsize::new(0),
            cursor: AtomicUsize::new(0),
        }
    }

    /// Adds hosts not yet known, returns the ids of all given hosts.
    ///
    /// Nothing is added unless every url parses.
    pub async fn add_hosts<I, S>(&self, urls: I) -> Result<Vec<HostId>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let parsed = urls
            .into_iter()
            .map(|raw| HostTarget::parse(0, raw.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        let mut endpoints = self.endpoints.write().await;
        let mut ids = Vec::with_capacity(parsed.len());

        for mut target in parsed {
            if let Some(existing) = endpoints.iter().find(|e| e.target.url == target.url) {
                ids.push(existing.id());
                continue;
            }
            target.id = endpoints.len();
            info!("Added host #{}: {}", target.id, target.url);
            ids.push(target.id);
            endpoints.push(Endpoint {
                target,
                health: HostHealth::Healthy,
                last_failure: None,
            });
        }
        Ok(ids)
    }

    /// Snapshot of the endpoint table
    pub async fn hosts(&self) -> Vec<Endpoint> {
        self.endpoints.read().await.clone()
    }

    pub async fn deactivate_host(&self, id: HostId) -> Result<()> {
        let mut endpoints = self.endpoints.write().await;
        let endpoint = endpoints
            .iter_mut()
            .find(|e| e.id() == id)
            .ok_or_else(|| ClientError::validation(format!("unknown host #{}", id)))?;
        endpoint.health = HostHealth::Deactivated;
        info!("Deactivated host #{}: {}", id, endpoint.target.url);
        Ok(())
    }

    pub async fn route(&self, mut request: Request) -> Result<Response> {
        if request.allow_dirty_read {
            request
                .headers
                .entry(DIRTY_READ_HEADER.to_string())
                .or_insert_with(|| "true".to_string());
        }

        if let Some(pinned) = request.host {
            let target = {
                let endpoints = self.endpoints.read().await;
                match endpoints.iter().find(|e| e.id() == pinned) {
                    Some(e) if e.health != HostHealth::Deactivated => e.target.clone(),
                    Some(_) => {
                        return Err(ClientError::validation(format!(
                            "host #{} is deactivated",
                            pinned
                        )))
                    }
                    None => {
                        return Err(ClientError::validation(format!("unknown host #{}", pinned)))
                    }
                }
            };
            return self.attempt(&target, request).await;
        }

        let plan = {
            let endpoints = self.endpoints.read().await;
            self.plan(&endpoints, request.allow_dirty_read)
        };
        if plan.is_empty() {
            return Err(ClientError::Config("no usable hosts configured".to_string()));
        }

        let budget = match self.max_retries {
            Some(retries) => plan.len().min(retries.saturating_add(1)),
            None => plan.len(),
        };

        let mut last_error = None;
        for target in plan.into_iter().take(budget) {
            match self.attempt(&target, request.clone()).await {
                Ok(response) => {
                    if self.sticky(&request) {
                        self.active.store(target.id, Ordering::Relaxed);
                    }
                    return Ok(response);
                }
                Err(err) if err.is_retryable() => {
                    warn!(
                        "Host #{} failed for {}: {}, trying next host",
                        target.id,
                        request.summary(),
                        err
                    );
                    last_error = Some(err);
                }
                Err(err) => return Err(err),
            }
        }

        Err(last_error
            .unwrap_or_else(|| ClientError::Config("no usable hosts configured".to_string())))
    }

    fn sticky(&self, request: &Request) -> bool {
        self.strategy == LoadBalancingStrategy::None && !request.allow_dirty_read
    }

    /// Orders the selectable hosts for one request: healthy hosts first,
    /// each group rotated to start at the preferred host.
    fn plan(&self, endpoints: &[Endpoint], dirty_read: bool) -> Vec<HostTarget> {
        let candidates: Vec<&Endpoint> = endpoints
            .iter()
            .filter(|e| e.health != HostHealth::Deactivated)
            .collect();
        if candidates.is_empty() {
            return Vec::new();
        }

        let start = if dirty_read || self.strategy == LoadBalancingStrategy::RoundRobin {
            self.cursor.fetch_add(1, Ordering::Relaxed) % candidates.len()
        } else {
            let active = self.active.load(Ordering::Relaxed);
            candidates
                .iter()
                .position(|e| e.id() == active)
                .unwrap_or(0)
        };

        let rotated = candidates[start..].iter().chain(candidates[..start].iter());
        let (healthy, suspected): (Vec<&&Endpoint>, Vec<&&Endpoint>) =
            rotated.partition(|e| e.health == HostHealth::Healthy);

        healthy
            .into_iter()
            .chain(suspected)
            .map(|e| e.target.clone())
            .collect()
    }

    async fn attempt(&self, target: &HostTarget, request: Request) -> Result<Response> {
        debug!("{} -> host #{} ({})", request.summary(), target.id, target.url);

        let outcome = self.transport.send(request, target).await;
        let failed = matches!(&outcome, Err(err) if err.is_retryable());
        self.record(target.id, failed).await;

        match outcome {
            Ok(mut response) => {
                response.host = Some(target.id);
                Ok(response)
            }
            Err(ClientError::Transport(mut err)) => {
                err.host = Some(target.id);
                Err(ClientError::Transport(err))
            }
            Err(ClientError::Protocol(mut err)) => {
                err.host = Some(target.id);
                Err(ClientError::Protocol(err))
            }
            Err(err) => Err(err),
        }
    }

    /// Last write wins: only the latest attempt decides a host's health
    async fn record(&self, id: HostId, failed: bool) {
        let mut endpoints = self.endpoints.write().await;
        if let Some(endpoint) = endpoints.iter_mut().find(|e| e.id() == id) {
            if endpoint.health == HostHealth::Deactivated {
                return;
            }
            if failed {
                endpoint.health = HostHealth::SuspectedDown;
                endpoint.last_failure = Some(Utc::now());
            } else {
                endpoint.health = HostHealth::Healthy;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{json_ok, MockTransport, Reply};
    use arangolite_core::TransportErrorKind;
    use serde_json::json;

    async fn router_with(
        transport: Arc<MockTransport>,
        hosts: usize,
        strategy: LoadBalancingStrategy,
    ) -> Router {
        let router = Router::new(transport, strategy, None);
        let urls: Vec<String> = (0..hosts).map(|i| format!("http://db{}:8529", i)).collect();
        router.add_hosts(urls).await.unwrap();
        router
    }

    #[tokio::test]
    async fn test_failover_to_first_working_host() {
        // hosts 0 and 1 are unreachable, host 2 answers
        let transport = Arc::new(MockTransport::new(|_, target| {
            if target.id < 2 {
                Reply::Fail(TransportErrorKind::Connect)
            } else {
                json_ok(json!({ "version": "3.11.0" }))
            }
        }));
        let router = router_with(transport.clone(), 4, LoadBalancingStrategy::None).await;

        let res = router.route(Request::get("/_api/version")).await.unwrap();
        assert_eq!(res.host, Some(2));
        assert_eq!(transport.hosts_tried(), vec![0, 1, 2]);

        let hosts = router.hosts().await;
        assert_eq!(hosts[0].health, HostHealth::SuspectedDown);
        assert_eq!(hosts[1].health, HostHealth::SuspectedDown);
        assert_eq!(hosts[2].health, HostHealth::Healthy);
        assert!(hosts[0].last_failure.is_some());
    }

    #[tokio::test]
    async fn test_all_hosts_failing_surfaces_last_transport_error() {
        let transport = Arc::new(MockTransport::new(|_, _| {
            Reply::Fail(TransportErrorKind::Connect)
        }));
        let router = router_with(transport.clone(), 3, LoadBalancingStrategy::None).await;

        let err = router.route(Request::get("/_api/version")).await.unwrap_err();
        match err {
            ClientError::Transport(e) => assert_eq!(e.host, Some(2)),
            other => panic!("expected transport error, got {:?}", other),
        }
        assert_eq!(transport.hosts_tried(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_protocol_error_is_never_retried() {
        let transport = Arc::new(MockTransport::new(|_, _| Reply::Json(
            404,
            json!({ "error": true, "errorNum": 1924, "code": 404 }),
        )));
        let router = router_with(transport.clone(), 3, LoadBalancingStrategy::None).await;

        let err = router
            .route(Request::get("/_api/gharial/missing"))
            .await
            .unwrap_err();
        assert_eq!(err.error_num(), Some(1924));
        assert_eq!(transport.hosts_tried(), vec![0]);
        assert_eq!(router.hosts().await[0].health, HostHealth::Healthy);
    }

    #[tokio::test]
    async fn test_sticks_to_host_after_failover() {
        let transport = Arc::new(MockTransport::new(|_, target| {
            if target.id == 0 {
                Reply::Fail(TransportErrorKind::Connect)
            } else {
                json_ok(json!({}))
            }
        }));
        let router = router_with(transport.clone(), 3, LoadBalancingStrategy::None).await;

        router.route(Request::get("/_api/version")).await.unwrap();
        router.route(Request::get("/_api/version")).await.unwrap();
        assert_eq!(transport.hosts_tried(), vec![0, 1, 1]);
    }

    #[tokio::test]
    async fn test_round_robin_rotates_hosts() {
        let transport = Arc::new(MockTransport::new(|_, _| json_ok(json!({}))));
        let router = router_with(transport.clone(), 3, LoadBalancingStrategy::RoundRobin).await;

        for _ in 0..4 {
            router.route(Request::get("/_api/version")).await.unwrap();
        }
        assert_eq!(transport.hosts_tried(), vec![0, 1, 2, 0]);
    }

    #[tokio::test]
    async fn test_dirty_reads_rotate_and_send_header() {
        let transport = Arc::new(MockTransport::new(|_, _| json_ok(json!({}))));
        let router = router_with(transport.clone(), 2, LoadBalancingStrategy::None).await;

        for _ in 0..2 {
            router
                .route(Request::get("/_api/gharial/g/vertex/v/a").allow_dirty_read(true))
                .await
                .unwrap();
        }
        assert_eq!(transport.hosts_tried(), vec![0, 1]);
        let requests = transport.requests();
        assert_eq!(requests[0].1.header_value(DIRTY_READ_HEADER), Some("true"));

        router.route(Request::get("/_api/version")).await.unwrap();
        assert_eq!(transport.requests()[2].1.header_value(DIRTY_READ_HEADER), None);
    }

    #[tokio::test]
    async fn test_pinned_request_does_not_fail_over() {
        let transport = Arc::new(MockTransport::new(|_, target| {
            if target.id == 1 {
                Reply::Fail(TransportErrorKind::Timeout)
            } else {
                json_ok(json!({}))
            }
        }));
        let router = router_with(transport.clone(), 3, LoadBalancingStrategy::None).await;

        let err = router
            .route(Request::get("/_api/version").pinned_to(1))
            .await
            .unwrap_err();
        assert!(err.is_transport());
        assert_eq!(transport.hosts_tried(), vec![1]);

        let err = router
            .route(Request::get("/_api/version").pinned_to(9))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
    }

    #[tokio::test]
    async fn test_suspected_hosts_are_tried_last() {
        let transport = Arc::new(MockTransport::new(|_, target| {
            if target.id == 0 {
                Reply::Fail(TransportErrorKind::Connect)
            } else {
                json_ok(json!({}))
            }
        }));
        let router = router_with(transport.clone(), 2, LoadBalancingStrategy::RoundRobin).await;

        // first request fails over from 0 to 1, second starts at 1
        router.route(Request::get("/_api/version")).await.unwrap();
        router.route(Request::get("/_api/version")).await.unwrap();
        // third would start at 0 again, but 0 is suspected down
        router.route(Request::get("/_api/version")).await.unwrap();
        assert_eq!(transport.hosts_tried(), vec![0, 1, 1, 1]);
    }

    #[tokio::test]
    async fn test_deactivated_hosts_are_skipped() {
        let transport = Arc::new(MockTransport::new(|_, _| json_ok(json!({}))));
        let router = router_with(transport.clone(), 2, LoadBalancingStrategy::None).await;

        router.deactivate_host(0).await.unwrap();
        let res = router.route(Request::get("/_api/version")).await.unwrap();
        assert_eq!(res.host, Some(1));

        router.deactivate_host(1).await.unwrap();
        let err = router.route(Request::get("/_api/version")).await.unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[tokio::test]
    async fn test_max_retries_limits_attempts() {
        let transport = Arc::new(MockTransport::new(|_, _| {
            Reply::Fail(TransportErrorKind::Connect)
        }));
        let router = Router::new(transport.clone(), LoadBalancingStrategy::None, Some(1));
        router
            .add_hosts(["http://a:8529", "http://b:8529", "http://c:8529"])
            .await
            .unwrap();

        assert!(router.route(Request::get("/_api/version")).await.is_err());
        assert_eq!(transport.hosts_tried(), vec![0, 1]);
    }

    #[tokio::test]
    async fn test_add_hosts_deduplicates() {
        let transport = Arc::new(MockTransport::new(|_, _| json_ok(json!({}))));
        let router = Router::new(transport, LoadBalancingStrategy::None, None);

        let first = router.add_hosts(["http://a:8529"]).await.unwrap();
        let second = router
            .add_hosts(["http://a:8529/", "http://b:8529"])
            .await
            .unwrap();
        assert_eq!(first, vec![0]);
        assert_eq!(second, vec![0, 1]);
        assert_eq!(router.hosts().await.len(), 2);
    }

    #[tokio::test]
    async fn test_add_hosts_is_all_or_nothing() {
        let transport = Arc::new(MockTransport::new(|_, _| json_ok(json!({}))));
        let router = Router::new(transport, LoadBalancingStrategy::None, None);

        let result = router
            .add_hosts(["http://a:8529", "unix:///tmp/arangodb.sock"])
            .await;
        assert!(matches!(result, Err(ClientError::Config(_))));
        assert!(router.hosts().await.is_empty());

        let ids = router.add_hosts(["http://b:8529"]).await.unwrap();
        assert_eq!(ids, vec![0]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_routes_share_one_health_table() {
        let transport = Arc::new(MockTransport::new(|_, target| {
            if target.id == 0 {
                Reply::Fail(TransportErrorKind::Connect)
            } else {
                json_ok(json!({}))
            }
        }));
        let router =
            Arc::new(router_with(transport.clone(), 3, LoadBalancingStrategy::RoundRobin).await);

        let tasks: Vec<_> = (0..20)
            .map(|_| {
                let router = router.clone();
                tokio::spawn(async move { router.route(Request::get("/_api/version")).await })
            })
            .collect();

        for task in tasks {
            let response = task.await.unwrap().unwrap();
            assert_ne!(response.host, Some(0));
        }

        let hosts = router.hosts().await;
        assert_eq!(hosts[0].health, HostHealth::SuspectedDown);
        assert_eq!(hosts[1].health, HostHealth::Healthy);
        assert_eq!(hosts[2].health, HostHealth::Healthy);
        assert!(transport.hosts_tried().contains(&0));
    }
}
