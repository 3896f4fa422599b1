//! Transport restricted to what a same-origin fetch primitive allows
//!
//! Forbidden request headers are dropped, pool tuning is left to the
//! platform defaults and session credentials go through a cookie store.
//! Each request runs on its own task and reports through a oneshot channel,
//! so exactly one outcome is ever delivered: the response, the error or the
//! timeout, whichever comes first.

use arangolite_core::error::{ClientError, Result};
use arangolite_core::{Config, Request, Response, TransportError, TransportErrorKind};
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::transport::{build_request, execute, HostTarget, Transport};

/// Request headers a fetch-style primitive refuses to let callers set
const FORBIDDEN_HEADERS: &[&str] = &[
    "accept-charset",
    "accept-encoding",
    "access-control-request-headers",
    "access-control-request-method",
    "connection",
    "content-length",
    "cookie",
    "cookie2",
    "date",
    "dnt",
    "expect",
    "host",
    "keep-alive",
    "origin",
    "referer",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "via",
];

pub fn is_forbidden_header(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    FORBIDDEN_HEADERS.contains(&name.as_str())
        || name.starts_with("proxy-")
        || name.starts_with("sec-")
}

/// Aborts the request task once the caller stops waiting for it
struct AbortOnDrop(JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

pub struct SandboxedTransport {
    client: HttpClient,
}

impl SandboxedTransport {
    pub fn new(config: &Config) -> Result<Self> {
        if !config.keep_alive || config.max_idle_per_host != Config::default().max_idle_per_host {
            tracing::debug!("Connection pool options are ignored by the sandboxed transport");
        }
        let client = HttpClient::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for SandboxedTransport {
    async fn send(&self, request: Request, target: &HostTarget) -> Result<Response> {
        // timeouts are enforced here rather than by the HTTP stack
        let timeout = request.timeout;
        let mut unbounded = request.clone();
        unbounded.timeout = None;

        let builder = build_request(&self.client, &unbounded, target, |name| {
            !is_forbidden_header(name)
        })?;

        let (tx, rx) = oneshot::channel();
        let _task = AbortOnDrop(tokio::spawn(async move {
            let outcome = execute(builder, &unbounded).await;
            // the receiver is gone once the caller gave up
            let _ = tx.send(outcome);
        }));

        let delivered = match timeout {
            Some(limit) => match tokio::time::timeout(limit, rx).await {
                Ok(delivered) => delivered,
                Err(_) => {
                    return Err(TransportError::new(
                        TransportErrorKind::Timeout,
                        format!("no response within {:?}", limit),
                    )
                    .with_request(request.summary())
                    .into());
                }
            },
            None => rx.await,
        };

        delivered.unwrap_or_else(|_| {
            Err(TransportError::new(
                TransportErrorKind::Aborted,
                "request was aborted before completing",
            )
            .with_request(request.summary())
            .into())
        })
    }
}
