//! Scripted transport for unit tests

use arangolite_core::error::Result;
use arangolite_core::{HostId, Request, Response, TransportError, TransportErrorKind};
use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::transport::{classify, HostTarget, Transport};

pub(crate) enum Reply {
    Json(u16, Value),
    Binary(u16, Bytes),
    Fail(TransportErrorKind),
}

pub(crate) fn json_ok(body: Value) -> Reply {
    Reply::Json(200, body)
}

pub(crate) fn arango_error(code: u16, error_num: i64) -> Reply {
    Reply::Json(
        code,
        serde_json::json!({
            "error": true,
            "errorNum": error_num,
            "code": code,
            "errorMessage": "simulated server error"
        }),
    )
}

type Responder = Box<dyn Fn(&Request, &HostTarget) -> Reply + Send + Sync>;

/// Records every request and answers through the real classification path
pub(crate) struct MockTransport {
    responder: Responder,
    seen: Mutex<Vec<(HostId, Request)>>,
}

impl MockTransport {
    pub(crate) fn new(
        responder: impl Fn(&Request, &HostTarget) -> Reply + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn requests(&self) -> Vec<(HostId, Request)> {
        self.seen.lock().unwrap().clone()
    }

    pub(crate) fn hosts_tried(&self) -> Vec<HostId> {
        self.requests().into_iter().map(|(host, _)| host).collect()
    }

    pub(crate) fn last_request(&self) -> Request {
        self.requests()
            .pop()
            .map(|(_, request)| request)
            .expect("no request was sent")
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: Request, target: &HostTarget) -> Result<Response> {
        self.seen
            .lock()
            .unwrap()
            .push((target.id, request.clone()));

        match (self.responder)(&request, target) {
            Reply::Json(status, body) => classify(
                status,
                BTreeMap::new(),
                Bytes::from(body.to_string()),
                &request,
            ),
            Reply::Binary(status, body) => classify(status, BTreeMap::new(), body, &request),
            Reply::Fail(kind) => Err(TransportError::new(kind, "simulated failure")
                .with_request(request.summary())
                .into()),
        }
    }
}
