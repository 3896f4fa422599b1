//! Arangolite Client Library
//!
//! HTTP client for the graph API of multi-model database servers, with
//! multi-host failover.

mod connection;
mod database;
mod graph;
mod router;
mod sandboxed;
mod transport;

#[cfg(test)]
mod testing;

pub use arangolite_core::handle::DocumentHandle;
pub use arangolite_core::models::*;
pub use arangolite_core::{multipart, telemetry};
pub use arangolite_core::{
    ArangoError, AuthConfig, Body, ClientError, Config, HostId, LoadBalancingStrategy, Method,
    Request, Response, ResponseBody, Result, TransportError, TransportErrorKind, TransportKind,
};
pub use connection::Connection;
pub use database::Database;
pub use graph::{Graph, GraphEdgeCollection, GraphVertexCollection};
pub use router::{Endpoint, HostHealth, Router};
pub use sandboxed::SandboxedTransport;
pub use transport::{classify, Credentials, HostTarget, NativeTransport, Transport};
