//! Arangolite Core Library
//!
//! Shared building blocks for the arangolite client:
//! - Request and response descriptors
//! - Error classification (transport, protocol, validation)
//! - Document handle resolution
//! - Graph and write option models
//! - Multipart form encoding
//! - Configuration and tracing setup

pub mod config;
pub mod error;
pub mod handle;
pub mod models;
pub mod multipart;
pub mod request;
pub mod telemetry;

// Re-export commonly used types
pub use config::{AuthConfig, Config, LoadBalancingStrategy, TransportKind};
pub use error::{ArangoError, ClientError, Result, TransportError, TransportErrorKind};
pub use handle::DocumentHandle;
pub use models::*;
pub use multipart::{FieldValue, Fields, MultipartRequest};
pub use request::{Body, HostId, Method, Request, RequestSummary, Response, ResponseBody};
