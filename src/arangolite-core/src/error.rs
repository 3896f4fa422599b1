use bytes::Bytes;
use serde_json::Value;
use std::fmt;

use crate::request::{HostId, RequestSummary};

/// errorNum returned when a document does not exist
pub const DOCUMENT_NOT_FOUND: i64 = 1202;
/// errorNum returned when a named graph does not exist
pub const GRAPH_NOT_FOUND: i64 = 1924;
/// errorNum returned when an `If-Match` precondition fails
pub const CONFLICT: i64 = 1200;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ArangoError),

    #[error("Invalid argument: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unexpected response from server: missing `{0}` field")]
    UnexpectedResponse(String),

    #[error("Multipart encoding failed: {0}")]
    Encoding(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;

impl ClientError {
    pub fn validation(message: impl Into<String>) -> Self {
        ClientError::Validation(message.into())
    }

    /// The request never reached the server or no usable answer came back
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }

    /// The server answered with a structured error body
    pub fn is_protocol(&self) -> bool {
        matches!(self, ClientError::Protocol(_))
    }

    /// Numeric server error code, if this is a protocol error
    pub fn error_num(&self) -> Option<i64> {
        match self {
            ClientError::Protocol(err) => Some(err.error_num),
            _ => None,
        }
    }

    /// Whether the router may try this request against another host
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Transport(err) => err.kind.is_retryable(),
            _ => false,
        }
    }

    pub(crate) fn has_error_num(&self, error_num: i64) -> bool {
        self.error_num() == Some(error_num)
    }

    pub fn is_not_found(&self) -> bool {
        self.has_error_num(DOCUMENT_NOT_FOUND)
    }

    pub fn is_graph_not_found(&self) -> bool {
        self.has_error_num(GRAPH_NOT_FOUND)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// DNS failure, connection refused or reset
    Connect,
    Timeout,
    /// The request was cancelled before a response arrived
    Aborted,
    /// Any other failure of the underlying HTTP stack
    Network,
    /// Error status on a binary (non-JSON) response
    Status,
    /// Response body could not be parsed
    InvalidBody,
}

impl TransportErrorKind {
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            TransportErrorKind::Connect
                | TransportErrorKind::Timeout
                | TransportErrorKind::Aborted
                | TransportErrorKind::Network
        )
    }

    fn as_str(self) -> &'static str {
        match self {
            TransportErrorKind::Connect => "connect",
            TransportErrorKind::Timeout => "timeout",
            TransportErrorKind::Aborted => "aborted",
            TransportErrorKind::Network => "network",
            TransportErrorKind::Status => "status",
            TransportErrorKind::InvalidBody => "invalid body",
        }
    }
}

/// Failure below the protocol level: no interpretable response came back
#[derive(Debug)]
pub struct TransportError {
    pub kind: TransportErrorKind,
    /// Host the attempt was made against, filled in by the router
    pub host: Option<HostId>,
    pub status: Option<u16>,
    pub message: String,
    /// Raw response body for status errors on binary responses
    pub body: Option<Bytes>,
    pub request: Option<RequestSummary>,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            host: None,
            status: None,
            message: message.into(),
            body: None,
            request: None,
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn with_status(mut self, status: u16, body: Bytes) -> Self {
        self.status = Some(status);
        self.body = Some(body);
        self
    }

    pub fn with_request(mut self, request: RequestSummary) -> Self {
        self.request = Some(request);
        self
    }

    pub fn on_host(mut self, host: HostId) -> Self {
        self.host = Some(host);
        self
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Transport error ({})", self.kind.as_str())?;
        if let Some(host) = self.host {
            write!(f, " on host #{}", host)?;
        }
        if let Some(request) = &self.request {
            write!(f, " for {}", request)?;
        }
        if let Some(status) = self.status {
            write!(f, " [HTTP {}]", status)?;
        }
        write!(f, ": {}", self.message)
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Structured error body returned by the server
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message} (errorNum {error_num}, HTTP {code}) for {request}")]
pub struct ArangoError {
    pub error_num: i64,
    pub code: u16,
    pub message: String,
    /// Parsed error body as sent by the server
    pub body: Value,
    pub request: RequestSummary,
    pub host: Option<HostId>,
}

impl ArangoError {
    /// Builds a protocol error from a parsed body carrying a truthy `error` marker.
    /// Falls back to the HTTP status when the body has no `code`.
    pub fn from_body(body: Value, status: u16, request: RequestSummary) -> Self {
        let error_num = body.get("errorNum").and_then(Value::as_i64).unwrap_or(0);
        let code = body
            .get("code")
            .and_then(Value::as_u64)
            .and_then(|c| u16::try_from(c).ok())
            .unwrap_or(status);
        let message = body
            .get("errorMessage")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {}", status));

        Self {
            error_num,
            code,
            message,
            body,
            request,
            host: None,
        }
    }
}

/// True when a parsed response body carries the server's error marker
pub fn is_error_body(body: &Value) -> bool {
    match body.get("error") {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Null) | None => false,
        Some(_) => true,
    }
}
