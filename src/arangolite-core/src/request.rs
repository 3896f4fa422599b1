//! Request and response descriptors
//!
//! A [`Request`] describes one logical call independently of the host it
//! ends up on. The router clones it per attempt and hands it to a transport,
//! which answers with a normalized [`Response`].

use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use crate::error::{ClientError, Result};

/// Index of an endpoint in the router's host list
pub type HostId = usize;

/// Header carrying the caller's acceptance of stale reads
pub const DIRTY_READ_HEADER: &str = "x-arango-allow-dirty-read";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default)]
pub enum Body {
    #[default]
    Empty,
    Json(Value),
    /// Pre-encoded payload, content type set through the headers
    Bytes(Bytes),
}

/// Method and path of a request, kept on errors for diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSummary {
    pub method: Method,
    pub path: String,
}

impl fmt::Display for RequestSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    /// Header names are stored lowercase
    pub headers: BTreeMap<String, String>,
    pub body: Body,
    pub expect_binary: bool,
    pub allow_dirty_read: bool,
    /// Pins the request to one host, no failover
    pub host: Option<HostId>,
    pub timeout: Option<Duration>,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: BTreeMap::new(),
            body: Body::Empty,
            expect_binary: false,
            allow_dirty_read: false,
            host: None,
            timeout: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Appends every set field of an options struct as a query parameter
    pub fn with_query<T: Serialize>(mut self, options: &T) -> Result<Self> {
        self.query.extend(query_pairs(options)?);
        Ok(self)
    }

    pub fn query_param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (name, value) in headers {
            self = self.header(name, value);
        }
        self
    }

    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self> {
        self.body = Body::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn json_value(mut self, body: Value) -> Self {
        self.body = Body::Json(body);
        self
    }

    pub fn bytes(mut self, body: Bytes) -> Self {
        self.body = Body::Bytes(body);
        self
    }

    pub fn expect_binary(mut self) -> Self {
        self.expect_binary = true;
        self
    }

    pub fn allow_dirty_read(mut self, allow: bool) -> Self {
        self.allow_dirty_read = allow;
        self
    }

    pub fn pinned_to(mut self, host: HostId) -> Self {
        self.host = Some(host);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn summary(&self) -> RequestSummary {
        RequestSummary {
            method: self.method,
            path: self.path.clone(),
        }
    }
}

/// Flattens an options struct into query pairs.
///
/// `null` fields are skipped, scalars use their plain text form and nested
/// values are sent as JSON text.
pub fn query_pairs<T: Serialize>(options: &T) -> Result<Vec<(String, String)>> {
    match serde_json::to_value(options)? {
        Value::Null => Ok(Vec::new()),
        Value::Object(map) => Ok(map
            .into_iter()
            .filter_map(|(key, value)| match value {
                Value::Null => None,
                Value::String(s) => Some((key, s)),
                Value::Bool(b) => Some((key, b.to_string())),
                Value::Number(n) => Some((key, n.to_string())),
                other => Some((key, other.to_string())),
            })
            .collect()),
        other => Err(ClientError::validation(format!(
            "query options must be an object, got {}",
            other
        ))),
    }
}

#[derive(Debug, Clone)]
pub enum ResponseBody {
    Empty,
    Json(Value),
    Binary(Bytes),
}

#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    /// Header names are stored lowercase
    pub headers: BTreeMap<String, String>,
    pub body: ResponseBody,
    /// Host that served the response, filled in by the router
    pub host: Option<HostId>,
}

impl Response {
    pub fn json(&self) -> Option<&Value> {
        match &self.body {
            ResponseBody::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Takes one named field out of a JSON object body
    pub fn take_field(self, field: &str) -> Result<Value> {
        match self.body {
            ResponseBody::Json(Value::Object(mut map)) => map
                .remove(field)
                .ok_or_else(|| ClientError::UnexpectedResponse(field.to_string())),
            _ => Err(ClientError::UnexpectedResponse(field.to_string())),
        }
    }

    pub fn into_json(self) -> Value {
        match self.body {
            ResponseBody::Json(value) => value,
            _ => Value::Null,
        }
    }

    pub fn into_bytes(self) -> Bytes {
        match self.body {
            ResponseBody::Binary(bytes) => bytes,
            ResponseBody::Json(value) => Bytes::from(value.to_string()),
            ResponseBody::Empty => Bytes::new(),
        }
    }
}
