//! `multipart/form-data` encoding for requests that carry file-like payloads
//!
//! Binary values (buffers and byte streams) are written as-is. Strings are
//! written as text, numbers and booleans as their text form, and any other
//! value as JSON text.

use bytes::{BufMut, Bytes, BytesMut};
use futures::stream::{BoxStream, StreamExt};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::Result;

const CRLF: &[u8] = b"\r\n";

pub enum FieldValue {
    Text(String),
    Binary(Bytes),
    Stream(BoxStream<'static, std::io::Result<Bytes>>),
    Json(Value),
}

impl fmt::Debug for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.debug_tuple("Text").field(s).finish(),
            FieldValue::Binary(b) => f.debug_tuple("Binary").field(&b.len()).finish(),
            FieldValue::Stream(_) => f.write_str("Stream(..)"),
            FieldValue::Json(v) => f.debug_tuple("Json").field(v).finish(),
        }
    }
}

impl FieldValue {
    pub fn json<T: Serialize>(value: &T) -> Result<Self> {
        Ok(FieldValue::Json(serde_json::to_value(value)?))
    }

    fn is_binary(&self) -> bool {
        matches!(self, FieldValue::Binary(_) | FieldValue::Stream(_))
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<Bytes> for FieldValue {
    fn from(b: Bytes) -> Self {
        FieldValue::Binary(b)
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(b: Vec<u8>) -> Self {
        FieldValue::Binary(Bytes::from(b))
    }
}

impl From<Value> for FieldValue {
    fn from(v: Value) -> Self {
        FieldValue::Json(v)
    }
}

/// Encoded body plus the headers describing it
#[derive(Debug, Clone)]
pub struct MultipartRequest {
    pub body: Bytes,
    pub headers: BTreeMap<String, String>,
}

impl MultipartRequest {
    pub fn boundary(&self) -> Option<&str> {
        self.headers
            .get("content-type")
            .and_then(|ct| ct.split_once("boundary="))
            .map(|(_, b)| b)
    }
}

/// Ordered field list; `None` values are skipped when encoding
#[derive(Debug, Default)]
pub struct Fields {
    entries: Vec<(String, Option<FieldValue>)>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.entries.push((name.into(), Some(value.into())));
        self
    }

    pub fn optional(mut self, name: impl Into<String>, value: Option<FieldValue>) -> Self {
        self.entries.push((name.into(), value));
        self
    }

    pub fn stream(
        self,
        name: impl Into<String>,
        stream: BoxStream<'static, std::io::Result<Bytes>>,
    ) -> Self {
        self.field(name, FieldValue::Stream(stream))
    }

    pub async fn encode(self) -> Result<MultipartRequest> {
        encode(self.entries).await
    }
}

/// Encodes fields into a `multipart/form-data` body.
///
/// Stream fields are drained in full before the result is produced; any
/// stream error fails the whole encoding.
pub async fn encode<I, K>(fields: I) -> Result<MultipartRequest>
where
    I: IntoIterator<Item = (K, Option<FieldValue>)>,
    K: AsRef<str>,
{
    let boundary = format!("----------------------------{}", uuid::Uuid::new_v4().simple());
    let mut body = BytesMut::new();

    for (name, value) in fields {
        let Some(value) = value else { continue };
        let name = escape_name(name.as_ref());

        body.put_slice(b"--");
        body.put_slice(boundary.as_bytes());
        body.put_slice(CRLF);
        if value.is_binary() {
            body.put_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n",
                    name, name
                )
                .as_bytes(),
            );
        } else {
            body.put_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
            );
        }

        match value {
            FieldValue::Text(s) => body.put_slice(s.as_bytes()),
            FieldValue::Binary(b) => body.put_slice(&b),
            FieldValue::Stream(mut stream) => {
                while let Some(chunk) = stream.next().await {
                    body.put_slice(&chunk?);
                }
            }
            FieldValue::Json(v) => body.put_slice(json_text(&v).as_bytes()),
        }
        body.put_slice(CRLF);
    }

    body.put_slice(b"--");
    body.put_slice(boundary.as_bytes());
    body.put_slice(b"--");
    // trailing line break after the closing boundary
    body.put_slice(CRLF);

    let body = body.freeze();
    let mut headers = BTreeMap::new();
    headers.insert(
        "content-type".to_string(),
        format!("multipart/form-data; boundary={}", boundary),
    );
    headers.insert("content-length".to_string(), body.len().to_string());

    tracing::debug!("Encoded multipart body: {} bytes", body.len());
    Ok(MultipartRequest { body, headers })
}

fn json_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

fn escape_name(name: &str) -> String {
    name.replace('"', "%22").replace('\r', "%0D").replace('\n', "%0A")
}
