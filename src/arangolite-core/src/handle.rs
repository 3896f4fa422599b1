use serde_json::Value;

use crate::error::{ClientError, Result};

/// Identifies a stored vertex or edge.
///
/// Accepts the three shapes callers have at hand: a bare `_key`, a full
/// `collection/key` id, or a document object carrying `_id` or `_key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentHandle {
    /// Either a bare key or a composed `collection/key` string
    Str(String),
    /// Identity fields taken from a document object
    Doc {
        id: Option<String>,
        key: Option<String>,
    },
}

impl DocumentHandle {
    pub fn from_document(doc: &Value) -> Self {
        let field = |name: &str| doc.get(name).and_then(Value::as_str).map(str::to_string);
        DocumentHandle::Doc {
            id: field("_id"),
            key: field("_key"),
        }
    }

    /// Resolves to the canonical `collection/key` string for `collection`.
    ///
    /// A composed id naming another collection is rejected rather than
    /// silently addressing the wrong collection.
    pub fn resolve(&self, collection: &str) -> Result<String> {
        match self {
            DocumentHandle::Str(s) => resolve_str(s, collection),
            DocumentHandle::Doc { id: Some(id), .. } if !id.is_empty() => {
                resolve_str(id, collection)
            }
            DocumentHandle::Doc { key: Some(key), .. } => resolve_str(key, collection),
            DocumentHandle::Doc { .. } => Err(ClientError::validation(
                "document handle must carry an _id or _key",
            )),
        }
    }

    /// Id form without collection context: `_id` preferred, otherwise the raw string or key
    pub fn as_id(&self) -> Result<String> {
        match self {
            DocumentHandle::Str(s) if !s.is_empty() => Ok(s.clone()),
            DocumentHandle::Doc { id: Some(id), .. } if !id.is_empty() => Ok(id.clone()),
            DocumentHandle::Doc { key: Some(key), .. } if !key.is_empty() => Ok(key.clone()),
            _ => Err(ClientError::validation("document handle is empty")),
        }
    }
}

fn resolve_str(handle: &str, collection: &str) -> Result<String> {
    match handle.split_once('/') {
        Some((prefix, key)) => {
            if prefix != collection {
                return Err(ClientError::validation(format!(
                    "document handle \"{}\" does not belong to collection \"{}\"",
                    handle, collection
                )));
            }
            if key.is_empty() {
                return Err(ClientError::validation(format!(
                    "document handle \"{}\" has an empty key",
                    handle
                )));
            }
            Ok(handle.to_string())
        }
        None if handle.is_empty() => Err(ClientError::validation("document key is empty")),
        None => Ok(format!("{}/{}", collection, handle)),
    }
}

/// Shorthand for [`DocumentHandle::resolve`]
pub fn resolve(handle: impl Into<DocumentHandle>, collection: &str) -> Result<String> {
    handle.into().resolve(collection)
}

impl From<&str> for DocumentHandle {
    fn from(s: &str) -> Self {
        DocumentHandle::Str(s.to_string())
    }
}

impl From<String> for DocumentHandle {
    fn from(s: String) -> Self {
        DocumentHandle::Str(s)
    }
}

impl From<&String> for DocumentHandle {
    fn from(s: &String) -> Self {
        DocumentHandle::Str(s.clone())
    }
}

impl From<&Value> for DocumentHandle {
    fn from(value: &Value) -> Self {
        match value {
            Value::String(s) => DocumentHandle::Str(s.clone()),
            other => DocumentHandle::from_document(other),
        }
    }
}

impl From<Value> for DocumentHandle {
    fn from(value: Value) -> Self {
        DocumentHandle::from(&value)
    }
}

impl From<&DocumentHandle> for DocumentHandle {
    fn from(handle: &DocumentHandle) -> Self {
        handle.clone()
    }
}
