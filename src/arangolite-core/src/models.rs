use serde::{Deserialize, Serialize};

/// Options for reading a single vertex or edge
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Return `None` instead of failing when the document does not exist
    pub graceful: bool,
    /// Allow the read to be served by a possibly lagging replica
    pub allow_dirty_read: bool,
}

impl ReadOptions {
    pub fn graceful() -> Self {
        Self {
            graceful: true,
            ..Default::default()
        }
    }

    pub fn with_dirty_read(mut self) -> Self {
        self.allow_dirty_read = true;
        self
    }
}

impl From<bool> for ReadOptions {
    fn from(graceful: bool) -> Self {
        Self {
            graceful,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InsertOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait_for_sync: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_new: Option<bool>,
}

/// Options for full (`replace`) and partial (`update`) writes
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait_for_sync: Option<bool>,
    /// On partial update: `false` removes attributes set to null
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_null: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_old: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_new: Option<bool>,
    /// Sent as `If-Match`, never in the query string
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
}

pub type UpdateOptions = ReplaceOptions;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RemoveOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait_for_sync: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_old: Option<bool>,
    /// Sent as `If-Match`, never in the query string
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
}

/// Options structs that can carry an optimistic-concurrency revision
pub trait Revisioned: Default {
    fn take_rev(&mut self) -> Option<String>;
    fn set_rev(&mut self, rev: String);
}

impl Revisioned for ReplaceOptions {
    fn take_rev(&mut self) -> Option<String> {
        self.rev.take()
    }

    fn set_rev(&mut self, rev: String) {
        self.rev = Some(rev);
    }
}

impl Revisioned for RemoveOptions {
    fn take_rev(&mut self) -> Option<String> {
        self.rev.take()
    }

    fn set_rev(&mut self, rev: String) {
        self.rev = Some(rev);
    }
}

/// A write option argument: either a bare revision or a full options struct
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevisionOr<O> {
    Rev(String),
    Options(O),
}

impl<O: Revisioned> RevisionOr<O> {
    /// Splits off the revision so it can only travel as a header.
    ///
    /// An empty revision counts as absent.
    pub fn into_parts(self) -> (Option<String>, O) {
        let mut options = match self {
            RevisionOr::Rev(rev) => {
                let mut options = O::default();
                options.set_rev(rev);
                options
            }
            RevisionOr::Options(options) => options,
        };
        let rev = options.take_rev().filter(|rev| !rev.is_empty());
        (rev, options)
    }
}

impl<O: Default> Default for RevisionOr<O> {
    fn default() -> Self {
        RevisionOr::Options(O::default())
    }
}

impl<O> From<&str> for RevisionOr<O> {
    fn from(rev: &str) -> Self {
        RevisionOr::Rev(rev.to_string())
    }
}

impl<O> From<String> for RevisionOr<O> {
    fn from(rev: String) -> Self {
        RevisionOr::Rev(rev)
    }
}

impl From<ReplaceOptions> for RevisionOr<ReplaceOptions> {
    fn from(options: ReplaceOptions) -> Self {
        RevisionOr::Options(options)
    }
}

impl From<RemoveOptions> for RevisionOr<RemoveOptions> {
    fn from(options: RemoveOptions) -> Self {
        RevisionOr::Options(options)
    }
}

impl From<Option<ReplaceOptions>> for RevisionOr<ReplaceOptions> {
    fn from(options: Option<ReplaceOptions>) -> Self {
        RevisionOr::Options(options.unwrap_or_default())
    }
}

impl From<Option<RemoveOptions>> for RevisionOr<RemoveOptions> {
    fn from(options: Option<RemoveOptions>) -> Self {
        RevisionOr::Options(options.unwrap_or_default())
    }
}

/// Binds an edge collection to the vertex collections it may connect
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EdgeDefinition {
    pub collection: String,
    pub from: Vec<String>,
    pub to: Vec<String>,
}

impl EdgeDefinition {
    pub fn new<F, T>(collection: impl Into<String>, from: F, to: T) -> Self
    where
        F: IntoIterator,
        F::Item: Into<String>,
        T: IntoIterator,
        T::Item: Into<String>,
    {
        Self {
            collection: collection.into(),
            from: from.into_iter().map(Into::into).collect(),
            to: to.into_iter().map(Into::into).collect(),
        }
    }
}

/// Graph properties sent on creation
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GraphProperties {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub edge_definitions: Vec<EdgeDefinition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub orphan_collections: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_smart: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GraphCreateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait_for_sync: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ListVertexCollectionOptions {
    /// Leave out vertex collections no edge definition refers to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_orphans: Option<bool>,
}

/// Options for installing a service bundle
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub development: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub setup: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legacy: Option<bool>,
}

/// Server version information
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VersionInfo {
    pub server: String,
    pub version: String,
    #[serde(default)]
    pub license: Option<String>,
}
