//! Named graphs over the gharial API
//!
//! Handles hold no server state: every read goes to the server, and
//! collection handles are plain views built on demand.

use arangolite_core::error::{ClientError, Result};
use arangolite_core::handle::DocumentHandle;
use arangolite_core::models::{
    EdgeDefinition, GraphCreateOptions, InsertOptions, ListVertexCollectionOptions, ReadOptions,
    RemoveOptions, ReplaceOptions, RevisionOr, UpdateOptions,
};
use arangolite_core::Request;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::connection::Connection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CollectionKind {
    Vertex,
    Edge,
}

impl CollectionKind {
    /// Path segment and response field share the same name
    fn as_str(self) -> &'static str {
        match self {
            CollectionKind::Vertex => "vertex",
            CollectionKind::Edge => "edge",
        }
    }
}

/// Operations shared by vertex and edge collections of a graph
#[derive(Clone)]
struct GraphCollection {
    connection: Connection,
    graph: String,
    name: String,
    kind: CollectionKind,
}

impl GraphCollection {
    fn collection_path(&self) -> String {
        format!("/_api/gharial/{}/{}/{}", self.graph, self.kind.as_str(), self.name)
    }

    fn document_path(&self, handle: &DocumentHandle) -> Result<String> {
        let id = handle.resolve(&self.name)?;
        Ok(format!("/_api/gharial/{}/{}/{}", self.graph, self.kind.as_str(), id))
    }

    async fn document(
        &self,
        handle: DocumentHandle,
        options: ReadOptions,
    ) -> Result<Option<Value>> {
        let request = Request::get(self.document_path(&handle)?)
            .allow_dirty_read(options.allow_dirty_read);

        match self.connection.request(request).await {
            Ok(response) => response.take_field(self.kind.as_str()).map(Some),
            Err(err) if options.graceful && err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn save(&self, data: Value, options: InsertOptions) -> Result<Value> {
        let request = Request::post(self.collection_path())
            .json_value(data)
            .with_query(&options)?;

        self.connection
            .request(request)
            .await?
            .take_field(self.kind.as_str())
    }

    async fn write(
        &self,
        request: Request,
        data: Value,
        options: RevisionOr<ReplaceOptions>,
    ) -> Result<Value> {
        let (rev, options) = options.into_parts();
        let request = conditional(request.json_value(data).with_query(&options)?, rev);

        self.connection
            .request(request)
            .await?
            .take_field(self.kind.as_str())
    }

    async fn replace(
        &self,
        handle: DocumentHandle,
        data: Value,
        options: RevisionOr<ReplaceOptions>,
    ) -> Result<Value> {
        let request = Request::put(self.document_path(&handle)?);
        self.write(request, data, options).await
    }

    async fn update(
        &self,
        handle: DocumentHandle,
        data: Value,
        options: RevisionOr<UpdateOptions>,
    ) -> Result<Value> {
        let request = Request::patch(self.document_path(&handle)?);
        self.write(request, data, options).await
    }

    async fn remove(
        &self,
        handle: DocumentHandle,
        options: RevisionOr<RemoveOptions>,
    ) -> Result<bool> {
        let path = self.document_path(&handle)?;
        let (rev, options) = options.into_parts();
        let request = conditional(Request::delete(path).with_query(&options)?, rev);

        let removed = self.connection.request(request).await?.take_field("removed")?;
        Ok(removed.as_bool().unwrap_or(false))
    }
}

/// Optimistic-concurrency precondition travels only as `If-Match`
fn conditional(request: Request, rev: Option<String>) -> Request {
    match rev {
        Some(rev) => request.header("if-match", rev),
        None => request,
    }
}

/// Copies resolved endpoints into each edge, replacing inline `_from`/`_to`
fn merge_endpoints(data: Value, from: &str, to: &str) -> Result<Value> {
    let stamp = |value: Value| -> Result<Value> {
        match value {
            Value::Object(mut map) => {
                map.insert("_from".to_string(), Value::String(from.to_string()));
                map.insert("_to".to_string(), Value::String(to.to_string()));
                Ok(Value::Object(map))
            }
            other => Err(ClientError::validation(format!(
                "edge data must be an object, got {}",
                other
            ))),
        }
    };

    match data {
        Value::Array(items) => Ok(Value::Array(
            items.into_iter().map(stamp).collect::<Result<Vec<_>>>()?,
        )),
        other => stamp(other),
    }
}

/// Endpoint handles carry no collection context, so they must be full ids
fn endpoint_id(handle: DocumentHandle, role: &str) -> Result<String> {
    let id = handle.as_id()?;
    if !id.contains('/') {
        return Err(ClientError::validation(format!(
            "edge {} handle \"{}\" must be a full document id",
            role, id
        )));
    }
    Ok(id)
}

/// Vertex collection taking part in a graph
#[derive(Clone)]
pub struct GraphVertexCollection {
    inner: GraphCollection,
}

impl GraphVertexCollection {
    pub(crate) fn new(connection: Connection, graph: &str, name: impl Into<String>) -> Self {
        Self {
            inner: GraphCollection {
                connection,
                graph: graph.to_string(),
                name: name.into(),
                kind: CollectionKind::Vertex,
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn graph_name(&self) -> &str {
        &self.inner.graph
    }

    /// Reads one vertex. With `graceful`, a missing vertex yields `None`.
    pub async fn document(
        &self,
        handle: impl Into<DocumentHandle>,
        options: impl Into<ReadOptions>,
    ) -> Result<Option<Value>> {
        self.inner.document(handle.into(), options.into()).await
    }

    pub async fn vertex(
        &self,
        handle: impl Into<DocumentHandle>,
        options: impl Into<ReadOptions>,
    ) -> Result<Option<Value>> {
        self.document(handle, options).await
    }

    /// Creates one vertex, or several when `data` serializes to an array
    pub async fn save<T: Serialize>(
        &self,
        data: &T,
        options: Option<InsertOptions>,
    ) -> Result<Value> {
        let data = serde_json::to_value(data)?;
        self.inner.save(data, options.unwrap_or_default()).await
    }

    pub async fn replace<T: Serialize>(
        &self,
        handle: impl Into<DocumentHandle>,
        data: &T,
        options: impl Into<RevisionOr<ReplaceOptions>>,
    ) -> Result<Value> {
        let handle = handle.into();
        let data = serde_json::to_value(data)?;
        self.inner.replace(handle, data, options.into()).await
    }

    pub async fn update<T: Serialize>(
        &self,
        handle: impl Into<DocumentHandle>,
        data: &T,
        options: impl Into<RevisionOr<UpdateOptions>>,
    ) -> Result<Value> {
        let handle = handle.into();
        let data = serde_json::to_value(data)?;
        self.inner.update(handle, data, options.into()).await
    }

    pub async fn remove(
        &self,
        handle: impl Into<DocumentHandle>,
        options: impl Into<RevisionOr<RemoveOptions>>,
    ) -> Result<bool> {
        self.inner.remove(handle.into(), options.into()).await
    }
}

impl AsRef<str> for GraphVertexCollection {
    fn as_ref(&self) -> &str {
        self.name()
    }
}

/// Edge collection taking part in a graph
#[derive(Clone)]
pub struct GraphEdgeCollection {
    inner: GraphCollection,
}

impl GraphEdgeCollection {
    pub(crate) fn new(connection: Connection, graph: &str, name: impl Into<String>) -> Self {
        Self {
            inner: GraphCollection {
                connection,
                graph: graph.to_string(),
                name: name.into(),
                kind: CollectionKind::Edge,
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn graph_name(&self) -> &str {
        &self.inner.graph
    }

    /// Reads one edge. With `graceful`, a missing edge yields `None`.
    pub async fn document(
        &self,
        handle: impl Into<DocumentHandle>,
        options: impl Into<ReadOptions>,
    ) -> Result<Option<Value>> {
        self.inner.document(handle.into(), options.into()).await
    }

    pub async fn edge(
        &self,
        handle: impl Into<DocumentHandle>,
        options: impl Into<ReadOptions>,
    ) -> Result<Option<Value>> {
        self.document(handle, options).await
    }

    /// Creates edges whose `_from`/`_to` are part of `data`
    pub async fn save<T: Serialize>(
        &self,
        data: &T,
        options: Option<InsertOptions>,
    ) -> Result<Value> {
        let data = serde_json::to_value(data)?;
        self.inner.save(data, options.unwrap_or_default()).await
    }

    /// Creates edges between `from` and `to`.
    ///
    /// The endpoints are written into every element of `data`, replacing
    /// any `_from`/`_to` already present.
    pub async fn save_between<T: Serialize>(
        &self,
        data: &T,
        from: impl Into<DocumentHandle>,
        to: impl Into<DocumentHandle>,
        options: Option<InsertOptions>,
    ) -> Result<Value> {
        let from = endpoint_id(from.into(), "from")?;
        let to = endpoint_id(to.into(), "to")?;
        let data = merge_endpoints(serde_json::to_value(data)?, &from, &to)?;
        self.inner.save(data, options.unwrap_or_default()).await
    }

    pub async fn replace<T: Serialize>(
        &self,
        handle: impl Into<DocumentHandle>,
        data: &T,
        options: impl Into<RevisionOr<ReplaceOptions>>,
    ) -> Result<Value> {
        let handle = handle.into();
        let data = serde_json::to_value(data)?;
        self.inner.replace(handle, data, options.into()).await
    }

    pub async fn update<T: Serialize>(
        &self,
        handle: impl Into<DocumentHandle>,
        data: &T,
        options: impl Into<RevisionOr<UpdateOptions>>,
    ) -> Result<Value> {
        let handle = handle.into();
        let data = serde_json::to_value(data)?;
        self.inner.update(handle, data, options.into()).await
    }

    pub async fn remove(
        &self,
        handle: impl Into<DocumentHandle>,
        options: impl Into<RevisionOr<RemoveOptions>>,
    ) -> Result<bool> {
        self.inner.remove(handle.into(), options.into()).await
    }
}

impl AsRef<str> for GraphEdgeCollection {
    fn as_ref(&self) -> &str {
        self.name()
    }
}

#[derive(Serialize)]
struct DropOptions {
    #[serde(rename = "dropCollections")]
    drop_collections: bool,
}

#[derive(Serialize)]
struct DropCollectionOptions {
    #[serde(rename = "dropCollection")]
    drop_collection: bool,
}

/// A named graph on the server
#[derive(Clone)]
pub struct Graph {
    connection: Connection,
    name: String,
}

impl Graph {
    pub(crate) fn new(connection: Connection, name: impl Into<String>) -> Self {
        Self {
            connection,
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn path(&self, suffix: &str) -> String {
        format!("/_api/gharial/{}{}", self.name, suffix)
    }

    async fn graph_field(&self, request: Request) -> Result<Value> {
        self.connection.request(request).await?.take_field("graph")
    }

    /// Fetches the graph definition
    pub async fn get(&self) -> Result<Value> {
        self.graph_field(Request::get(self.path(""))).await
    }

    /// `false` only when the server reports the graph as not found
    pub async fn exists(&self) -> Result<bool> {
        match self.get().await {
            Ok(_) => Ok(true),
            Err(err) if err.is_graph_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Creates the graph. `properties` usually is a
    /// [`GraphProperties`](arangolite_core::GraphProperties); its `name` is
    /// always this graph's name.
    pub async fn create<P: Serialize>(
        &self,
        properties: &P,
        options: Option<GraphCreateOptions>,
    ) -> Result<Value> {
        let mut body = match serde_json::to_value(properties)? {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(ClientError::validation(format!(
                    "graph properties must be an object, got {}",
                    other
                )))
            }
        };
        body.insert("name".to_string(), Value::String(self.name.clone()));

        let request = Request::post("/_api/gharial")
            .json_value(Value::Object(body))
            .with_query(&options.unwrap_or_default())?;
        self.graph_field(request).await
    }

    pub async fn drop(&self, drop_collections: bool) -> Result<bool> {
        let request = Request::delete(self.path("")).with_query(&DropOptions { drop_collections })?;
        let removed = self.connection.request(request).await?.take_field("removed")?;
        Ok(removed.as_bool().unwrap_or(false))
    }

    pub fn vertex_collection(&self, name: impl Into<String>) -> GraphVertexCollection {
        GraphVertexCollection::new(self.connection.clone(), &self.name, name)
    }

    pub fn edge_collection(&self, name: impl Into<String>) -> GraphEdgeCollection {
        GraphEdgeCollection::new(self.connection.clone(), &self.name, name)
    }

    pub async fn list_vertex_collections(
        &self,
        options: Option<ListVertexCollectionOptions>,
    ) -> Result<Vec<String>> {
        let request = Request::get(self.path("/vertex")).with_query(&options.unwrap_or_default())?;
        let collections = self.connection.request(request).await?.take_field("collections")?;
        Ok(serde_json::from_value(collections)?)
    }

    /// Like [`list_vertex_collections`](Self::list_vertex_collections), as handles
    pub async fn vertex_collections(
        &self,
        options: Option<ListVertexCollectionOptions>,
    ) -> Result<Vec<GraphVertexCollection>> {
        let names = self.list_vertex_collections(options).await?;
        Ok(names
            .into_iter()
            .map(|name| self.vertex_collection(name))
            .collect())
    }

    pub async fn add_vertex_collection(&self, collection: impl AsRef<str>) -> Result<Value> {
        let request = Request::post(self.path("/vertex"))
            .json_value(serde_json::json!({ "collection": collection.as_ref() }));
        self.graph_field(request).await
    }

    pub async fn remove_vertex_collection(
        &self,
        collection: impl AsRef<str>,
        drop_collection: bool,
    ) -> Result<Value> {
        let request = Request::delete(self.path(&format!("/vertex/{}", collection.as_ref())))
            .with_query(&DropCollectionOptions { drop_collection })?;
        self.graph_field(request).await
    }

    pub async fn list_edge_collections(&self) -> Result<Vec<String>> {
        let request = Request::get(self.path("/edge"));
        let collections = self.connection.request(request).await?.take_field("collections")?;
        Ok(serde_json::from_value(collections)?)
    }

    pub async fn edge_collections(&self) -> Result<Vec<GraphEdgeCollection>> {
        let names = self.list_edge_collections().await?;
        Ok(names
            .into_iter()
            .map(|name| self.edge_collection(name))
            .collect())
    }

    pub async fn add_edge_definition(&self, definition: &EdgeDefinition) -> Result<Value> {
        let request = Request::post(self.path("/edge")).json(definition)?;
        self.graph_field(request).await
    }

    pub async fn replace_edge_definition(
        &self,
        definition_name: &str,
        definition: &EdgeDefinition,
    ) -> Result<Value> {
        let request =
            Request::put(self.path(&format!("/edge/{}", definition_name))).json(definition)?;
        self.graph_field(request).await
    }

    pub async fn remove_edge_definition(
        &self,
        definition_name: &str,
        drop_collection: bool,
    ) -> Result<Value> {
        let request = Request::delete(self.path(&format!("/edge/{}", definition_name)))
            .with_query(&DropCollectionOptions { drop_collection })?;
        self.graph_field(request).await
    }

    /// Runs a server-side traversal and returns its `result` verbatim.
    ///
    /// `options` is merged with `startVertex` and `graphName`, which always win.
    pub async fn traversal<O: Serialize>(
        &self,
        start_vertex: impl Into<DocumentHandle>,
        options: &O,
    ) -> Result<Value> {
        let start_vertex = start_vertex.into().as_id()?;
        let mut body = match serde_json::to_value(options)? {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(ClientError::validation(format!(
                    "traversal options must be an object, got {}",
                    other
                )))
            }
        };
        body.insert("startVertex".to_string(), Value::String(start_vertex));
        body.insert("graphName".to_string(), Value::String(self.name.clone()));

        let request = Request::post("/_api/traversal").json_value(Value::Object(body));
        self.connection.request(request).await?.take_field("result")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::Router;
    use crate::testing::{arango_error, json_ok, MockTransport, Reply};
    use arangolite_core::error::{DOCUMENT_NOT_FOUND, GRAPH_NOT_FOUND};
    use arangolite_core::{LoadBalancingStrategy, Method, TransportErrorKind};
    use serde_json::json;
    use std::sync::Arc;

    async fn graph_with(
        responder: impl Fn(&Request, &crate::transport::HostTarget) -> Reply
            + Send
            + Sync
            + 'static,
    ) -> (Graph, Arc<MockTransport>) {
        let transport = Arc::new(MockTransport::new(responder));
        let router = Arc::new(Router::new(
            transport.clone(),
            LoadBalancingStrategy::None,
            None,
        ));
        router.add_hosts(["http://localhost:8529"]).await.unwrap();
        let connection = Connection::new(router, "_system");
        (Graph::new(connection, "social"), transport)
    }

    #[tokio::test]
    async fn test_exists() {
        let (graph, _) = graph_with(|_, _| json_ok(json!({ "graph": { "name": "social" } }))).await;
        assert!(graph.exists().await.unwrap());

        let (graph, _) = graph_with(|_, _| arango_error(404, GRAPH_NOT_FOUND)).await;
        assert!(!graph.exists().await.unwrap());
    }

    #[tokio::test]
    async fn test_exists_propagates_other_failures() {
        let (graph, _) = graph_with(|_, _| Reply::Fail(TransportErrorKind::Connect)).await;
        assert!(graph.exists().await.unwrap_err().is_transport());

        let (graph, _) = graph_with(|_, _| arango_error(403, 11)).await;
        assert_eq!(graph.exists().await.unwrap_err().error_num(), Some(11));
    }

    #[tokio::test]
    async fn test_graceful_read_returns_none_for_missing_document() {
        let (graph, transport) = graph_with(|_, _| arango_error(404, DOCUMENT_NOT_FOUND)).await;
        let persons = graph.vertex_collection("persons");

        assert_eq!(persons.document("alice", true).await.unwrap(), None);
        assert_eq!(
            transport.last_request().path,
            "/_db/_system/_api/gharial/social/vertex/persons/alice"
        );

        let err = persons.document("alice", false).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_graceful_read_propagates_other_failures() {
        let (graph, _) = graph_with(|_, _| Reply::Fail(TransportErrorKind::Connect)).await;
        let err = graph
            .vertex_collection("persons")
            .document("alice", true)
            .await
            .unwrap_err();
        assert!(err.is_transport());

        let (graph, _) = graph_with(|_, _| arango_error(404, GRAPH_NOT_FOUND)).await;
        let err = graph
            .edge_collection("knows")
            .edge("k1", ReadOptions::graceful())
            .await
            .unwrap_err();
        assert_eq!(err.error_num(), Some(GRAPH_NOT_FOUND));
    }

    #[tokio::test]
    async fn test_read_unwraps_field_and_forwards_dirty_read() {
        let (graph, transport) =
            graph_with(|_, _| json_ok(json!({ "edge": { "_id": "knows/k1" }, "code": 200 }))).await;

        let edge = graph
            .edge_collection("knows")
            .edge(json!({ "_key": "k1" }), ReadOptions::default().with_dirty_read())
            .await
            .unwrap();
        assert_eq!(edge, Some(json!({ "_id": "knows/k1" })));

        let request = transport.last_request();
        assert_eq!(request.path, "/_db/_system/_api/gharial/social/edge/knows/k1");
        assert!(request.allow_dirty_read);
        assert_eq!(request.header_value("x-arango-allow-dirty-read"), Some("true"));
    }

    #[tokio::test]
    async fn test_mismatched_handle_fails_before_network() {
        let (graph, transport) = graph_with(|_, _| json_ok(json!({}))).await;
        let err = graph
            .vertex_collection("persons")
            .remove("animals/rex", None::<RemoveOptions>)
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Validation(_)));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_remove_sends_revision_as_if_match_only() {
        let (graph, transport) = graph_with(|_, _| json_ok(json!({ "removed": true }))).await;
        let persons = graph.vertex_collection("persons");

        let options = RemoveOptions {
            rev: Some("abc".to_string()),
            wait_for_sync: Some(true),
            ..Default::default()
        };
        assert!(persons.remove("alice", options).await.unwrap());

        let request = transport.last_request();
        assert_eq!(request.method, Method::Delete);
        assert_eq!(request.header_value("if-match"), Some("abc"));
        assert_eq!(request.query_value("rev"), None);
        assert_eq!(request.query_value("waitForSync"), Some("true"));
    }

    #[tokio::test]
    async fn test_replace_and_update_accept_bare_revision() {
        let (graph, transport) =
            graph_with(|_, _| json_ok(json!({ "vertex": { "_rev": "2" } }))).await;
        let persons = graph.vertex_collection("persons");

        persons
            .replace("persons/alice", &json!({ "age": 32 }), "_rev1")
            .await
            .unwrap();
        let request = transport.last_request();
        assert_eq!(request.method, Method::Put);
        assert_eq!(request.header_value("if-match"), Some("_rev1"));
        assert!(request.query.is_empty());

        let options = UpdateOptions {
            keep_null: Some(false),
            rev: Some("_rev2".to_string()),
            ..Default::default()
        };
        persons
            .update("alice", &json!({ "nick": null }), options)
            .await
            .unwrap();
        let request = transport.last_request();
        assert_eq!(request.method, Method::Patch);
        assert_eq!(request.header_value("if-match"), Some("_rev2"));
        assert_eq!(request.query_value("rev"), None);
        assert_eq!(request.query_value("keepNull"), Some("false"));
    }

    #[tokio::test]
    async fn test_write_without_revision_has_no_precondition() {
        let (graph, transport) = graph_with(|_, _| json_ok(json!({ "edge": {} }))).await;
        graph
            .edge_collection("knows")
            .update("k1", &json!({ "weight": 2 }), None::<UpdateOptions>)
            .await
            .unwrap();
        assert_eq!(transport.last_request().header_value("if-match"), None);
    }

    #[tokio::test]
    async fn test_conflict_surfaces_as_protocol_error() {
        let (graph, transport) = graph_with(|_, _| arango_error(412, 1200)).await;
        let err = graph
            .vertex_collection("persons")
            .replace("alice", &json!({}), "stale")
            .await
            .unwrap_err();
        assert!(err.is_protocol());
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_edge_save_merges_endpoints_into_each_element() {
        let (graph, transport) = graph_with(|_, _| json_ok(json!({ "edge": [] }))).await;
        let knows = graph.edge_collection("knows");

        let data = json!([
            { "since": 2019, "_from": "persons/zed", "_to": "persons/zed" },
            { "since": 2021 }
        ]);
        knows
            .save_between(&data, "persons/alice", json!({ "_id": "persons/bob" }), None)
            .await
            .unwrap();

        let request = transport.last_request();
        let body = match request.body {
            arangolite_core::Body::Json(body) => body,
            other => panic!("expected JSON body, got {:?}", other),
        };
        for item in body.as_array().unwrap() {
            assert_eq!(item["_from"], "persons/alice");
            assert_eq!(item["_to"], "persons/bob");
        }
        assert_eq!(body[1]["since"], 2021);
    }

    #[tokio::test]
    async fn test_edge_save_single_object() {
        let (graph, transport) =
            graph_with(|_, _| json_ok(json!({ "edge": { "_key": "k" } }))).await;

        let saved = graph
            .edge_collection("knows")
            .save_between(
                &json!({ "_from": "persons/x" }),
                "persons/alice",
                "persons/bob",
                Some(InsertOptions {
                    return_new: Some(true),
                    ..Default::default()
                }),
            )
            .await
            .unwrap();
        assert_eq!(saved, json!({ "_key": "k" }));

        let request = transport.last_request();
        assert_eq!(request.path, "/_db/_system/_api/gharial/social/edge/knows");
        assert_eq!(request.query_value("returnNew"), Some("true"));
        match request.body {
            arangolite_core::Body::Json(body) => {
                assert_eq!(body["_from"], "persons/alice");
                assert_eq!(body["_to"], "persons/bob");
            }
            other => panic!("expected JSON body, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_edge_save_rejects_bare_endpoint_keys() {
        let (graph, transport) = graph_with(|_, _| json_ok(json!({ "edge": {} }))).await;
        let err = graph
            .edge_collection("knows")
            .save_between(&json!({}), "alice", "persons/bob", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_create_and_drop() {
        let (graph, transport) = graph_with(|request, _| match request.method {
            Method::Post => json_ok(json!({ "graph": { "name": "social" } })),
            _ => json_ok(json!({ "removed": true })),
        })
        .await;

        let props = arangolite_core::GraphProperties {
            edge_definitions: vec![EdgeDefinition::new("knows", ["persons"], ["persons"])],
            ..Default::default()
        };
        graph.create(&props, None).await.unwrap();
        let request = transport.last_request();
        assert_eq!(request.path, "/_db/_system/_api/gharial");
        match request.body {
            arangolite_core::Body::Json(body) => {
                assert_eq!(body["name"], "social");
                assert_eq!(body["edgeDefinitions"][0]["collection"], "knows");
            }
            other => panic!("expected JSON body, got {:?}", other),
        }

        assert!(graph.drop(true).await.unwrap());
        assert_eq!(transport.last_request().query_value("dropCollections"), Some("true"));
    }

    #[tokio::test]
    async fn test_create_existing_graph_is_an_error() {
        let (graph, _) = graph_with(|_, _| arango_error(409, 1925)).await;
        let err = graph.create(&json!({}), None).await.unwrap_err();
        assert_eq!(err.error_num(), Some(1925));
    }

    #[tokio::test]
    async fn test_collection_listing_and_handles() {
        let (graph, transport) =
            graph_with(|_, _| json_ok(json!({ "collections": ["persons", "places"] }))).await;

        let names = graph
            .list_vertex_collections(Some(ListVertexCollectionOptions {
                exclude_orphans: Some(true),
            }))
            .await
            .unwrap();
        assert_eq!(names, vec!["persons", "places"]);
        assert_eq!(transport.last_request().query_value("excludeOrphans"), Some("true"));

        let handles = graph.edge_collections().await.unwrap();
        assert_eq!(handles.len(), 2);
        assert_eq!(handles[1].name(), "places");
        assert_eq!(handles[1].graph_name(), "social");
        // handles come from the listing alone
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_structural_operations() {
        let (graph, transport) = graph_with(|_, _| json_ok(json!({ "graph": {} }))).await;
        let definition = EdgeDefinition::new("knows", ["persons"], ["persons", "bots"]);

        graph.add_vertex_collection("places").await.unwrap();
        graph.remove_vertex_collection("places", true).await.unwrap();
        graph.add_edge_definition(&definition).await.unwrap();
        graph.replace_edge_definition("knows", &definition).await.unwrap();
        graph.remove_edge_definition("knows", false).await.unwrap();

        let seen: Vec<(Method, String, Option<String>)> = transport
            .requests()
            .into_iter()
            .map(|(_, r)| {
                let drop = r
                    .query_value("dropCollection")
                    .map(str::to_string);
                (r.method, r.path, drop)
            })
            .collect();
        let base = "/_db/_system/_api/gharial/social";
        assert_eq!(
            seen,
            vec![
                (Method::Post, format!("{}/vertex", base), None),
                (Method::Delete, format!("{}/vertex/places", base), Some("true".to_string())),
                (Method::Post, format!("{}/edge", base), None),
                (Method::Put, format!("{}/edge/knows", base), None),
                (Method::Delete, format!("{}/edge/knows", base), Some("false".to_string())),
            ]
        );
    }

    #[tokio::test]
    async fn test_traversal_merges_start_vertex_and_graph() {
        let (graph, transport) =
            graph_with(|_, _| json_ok(json!({ "result": { "visited": { "vertices": [] } } })))
                .await;

        let result = graph
            .traversal(
                "persons/alice",
                &json!({ "direction": "outbound", "graphName": "other" }),
            )
            .await
            .unwrap();
        assert_eq!(result, json!({ "visited": { "vertices": [] } }));

        let request = transport.last_request();
        assert_eq!(request.path, "/_db/_system/_api/traversal");
        match request.body {
            arangolite_core::Body::Json(body) => {
                assert_eq!(body["startVertex"], "persons/alice");
                assert_eq!(body["graphName"], "social");
                assert_eq!(body["direction"], "outbound");
            }
            other => panic!("expected JSON body, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_response_field() {
        let (graph, _) = graph_with(|_, _| json_ok(json!({ "code": 200 }))).await;
        let err = graph.get().await.unwrap_err();
        assert!(matches!(err, ClientError::UnexpectedResponse(ref f) if f == "graph"));
    }
}
