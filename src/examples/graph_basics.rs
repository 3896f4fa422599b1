//! Graph Basics Example
//!
//! Creates a small social graph, links two people and walks the graph.
//! Expects a server on http://localhost:8529 (override with ARANGO_URL).
//!
//! Run with: cargo run --example graph_basics

use arangolite_rs::telemetry::{init_tracing, LogFormat};
use arangolite_rs::{Config, Database, EdgeDefinition, GraphProperties, ReadOptions};
use serde_json::json;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing(LogFormat::Pretty)?;
    println!("Arangolite Graph Example\n");

    let db = Database::new(Config::from_env()).await?;
    let version = db.version().await?;
    println!("✅ Connected to {} {}\n", version.server, version.version);

    let graph = db.graph("social");
    if graph.exists().await? {
        graph.drop(true).await?;
    }
    graph
        .create(
            &GraphProperties {
                edge_definitions: vec![EdgeDefinition::new("knows", ["persons"], ["persons"])],
                ..Default::default()
            },
            None,
        )
        .await?;
    println!("📊 Created graph '{}'", graph.name());

    let persons = graph.vertex_collection("persons");
    let alice = persons.save(&json!({ "_key": "alice", "age": 34 }), None).await?;
    let bob = persons.save(&json!({ "_key": "bob", "age": 29 }), None).await?;
    println!("   Saved {} and {}", alice["_id"], bob["_id"]);

    let knows = graph.edge_collection("knows");
    knows
        .save_between(&json!({ "since": 2019 }), "persons/alice", "persons/bob", None)
        .await?;

    // Conditional update: the revision must still match
    let rev = alice["_rev"].as_str().unwrap_or_default();
    let updated = persons.update("alice", &json!({ "age": 35 }), rev).await?;
    println!("   Updated alice, new revision {}", updated["_rev"]);

    let missing = persons.vertex("nobody", ReadOptions::graceful()).await?;
    println!("   Graceful read of a missing vertex: {:?}\n", missing);

    let result = graph
        .traversal(
            "persons/alice",
            &json!({ "direction": "outbound", "maxDepth": 1 }),
        )
        .await?;
    println!("🔍 Traversal from alice:");
    if let Some(vertices) = result["visited"]["vertices"].as_array() {
        for vertex in vertices {
            println!("   {}", vertex["_id"]);
        }
    }

    println!("\n📁 Graphs in '{}':", db.name());
    for definition in db.list_graphs().await? {
        println!("   {}", definition["_key"]);
    }

    Ok(())
}
