//! Failover Example
//!
//! Configures an unreachable coordinator in front of a live one and shows the
//! router moving on, then pins a request to a single host.
//!
//! Run with: RUST_LOG=arangolite_rs=debug cargo run --example failover

use arangolite_rs::telemetry::{init_tracing, LogFormat};
use arangolite_rs::{Config, Database, LoadBalancingStrategy, Request};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing(LogFormat::Pretty)?;
    println!("Arangolite Failover Example\n");

    let live = std::env::var("ARANGO_URL").unwrap_or_else(|_| "http://localhost:8529".to_string());
    let mut config = Config::default().with_urls(["http://127.0.0.1:1", live.as_str()]);
    config.load_balancing_strategy = LoadBalancingStrategy::None;
    config.max_retries = Some(3);
    config.timeout_ms = Some(2_000);

    let db = Database::new(config).await?;

    let version = db.version().await?;
    println!("✅ Served by {} {}\n", version.server, version.version);

    println!("🩺 Host table:");
    for endpoint in db.hosts().await {
        println!("   #{} {} {:?}", endpoint.id(), endpoint.target.url, endpoint.health);
    }

    // Pinned requests never fail over
    let pinned = db
        .connection()
        .request(Request::get("/_api/version").pinned_to(0))
        .await;
    match pinned {
        Ok(_) => println!("\n📌 Host #0 answered"),
        Err(err) => println!("\n📌 Host #0 failed without failover: {}", err),
    }

    db.deactivate_host(0).await?;
    println!("🚫 Host #0 deactivated, remaining traffic goes to {}", live);
    db.version().await?;

    Ok(())
}
