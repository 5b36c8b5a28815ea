//! Node bootstrap: configuration, logging, adapters, the actor fabric, the
//! hub, and the websocket gateway, wired together and served from a single
//! process.

mod config;

use std::sync::Arc;

use chatcore_adapters::{KvStore, PgSqlStore, RedisKvStore};
use chatcore_gateway::{build_router, GatewayState};
use chatcore_hub::Hub;
use chatcore_rt::{NodeId, RegionTable, SystemConfig};
use config::NodeConfig;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        tracing::error!(error = %err, "node failed to start");
        eprintln!("chatcore-node: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = NodeConfig::from_env()?;

    let filter = tracing_subscriber::EnvFilter::try_new(&config.log_level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!(
        node_id = %config.node_id,
        region = %config.region,
        regions = ?config.regions,
        "starting chatcore-node"
    );

    let pg_pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.postgres.url)
        .await?;
    let sql = Arc::new(PgSqlStore::new(pg_pool));

    // A single-process deployment serves every configured region locally;
    // an empty table makes `Hub::new` fall back to a node named after each
    // region, which is exactly this process.
    let region_table = RegionTable::new(std::collections::HashMap::new());

    let hub = Hub::new(
        NodeId::new(config.node_id.clone()),
        config.regions.clone(),
        region_table,
        sql,
        SystemConfig::default(),
    );

    hub.bootstrap(&config.region).await?;
    tracing::info!(region = %config.region, "bootstrap complete, activating gateway");

    let kv: Arc<dyn KvStore> = Arc::new(RedisKvStore::connect(&config.dragonfly.url).await?);

    let state = GatewayState::new(hub, kv);
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    tracing::info!(addr = %config.bind_addr(), "listening");
    axum::serve(listener, router).await?;

    Ok(())
}
