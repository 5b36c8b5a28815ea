use axum::extract::State;
use axum::routing::get;
use axum::Json;
use axum::Router;
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::state::GatewayState;
use crate::ws::ws_upgrade;

/// Builds the gateway's axum `Router`: the single `GET /ws/:user_id`
/// upgrade endpoint plus a `/healthz` liveness probe for the node binary's
/// own readiness checks.
pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route("/ws/{user_id}", get(ws_upgrade))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthReport {
    live_connections: usize,
    kv_reachable: bool,
    kv_last_error: Option<String>,
}

/// Reports local connection count and KV cache reachability so an
/// orchestrator can distinguish "up but cache-degraded" from "down"
/// without reaching into `chatcore-adapters` itself.
async fn healthz(State(state): State<GatewayState>) -> Json<HealthReport> {
    let kv_health = state.kv.health().await;
    Json(HealthReport {
        live_connections: state.registry.len(),
        kv_reachable: kv_health.last_error.is_none(),
        kv_last_error: kv_health.last_error,
    })
}
