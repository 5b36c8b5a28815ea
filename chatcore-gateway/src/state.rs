use std::sync::Arc;

use chatcore_adapters::KvStore;
use chatcore_hub::Hub;

use crate::registry::ConnRegistry;

/// Shared state handed to every axum handler in this crate: the fan-out
/// hub, the process-wide conn→PID map, and the presence/ability cache
/// whose reachability `/healthz` reports (§4.7's "Health introspection").
#[derive(Clone)]
pub struct GatewayState {
    pub hub: Hub,
    pub registry: Arc<ConnRegistry>,
    pub kv: Arc<dyn KvStore>,
}

impl GatewayState {
    pub fn new(hub: Hub, kv: Arc<dyn KvStore>) -> Self {
        Self {
            hub,
            registry: Arc::new(ConnRegistry::new()),
            kv,
        }
    }
}
