use async_trait::async_trait;
use chatcore_actors::{OutboundSink, SinkError};
use tokio::sync::mpsc;

/// A message destined for one connection's writer task: either a binary
/// envelope produced by the bound `UserActor`, or a heartbeat echo produced
/// directly by the connection's read loop. Kept as one channel so the two
/// sources can never interleave frames on the wire.
pub enum OutFrame {
    Envelope(Vec<u8>),
    HeartbeatEcho,
}

/// The `UserActor`'s view of a bound websocket, implemented over a bounded
/// `mpsc` channel feeding a dedicated writer task (see
/// [`crate::ws::ws_upgrade`]). Exclusively owned by exactly one `UserActor`
/// for its lifetime; closing the actor closes the socket on every exit path.
pub struct ChannelSink {
    tx: mpsc::Sender<OutFrame>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<OutFrame>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl OutboundSink for ChannelSink {
    async fn send(&self, frame: Vec<u8>) -> Result<(), SinkError> {
        self.tx.send(OutFrame::Envelope(frame)).await.map_err(|_| SinkError::Closed)
    }
}
