use async_trait::async_trait;

use crate::error::SinkError;

/// The outbound half of a bound websocket, as seen by a [`crate::UserActor`].
///
/// Exclusively owned by exactly one `UserActor` for its lifetime;
/// `chatcore-gateway` implements this over a writer
/// task fed by a bounded `mpsc` channel so no two frames are ever interleaved
/// on the wire even though the actor and the socket's reader run
/// concurrently.
#[async_trait]
pub trait OutboundSink: Send + Sync + 'static {
    /// Write one binary frame. A transport error here is logged and
    /// absorbed by the caller; chronic failure is
    /// expected to eventually close the socket and stop the actor from the
    /// gateway side, not from within the actor itself.
    async fn send(&self, frame: Vec<u8>) -> Result<(), SinkError>;
}

/// In-memory fakes exported unconditionally (not behind `cfg(test)`) so
/// downstream crates can exercise their own tests against the same trait
/// boundary production code depends on.
pub mod testing {
    use super::*;
    use tokio::sync::Mutex;

    /// An in-memory [`OutboundSink`] double that records every frame
    /// written to it, for asserting on wire output without a real socket.
    #[derive(Default)]
    pub struct RecordingSink {
        frames: Mutex<Vec<Vec<u8>>>,
    }

    impl RecordingSink {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn frames(&self) -> Vec<Vec<u8>> {
            self.frames.lock().await.clone()
        }
    }

    #[async_trait]
    impl OutboundSink for RecordingSink {
        async fn send(&self, frame: Vec<u8>) -> Result<(), SinkError> {
            self.frames.lock().await.push(frame);
            Ok(())
        }
    }
}
