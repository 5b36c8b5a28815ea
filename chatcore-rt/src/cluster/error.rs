use thiserror::Error;

use crate::broker::BrokerError;
use crate::util::NodeId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClusterError {
    #[error("no node is registered for {0}")]
    UnknownNode(NodeId),
    #[error(transparent)]
    Broker(#[from] BrokerError),
}
