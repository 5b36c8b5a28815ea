// Layer 1: Standard library
use std::fmt;

// Layer 2: Third-party
use serde::{Deserialize, Serialize};

// Layer 3: Internal
// (none)

/// A logical geographic deployment region, e.g. `"na"`, `"eu"`, `"asia"`.
///
/// The region set is a configuration value loaded at node start (see
/// `chatcore_rt::cluster::RegionTable`), never a hardcoded list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Region(String);

impl Region {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Region {
    fn from(value: &str) -> Self {
        Region::new(value)
    }
}

/// The identity of one running node in the cluster.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        NodeId::new(value)
    }
}

/// The registered class of an actor: `user`, `server`, or `channel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActorKind {
    User,
    Server,
    Channel,
}

impl fmt::Display for ActorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActorKind::User => "user",
            ActorKind::Server => "server",
            ActorKind::Channel => "channel",
        };
        f.write_str(s)
    }
}

/// The logical, cluster-wide path of an actor, independent of which node
/// currently hosts it.
///
/// Display format matches the addressing scheme: `user/<id>`,
/// `server/<id>@<region>`, `server/<id>@<region>/channel/<id>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActorPath {
    User { user_id: String },
    Server { server_id: String, region: Region },
    Channel {
        server_id: String,
        channel_id: String,
        region: Region,
    },
}

impl ActorPath {
    pub fn kind(&self) -> ActorKind {
        match self {
            ActorPath::User { .. } => ActorKind::User,
            ActorPath::Server { .. } => ActorKind::Server,
            ActorPath::Channel { .. } => ActorKind::Channel,
        }
    }

    pub fn region(&self) -> Option<&Region> {
        match self {
            ActorPath::User { .. } => None,
            ActorPath::Server { region, .. } => Some(region),
            ActorPath::Channel { region, .. } => Some(region),
        }
    }

    /// The parent path, if this path denotes a child actor.
    pub fn parent(&self) -> Option<ActorPath> {
        match self {
            ActorPath::Channel {
                server_id, region, ..
            } => Some(ActorPath::Server {
                server_id: server_id.clone(),
                region: region.clone(),
            }),
            _ => None,
        }
    }
}

impl fmt::Display for ActorPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActorPath::User { user_id } => write!(f, "user/{user_id}"),
            ActorPath::Server { server_id, region } => {
                write!(f, "server/{server_id}@{region}")
            }
            ActorPath::Channel {
                server_id,
                channel_id,
                region,
            } => write!(f, "server/{server_id}@{region}/channel/{channel_id}"),
        }
    }
}

/// A cluster-wide actor address: which node hosts the actor, and its
/// logical path on that node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pid {
    pub node: NodeId,
    pub path: ActorPath,
}

impl Pid {
    pub fn new(node: NodeId, path: ActorPath) -> Self {
        Self { node, path }
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.path, self.node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_path_display() {
        let path = ActorPath::User {
            user_id: "u1".to_string(),
        };
        assert_eq!(path.to_string(), "user/u1");
        assert_eq!(path.kind(), ActorKind::User);
        assert!(path.region().is_none());
    }

    #[test]
    fn server_path_display() {
        let path = ActorPath::Server {
            server_id: "srv1".to_string(),
            region: Region::new("na"),
        };
        assert_eq!(path.to_string(), "server/srv1@na");
    }

    #[test]
    fn channel_path_display_and_parent() {
        let path = ActorPath::Channel {
            server_id: "srv1".to_string(),
            channel_id: "c1".to_string(),
            region: Region::new("na"),
        };
        assert_eq!(path.to_string(), "server/srv1@na/channel/c1");
        let parent = path.parent().expect("channel has a parent");
        assert_eq!(parent.to_string(), "server/srv1@na");
    }

    #[test]
    fn pid_display_combines_node_and_path() {
        let pid = Pid::new(
            NodeId::new("node-1"),
            ActorPath::User {
                user_id: "u1".to_string(),
            },
        );
        assert_eq!(pid.to_string(), "user/u1@node-1");
    }

    #[test]
    fn path_equality_and_hash_are_structural() {
        let a = ActorPath::Server {
            server_id: "srv1".to_string(),
            region: Region::new("na"),
        };
        let b = ActorPath::Server {
            server_id: "srv1".to_string(),
            region: Region::new("na"),
        };
        assert_eq!(a, b);
    }
}
