use std::time::Duration;

/// Whether a child actor is restarted after it stops.
///
/// Nothing in this domain currently spawns a `ChildSpec` with anything but
/// [`RestartPolicy::Never`] — a crashed actor here is never restarted by its
/// supervisor, only re-activated on demand by a caller — but the type
/// exists so a future supervised subsystem doesn't need a new concept
/// bolted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartPolicy {
    Never,
    Always,
    OnFailure,
}

/// How long a supervisor waits for a child to exit gracefully before
/// force-stopping it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownPolicy {
    Graceful(Duration),
    Immediate,
}

/// Declarative metadata recorded when a child is registered with a
/// [`super::SupervisorTree`].
#[derive(Debug, Clone)]
pub struct ChildSpec {
    pub restart: RestartPolicy,
    pub shutdown: ShutdownPolicy,
}

impl Default for ChildSpec {
    fn default() -> Self {
        Self {
            restart: RestartPolicy::Never,
            shutdown: ShutdownPolicy::Graceful(Duration::from_secs(5)),
        }
    }
}
