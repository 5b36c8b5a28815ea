use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::config::SystemConfig;
use super::errors::SystemError;
use crate::actor::{Actor, ActorContext, ErrorAction};
use crate::broker::MessageBroker;
use crate::mailbox::{BoundedMailbox, MailboxReceiver};
use crate::supervisor::{ChildSpec, SupervisorTree};
use crate::util::{NodeId, Pid};

enum ControlSignal {
    Stop,
}

struct ActorHandle {
    control: mpsc::Sender<ControlSignal>,
    join: JoinHandle<()>,
}

struct Inner<A: Actor> {
    node_id: NodeId,
    config: SystemConfig,
    broker: A::Broker,
    supervisor: SupervisorTree,
    handles: DashMap<Pid, ActorHandle>,
}

/// Owns every locally-active actor of one kind: spawning, addressing within
/// this node, and graceful/immediate shutdown.
///
/// One `ActorSystem` exists per actor kind (User/Server/Channel); cross-kind
/// and cross-node routing is the job of `chatcore_rt::cluster` and
/// `chatcore-hub`.
pub struct ActorSystem<A: Actor> {
    inner: Arc<Inner<A>>,
}

impl<A: Actor> Clone for ActorSystem<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A: Actor> ActorSystem<A> {
    pub fn new(node_id: NodeId, config: SystemConfig, broker: A::Broker) -> Self {
        Self {
            inner: Arc::new(Inner {
                node_id,
                config,
                broker,
                supervisor: SupervisorTree::new(),
                handles: DashMap::new(),
            }),
        }
    }

    pub fn node_id(&self) -> &NodeId {
        &self.inner.node_id
    }

    pub fn broker(&self) -> &A::Broker {
        &self.inner.broker
    }

    /// Spawn a new local actor at `path`. Fails with `AlreadyExists` if an
    /// actor is already registered under the same resulting `Pid`.
    pub fn spawn(
        &self,
        path: crate::util::ActorPath,
        parent: Option<Pid>,
        mut actor: A,
    ) -> Result<Pid, SystemError> {
        let pid = Pid::new(self.inner.node_id.clone(), path);
        if self.inner.handles.contains_key(&pid) {
            return Err(SystemError::AlreadyExists(pid.to_string()));
        }

        let (mailbox_tx, mut mailbox_rx) = BoundedMailbox::channel::<A::Message>(
            self.inner.config.mailbox_capacity,
            self.inner.config.backpressure,
        );
        self.inner.broker.registry().register(pid.clone(), mailbox_tx);

        if let Some(parent_pid) = parent.clone() {
            self.inner
                .supervisor
                .register_child(parent_pid, pid.clone(), ChildSpec::default());
        }

        let (control_tx, mut control_rx) = mpsc::channel::<ControlSignal>(1);
        let broker = self.inner.broker.clone();
        let supervisor_pid = pid.clone();
        let inner_for_task = Arc::clone(&self.inner);

        let join = tokio::spawn(async move {
            let mut ctx = ActorContext::new(pid.clone(), parent, broker);

            if let Err(err) = actor.pre_start(&mut ctx).await {
                tracing::error!(actor = %pid, error = %err, "actor pre_start failed");
                handle_error(&mut actor, &err, &inner_for_task, &pid);
                return;
            }
            tracing::info!(actor = %pid, "actor started");

            loop {
                tokio::select! {
                    biased;
                    signal = control_rx.recv() => {
                        match signal {
                            Some(ControlSignal::Stop) | None => break,
                        }
                    }
                    envelope = mailbox_rx.recv() => {
                        let Some(envelope) = envelope else { break };
                        ctx.set_pending_reply(envelope.correlation_id);
                        if let Err(err) = actor.handle_message(envelope.payload, &mut ctx).await {
                            tracing::warn!(actor = %pid, error = %err, "actor handle_message error");
                            match actor.on_error(&err) {
                                ErrorAction::Resume => continue,
                                ErrorAction::Stop | ErrorAction::Escalate => break,
                            }
                        }
                    }
                }
            }

            if let Err(err) = actor.post_stop(&mut ctx).await {
                tracing::error!(actor = %pid, error = %err, "actor post_stop failed");
            }
            tracing::info!(actor = %pid, "actor stopped");

            cascade_stop(&inner_for_task, &supervisor_pid).await;
            inner_for_task.broker.registry().unregister(&supervisor_pid);
            inner_for_task.handles.remove(&supervisor_pid);
        });

        self.inner.handles.insert(
            pid.clone(),
            ActorHandle {
                control: control_tx,
                join,
            },
        );

        Ok(pid)
    }

    /// `true` if this exact `Pid` is currently live on this node.
    pub fn get_active(&self, pid: &Pid) -> bool {
        self.inner.handles.contains_key(pid)
    }

    /// Fire-and-forget delivery, attaching no sender.
    pub async fn send(&self, target: &Pid, payload: A::Message) -> Result<(), crate::broker::BrokerError> {
        self.inner.broker.send(target, payload).await
    }

    /// One-shot request/response with an explicit deadline.
    pub async fn request(
        &self,
        target: &Pid,
        payload: A::Message,
        timeout: std::time::Duration,
    ) -> Result<A::Message, crate::broker::BrokerError> {
        self.inner.broker.request(target, payload, timeout).await
    }

    /// Graceful stop: the mailbox drains (messages already enqueued are
    /// still processed), then `post_stop` runs, then children are stopped.
    pub async fn poison(&self, target: &Pid) -> Result<(), SystemError> {
        let control = self
            .inner
            .handles
            .get(target)
            .map(|h| h.control.clone())
            .ok_or_else(|| SystemError::NotActive(target.to_string()))?;
        let _ = control.send(ControlSignal::Stop).await;
        Ok(())
    }

    /// Immediate stop: the task is aborted without draining its mailbox or
    /// running `post_stop`. Used sparingly — prefer `poison`.
    pub fn deactivate(&self, target: &Pid) -> Result<(), SystemError> {
        let (_, handle) = self
            .inner
            .handles
            .remove(target)
            .ok_or_else(|| SystemError::NotActive(target.to_string()))?;
        handle.join.abort();
        self.inner.broker.registry().unregister(target);
        Ok(())
    }

    /// Children registered under `parent` via the spawn-time `parent`
    /// argument (same-kind parenting only; see `SupervisorTree`).
    pub fn children_of(&self, parent: &Pid) -> Vec<Pid> {
        self.inner.supervisor.children_of(parent)
    }

    /// Stop every locally-active actor, waiting up to `shutdown_timeout`.
    pub async fn shutdown(&self) {
        let targets: Vec<Pid> = self.inner.handles.iter().map(|e| e.key().clone()).collect();
        for target in &targets {
            let _ = self.poison(target).await;
        }
        let _ = tokio::time::timeout(self.inner.config.shutdown_timeout, async {
            while !self.inner.handles.is_empty() {
                tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            }
        })
        .await;
    }
}

fn handle_error<A: Actor>(
    _actor: &mut A,
    _err: &A::Error,
    inner: &Arc<Inner<A>>,
    pid: &Pid,
) {
    inner.broker.registry().unregister(pid);
    inner.handles.remove(pid);
}

async fn cascade_stop<A: Actor>(inner: &Arc<Inner<A>>, parent: &Pid) {
    for child in inner.supervisor.children_of(parent) {
        if let Some(handle) = inner.handles.get(&child) {
            let _ = handle.control.send(ControlSignal::Stop).await;
        }
    }
    inner.supervisor.remove_parent(parent);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::{Actor, ActorContext};
    use crate::broker::InMemoryMessageBroker;
    use crate::message::Message;
    use crate::util::ActorPath;
    use async_trait::async_trait;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq)]
    enum Greet {
        Hello,
        WhoAreYou,
        Name(String),
    }

    impl Message for Greet {
        const MESSAGE_TYPE: &'static str = "greet";
    }

    #[derive(Debug, thiserror::Error)]
    #[error("greeter error")]
    struct GreetError;

    struct Greeter {
        greeted: u32,
    }

    #[async_trait]
    impl Actor for Greeter {
        type Message = Greet;
        type Broker = InMemoryMessageBroker<Greet>;
        type Error = GreetError;

        async fn handle_message(
            &mut self,
            msg: Self::Message,
            ctx: &mut ActorContext<Self::Message, Self::Broker>,
        ) -> Result<(), Self::Error> {
            match msg {
                Greet::Hello => {
                    self.greeted += 1;
                    Ok(())
                }
                Greet::WhoAreYou => {
                    ctx.reply(Greet::Name("greeter".to_string()));
                    Ok(())
                }
                Greet::Name(_) => Ok(()),
            }
        }
    }

    fn system() -> ActorSystem<Greeter> {
        ActorSystem::new(
            NodeId::new("node-1"),
            SystemConfig::default(),
            InMemoryMessageBroker::new(),
        )
    }

    #[tokio::test]
    async fn spawn_then_send_is_delivered() {
        let system = system();
        let pid = system
            .spawn(
                ActorPath::User {
                    user_id: "u1".to_string(),
                },
                None,
                Greeter { greeted: 0 },
            )
            .unwrap();

        system.send(&pid, Greet::Hello).await.unwrap();
        // Give the task a moment to process.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(system.get_active(&pid));
    }

    #[tokio::test]
    async fn spawning_same_path_twice_fails() {
        let system = system();
        let path = ActorPath::User {
            user_id: "u1".to_string(),
        };
        system.spawn(path.clone(), None, Greeter { greeted: 0 }).unwrap();
        let err = system
            .spawn(path, None, Greeter { greeted: 0 })
            .unwrap_err();
        assert!(matches!(err, SystemError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn request_reply_round_trips_through_context() {
        let system = system();
        let pid = system
            .spawn(
                ActorPath::User {
                    user_id: "u1".to_string(),
                },
                None,
                Greeter { greeted: 0 },
            )
            .unwrap();

        let reply = system
            .request(&pid, Greet::WhoAreYou, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(reply, Greet::Name("greeter".to_string()));
    }

    #[tokio::test]
    async fn poison_removes_actor_from_active_set() {
        let system = system();
        let pid = system
            .spawn(
                ActorPath::User {
                    user_id: "u1".to_string(),
                },
                None,
                Greeter { greeted: 0 },
            )
            .unwrap();

        system.poison(&pid).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!system.get_active(&pid));
    }

    #[tokio::test]
    async fn poisoning_parent_cascades_to_children() {
        let system = system();
        let parent = system
            .spawn(
                ActorPath::Server {
                    server_id: "srv1".to_string(),
                    region: crate::util::Region::new("na"),
                },
                None,
                Greeter { greeted: 0 },
            )
            .unwrap();
        let child = system
            .spawn(
                ActorPath::Channel {
                    server_id: "srv1".to_string(),
                    channel_id: "c1".to_string(),
                    region: crate::util::Region::new("na"),
                },
                Some(parent.clone()),
                Greeter { greeted: 0 },
            )
            .unwrap();

        system.poison(&parent).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(!system.get_active(&parent));
        assert!(!system.get_active(&child));
    }

    #[tokio::test]
    async fn deactivate_removes_actor_immediately() {
        let system = system();
        let pid = system
            .spawn(
                ActorPath::User {
                    user_id: "u1".to_string(),
                },
                None,
                Greeter { greeted: 0 },
            )
            .unwrap();
        system.deactivate(&pid).unwrap();
        assert!(!system.get_active(&pid));
    }

    #[tokio::test]
    async fn sending_to_inactive_pid_errors() {
        let system = system();
        let ghost = Pid::new(
            NodeId::new("node-1"),
            ActorPath::User {
                user_id: "ghost".to_string(),
            },
        );
        let err = system.send(&ghost, Greet::Hello).await.unwrap_err();
        assert_eq!(err, crate::broker::BrokerError::NotFound);
    }
}
