use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};

use crate::types::{AgentConfig, AgentId, DataTarget, ExecutionId};

pub const DEFAULT_EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum AgentEvent {
    Initialized {
        agent_id: AgentId,
        config: AgentConfig,
    },
    ExecutionStarted {
        agent_id: AgentId,
        execution_id: ExecutionId,
    },
    ExecutionCompleted {
        agent_id: AgentId,
        execution_id: ExecutionId,
        duration_ms: u64,
    },
    ConfigUpdated {
        agent_id: AgentId,
        config: AgentConfig,
    },
    Paused {
        agent_id: AgentId,
    },
    Resumed {
        agent_id: AgentId,
    },
    Cleanup {
        agent_id: AgentId,
    },
    TargetSet {
        agent_id: AgentId,
        target: DataTarget,
    },
    CollectionStarted {
        agent_id: AgentId,
        sources: Vec<String>,
    },
    CollectionStopped {
        agent_id: AgentId,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    Initialized,
    ExecutionStarted,
    ExecutionCompleted,
    ConfigUpdated,
    Paused,
    Resumed,
    Cleanup,
    TargetSet,
    CollectionStarted,
    CollectionStopped,
}

impl AgentEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            AgentEvent::Initialized { .. } => EventKind::Initialized,
            AgentEvent::ExecutionStarted { .. } => EventKind::ExecutionStarted,
            AgentEvent::ExecutionCompleted { .. } => EventKind::ExecutionCompleted,
            AgentEvent::ConfigUpdated { .. } => EventKind::ConfigUpdated,
            AgentEvent::Paused { .. } => EventKind::Paused,
            AgentEvent::Resumed { .. } => EventKind::Resumed,
            AgentEvent::Cleanup { .. } => EventKind::Cleanup,
            AgentEvent::TargetSet { .. } => EventKind::TargetSet,
            AgentEvent::CollectionStarted { .. } => EventKind::CollectionStarted,
            AgentEvent::CollectionStopped { .. } => EventKind::CollectionStopped,
        }
    }

    pub fn agent_id(&self) -> &str {
        match self {
            AgentEvent::Initialized { agent_id, .. }
            | AgentEvent::ExecutionStarted { agent_id, .. }
            | AgentEvent::ExecutionCompleted { agent_id, .. }
            | AgentEvent::ConfigUpdated { agent_id, .. }
            | AgentEvent::Paused { agent_id }
            | AgentEvent::Resumed { agent_id }
            | AgentEvent::Cleanup { agent_id }
            | AgentEvent::TargetSet { agent_id, .. }
            | AgentEvent::CollectionStarted { agent_id, .. }
            | AgentEvent::CollectionStopped { agent_id } => agent_id,
        }
    }
}

/// Ordered fan-out of [`AgentEvent`]s. Every subscriber sees each event
/// published after it subscribed, once, in publish order.
#[derive(Debug, Clone)]
pub struct EventChannel {
    tx: broadcast::Sender<AgentEvent>,
}

impl EventChannel {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn publish(&self, event: AgentEvent) {
        let kind = event.kind();
        if self.tx.send(event).is_err() {
            log::trace!("No subscribers for {:?} event", kind);
        }
    }

    pub fn subscribe(&self) -> EventSubscription {
        EventSubscription {
            rx: self.tx.subscribe(),
            kinds: None,
        }
    }

    pub fn subscribe_to(&self, kinds: &[EventKind]) -> EventSubscription {
        EventSubscription {
            rx: self.tx.subscribe(),
            kinds: Some(kinds.iter().copied().collect()),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventChannel {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

pub struct EventSubscription {
    rx: broadcast::Receiver<AgentEvent>,
    kinds: Option<HashSet<EventKind>>,
}

impl EventSubscription {
    /// Waits for the next matching event. `None` once the channel is gone.
    pub async fn recv(&mut self) -> Option<AgentEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if accepts(&self.kinds, &event) => return Some(event),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    log::warn!("Event subscriber lagged, {} events dropped", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    pub fn try_recv(&mut self) -> Option<AgentEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) if accepts(&self.kinds, &event) => return Some(event),
                Ok(_) => continue,
                Err(TryRecvError::Lagged(skipped)) => {
                    log::warn!("Event subscriber lagged, {} events dropped", skipped);
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }

    /// Everything already published and not yet received.
    pub fn drain(&mut self) -> Vec<AgentEvent> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }

    pub fn into_stream(self) -> impl Stream<Item = AgentEvent> {
        let kinds = self.kinds;
        BroadcastStream::new(self.rx).filter_map(move |result| match result {
            Ok(event) if accepts(&kinds, &event) => Some(event),
            _ => None,
        })
    }
}

fn accepts(kinds: &Option<HashSet<EventKind>>, event: &AgentEvent) -> bool {
    kinds
        .as_ref()
        .is_none_or(|kinds| kinds.contains(&event.kind()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cleanup(id: &str) -> AgentEvent {
        AgentEvent::Cleanup {
            agent_id: id.to_string(),
        }
    }

    #[test]
    fn test_publish_without_subscribers() {
        let channel = EventChannel::default();
        channel.publish(cleanup("a"));
        assert_eq!(channel.subscriber_count(), 0);
    }

    #[test]
    fn test_events_arrive_in_order() {
        let channel = EventChannel::default();
        let mut sub = channel.subscribe();

        channel.publish(AgentEvent::Paused {
            agent_id: "a".into(),
        });
        channel.publish(AgentEvent::Resumed {
            agent_id: "a".into(),
        });
        channel.publish(cleanup("a"));

        let kinds: Vec<EventKind> = sub.drain().iter().map(AgentEvent::kind).collect();
        assert_eq!(
            kinds,
            vec![EventKind::Paused, EventKind::Resumed, EventKind::Cleanup]
        );
        assert!(sub.try_recv().is_none());
    }

    #[test]
    fn test_filtered_subscription() {
        let channel = EventChannel::default();
        let mut only_cleanup = channel.subscribe_to(&[EventKind::Cleanup]);

        channel.publish(AgentEvent::Paused {
            agent_id: "a".into(),
        });
        channel.publish(cleanup("b"));

        let events = only_cleanup.drain();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].agent_id(), "b");
    }

    #[tokio::test]
    async fn test_recv_returns_none_when_closed() {
        let channel = EventChannel::default();
        let mut sub = channel.subscribe();
        channel.publish(cleanup("a"));
        drop(channel);

        assert_eq!(sub.recv().await, Some(cleanup("a")));
        assert_eq!(sub.recv().await, None);
    }

    #[tokio::test]
    async fn test_stream() {
        let channel = EventChannel::default();
        let stream = channel.subscribe_to(&[EventKind::Resumed]).into_stream();

        channel.publish(cleanup("a"));
        channel.publish(AgentEvent::Resumed {
            agent_id: "a".into(),
        });
        drop(channel);

        let events: Vec<AgentEvent> = stream.collect().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind(), EventKind::Resumed);
    }

    #[test]
    fn test_wire_format() {
        let json = serde_json::to_value(AgentEvent::CollectionStarted {
            agent_id: "a".into(),
            sources: vec!["hn".into()],
        })
        .unwrap();

        assert_eq!(json["type"], "collectionStarted");
        assert_eq!(json["agentId"], "a");
        assert_eq!(json["sources"][0], "hn");
    }
}
