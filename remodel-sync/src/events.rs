//! Synchronization event bus.
//!
//! After a relation mutation settles the engine publishes a
//! [`RelationshipChanged`] event. Subscribers run inline, one after another,
//! before `publish` returns; nothing is queued. Subscribers are registered
//! explicitly at startup.

use crate::error::{RemoteError, RemoteResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use remodel_model::EntityModel;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

/// What happened to a relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipOp {
    Created,
    Updated,
    Deleted,
}

impl fmt::Display for RelationshipOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RelationshipOp::Created => "created",
            RelationshipOp::Updated => "updated",
            RelationshipOp::Deleted => "deleted",
        })
    }
}

/// A relationship between two entities was created, updated or deleted.
#[derive(Debug, Clone, Serialize)]
pub struct RelationshipChanged {
    pub id: Uuid,
    /// The dominant (context) entity.
    pub left: EntityModel,
    pub right: EntityModel,
    pub op: RelationshipOp,
    pub occurred_at: DateTime<Utc>,
}

impl RelationshipChanged {
    pub fn new(left: EntityModel, right: EntityModel, op: RelationshipOp) -> Self {
        Self {
            id: Uuid::now_v7(),
            left,
            right,
            op,
            occurred_at: Utc::now(),
        }
    }
}

/// Reacts to relationship changes.
#[async_trait]
pub trait RelationshipSubscriber: Send + Sync {
    /// Name used in logs and publish reports.
    fn name(&self) -> &str;

    async fn handle(&self, event: &RelationshipChanged) -> RemoteResult<()>;
}

/// Outcome of one publish.
#[derive(Debug, Default)]
pub struct PublishReport {
    /// Subscribers that handled the event.
    pub delivered: usize,
    /// Subscribers that failed, with their errors.
    pub failures: Vec<(String, RemoteError)>,
}

impl PublishReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Process-wide publish/subscribe channel for relationship changes.
#[derive(Default)]
pub struct SynchronizationEventBus {
    subscribers: RwLock<Vec<Arc<dyn RelationshipSubscriber>>>,
}

impl fmt::Debug for SynchronizationEventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SynchronizationEventBus")
            .field("subscribers", &self.subscriber_names())
            .finish()
    }
}

impl SynchronizationEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, subscriber: Arc<dyn RelationshipSubscriber>) {
        debug!(subscriber = subscriber.name(), "Registering relationship subscriber");
        self.subscribers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(subscriber);
    }

    pub fn subscriber_count(&self) -> usize {
        self.snapshot().len()
    }

    pub fn subscriber_names(&self) -> Vec<String> {
        self.snapshot().iter().map(|s| s.name().to_string()).collect()
    }

    /// Delivers the event to every subscriber in registration order.
    ///
    /// A failing subscriber does not stop delivery to the rest. The event is
    /// dropped once all subscribers have seen it.
    pub async fn publish(&self, event: RelationshipChanged) -> PublishReport {
        let mut report = PublishReport::default();
        for subscriber in self.snapshot() {
            match subscriber.handle(&event).await {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    warn!(
                        subscriber = subscriber.name(),
                        event = %event.id,
                        op = %event.op,
                        "Relationship subscriber failed: {e}"
                    );
                    report.failures.push((subscriber.name().to_string(), e));
                }
            }
        }
        debug!(event = %event.id, op = %event.op, delivered = report.delivered, "Published relationship change");
        report
    }

    fn snapshot(&self) -> Vec<Arc<dyn RelationshipSubscriber>> {
        self.subscribers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}
