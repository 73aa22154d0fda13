//! Keeps link-services in step with entity mutations.

use crate::error::{RemoteError, RemoteResult};
use crate::events::{RelationshipChanged, RelationshipOp, RelationshipSubscriber};
use async_trait::async_trait;
use remodel_links::{LinkDirectory, LinkError, RelationLink};
use std::sync::Arc;
use tracing::debug;

/// Subscriber that mirrors relationship changes into the link-service.
///
/// Created relationships become links and deleted relationships remove
/// theirs. Updates leave links alone: link identity does not change when a
/// related entity is updated.
pub struct LinkSynchronizer {
    links: Arc<LinkDirectory>,
}

impl LinkSynchronizer {
    pub fn new(links: Arc<LinkDirectory>) -> Self {
        Self { links }
    }

    fn link_for(event: &RelationshipChanged) -> RemoteResult<RelationLink> {
        let left_id = event.left.primary_key();
        let right_id = event.right.primary_key();
        match (left_id, right_id) {
            (Some(left), Some(right)) => Ok(RelationLink::new(left, right)),
            _ => Err(RemoteError::Link(LinkError::InvalidArgument(format!(
                "{} relationship between {} and {} is missing an id",
                event.op,
                event.left.entity_type().name,
                event.right.entity_type().name
            )))),
        }
    }
}

#[async_trait]
impl RelationshipSubscriber for LinkSynchronizer {
    fn name(&self) -> &str {
        "link-synchronizer"
    }

    async fn handle(&self, event: &RelationshipChanged) -> RemoteResult<()> {
        if event.op == RelationshipOp::Updated {
            return Ok(());
        }

        let link = Self::link_for(event)?;
        let gateway = self.links.gateway(
            &event.left.entity_type().plural_name(),
            &event.right.entity_type().plural_name(),
        )?;
        debug!(op = %event.op, address = %gateway.address(), ?link, "Synchronizing link");

        match event.op {
            RelationshipOp::Created => gateway.create_link(&link.left_id, &link.right_id).await?,
            RelationshipOp::Deleted => gateway.delete_link(&link.left_id, &link.right_id).await?,
            RelationshipOp::Updated => {}
        }
        Ok(())
    }
}
