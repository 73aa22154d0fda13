use crate::error::LinkResult;
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

/// A directed link between two entities. The left entity is the context root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationLink {
    pub left_id: String,
    pub right_id: String,
}

impl RelationLink {
    pub fn new(left_id: impl Into<String>, right_id: impl Into<String>) -> Self {
        Self {
            left_id: left_id.into(),
            right_id: right_id.into(),
        }
    }
}

/// Replaces one link with another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateLinkRequest {
    pub current: RelationLink,
    pub replacement: RelationLink,
}

/// Links streamed back for one left id. Finite, and consumed once.
pub type LinkStream = BoxStream<'static, LinkResult<RelationLink>>;

/// The relationship RPC contract served by every link-service.
#[async_trait]
pub trait RelationshipService: Send + Sync {
    /// Creates a link between two entity ids.
    async fn create_relationship(&self, link: RelationLink) -> LinkResult<()>;

    /// Streams every link whose left id matches.
    async fn get_relations(&self, left_id: &str) -> LinkResult<LinkStream>;

    /// Replaces an existing link.
    async fn update_relationship(&self, request: UpdateLinkRequest) -> LinkResult<()>;

    /// Deletes a link between two entity ids.
    async fn delete_relationship(&self, link: RelationLink) -> LinkResult<()>;
}
