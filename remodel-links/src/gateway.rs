//! Gateway to one link-service.
//!
//! A [`RelationshipGateway`] is bound to a single resolved address. Errors
//! from the service are always returned; whether a failure is fatal is the
//! caller's decision.

use crate::address::{AddressResolver, ResolvedAddress};
use crate::contract::{LinkStream, RelationLink, RelationshipService, UpdateLinkRequest};
use crate::deadline::TimeUnit;
use crate::error::{LinkError, LinkResult};
use futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Configuration for gateway calls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Deadline applied to each RPC. `None` waits indefinitely.
    #[serde(default)]
    pub rpc_deadline: Option<Duration>,
}

/// Opens the RPC service behind a resolved address.
pub trait LinkConnector: Send + Sync {
    fn connect(&self, address: &ResolvedAddress) -> LinkResult<Arc<dyn RelationshipService>>;
}

/// Link-service operations against one resolved address.
#[derive(Clone)]
pub struct RelationshipGateway {
    address: ResolvedAddress,
    service: Arc<dyn RelationshipService>,
    config: GatewayConfig,
}

impl std::fmt::Debug for RelationshipGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelationshipGateway")
            .field("address", &self.address)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RelationshipGateway {
    pub fn new(
        address: ResolvedAddress,
        service: Arc<dyn RelationshipService>,
        config: GatewayConfig,
    ) -> Self {
        Self {
            address,
            service,
            config,
        }
    }

    pub fn address(&self) -> &ResolvedAddress {
        &self.address
    }

    /// Creates the link `left -> right`.
    pub async fn create_link(&self, left_id: &str, right_id: &str) -> LinkResult<()> {
        let link = checked_link(left_id, right_id)?;
        debug!(address = %self.address, left = %left_id, right = %right_id, "CreateRelationship");
        self.call("CreateRelationship", self.service.create_relationship(link))
            .await
    }

    /// Streams the links whose left id is `left_id`.
    ///
    /// The stream is lazy and can only be consumed once; call again for a
    /// fresh stream.
    pub async fn list_links_by_left(&self, left_id: &str) -> LinkResult<LinkStream> {
        if left_id.is_empty() {
            return Err(LinkError::InvalidArgument("left id is empty".to_string()));
        }
        debug!(address = %self.address, left = %left_id, "GetRelations");
        self.call("GetRelations", self.service.get_relations(left_id))
            .await
    }

    /// Collects the right ids linked to `left_id`, in stream order.
    pub async fn linked_right_ids(&self, left_id: &str) -> LinkResult<Vec<String>> {
        let stream = self.list_links_by_left(left_id).await?;
        let collect = stream.map_ok(|link| link.right_id).try_collect::<Vec<_>>();
        self.call("GetRelations", collect).await
    }

    /// Replaces one link with another.
    pub async fn update_link(&self, request: UpdateLinkRequest) -> LinkResult<()> {
        checked_link(&request.current.left_id, &request.current.right_id)?;
        checked_link(&request.replacement.left_id, &request.replacement.right_id)?;
        debug!(address = %self.address, ?request, "UpdateRelationship");
        self.call("UpdateRelationship", self.service.update_relationship(request))
            .await
    }

    /// Deletes the link `left -> right`.
    pub async fn delete_link(&self, left_id: &str, right_id: &str) -> LinkResult<()> {
        let link = checked_link(left_id, right_id)?;
        debug!(address = %self.address, left = %left_id, right = %right_id, "DeleteRelationship");
        self.call("DeleteRelationship", self.service.delete_relationship(link))
            .await
    }

    async fn call<T, F>(&self, method: &str, fut: F) -> LinkResult<T>
    where
        F: Future<Output = LinkResult<T>>,
    {
        match self.config.rpc_deadline {
            Some(deadline) => tokio::time::timeout(deadline, fut).await.map_err(|_| {
                LinkError::DeadlineExceeded {
                    method: method.to_string(),
                    deadline_ms: TimeUnit::Milliseconds.of(deadline),
                }
            })?,
            None => fut.await,
        }
    }
}

fn checked_link(left_id: &str, right_id: &str) -> LinkResult<RelationLink> {
    if left_id.is_empty() || right_id.is_empty() {
        return Err(LinkError::InvalidArgument(format!(
            "link needs both ids (left: {left_id:?}, right: {right_id:?})"
        )));
    }
    Ok(RelationLink::new(left_id, right_id))
}

/// Finds the gateway for a pair of entity types.
///
/// Combines address resolution with a connector. Addresses are recomputed on
/// every call so environment overrides take effect without a restart.
#[derive(Clone)]
pub struct LinkDirectory {
    resolver: AddressResolver,
    connector: Arc<dyn LinkConnector>,
    config: GatewayConfig,
}

impl LinkDirectory {
    pub fn new(resolver: AddressResolver, connector: Arc<dyn LinkConnector>) -> Self {
        Self::with_config(resolver, connector, GatewayConfig::default())
    }

    pub fn with_config(
        resolver: AddressResolver,
        connector: Arc<dyn LinkConnector>,
        config: GatewayConfig,
    ) -> Self {
        Self {
            resolver,
            connector,
            config,
        }
    }

    pub fn resolver(&self) -> &AddressResolver {
        &self.resolver
    }

    /// Returns the gateway for `(left, right)` plural type names.
    pub fn gateway(&self, left_plural: &str, right_plural: &str) -> LinkResult<RelationshipGateway> {
        let address = self.resolver.resolve(left_plural, right_plural);
        let service = self.connector.connect(&address)?;
        Ok(RelationshipGateway::new(address, service, self.config.clone()))
    }
}
