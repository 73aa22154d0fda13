//! In-process link-service.
//!
//! Implements the relationship contract over a plain vector of links. Used by
//! tests and by deployments that embed the link store in the same process.

use crate::address::ResolvedAddress;
use crate::contract::{LinkStream, RelationLink, RelationshipService, UpdateLinkRequest};
use crate::error::{LinkError, LinkResult};
use crate::gateway::LinkConnector;
use async_trait::async_trait;
use futures::StreamExt;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// A link-service holding its links in memory.
#[derive(Debug, Default)]
pub struct InMemoryLinkService {
    links: Mutex<Vec<RelationLink>>,
    failure: Mutex<Option<LinkError>>,
    latency: Mutex<Option<Duration>>,
    calls: AtomicUsize,
}

impl InMemoryLinkService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a service pre-populated with links.
    pub fn with_links<I>(links: I) -> Self
    where
        I: IntoIterator<Item = RelationLink>,
    {
        let service = Self::default();
        lock(&service.links).extend(links);
        service
    }

    /// Snapshot of the stored links, in insertion order.
    pub fn links(&self) -> Vec<RelationLink> {
        lock(&self.links).clone()
    }

    /// Number of RPCs served, including failed ones.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Makes every following RPC fail with `error`, or succeed again on `None`.
    pub fn set_failure(&self, error: Option<LinkError>) {
        *lock(&self.failure) = error;
    }

    /// Delays every following RPC.
    pub fn set_latency(&self, latency: Option<Duration>) {
        *lock(&self.latency) = latency;
    }

    async fn begin(&self) -> LinkResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let latency = *lock(&self.latency);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        match lock(&self.failure).clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RelationshipService for InMemoryLinkService {
    async fn create_relationship(&self, link: RelationLink) -> LinkResult<()> {
        self.begin().await?;
        let mut links = lock(&self.links);
        if !links.contains(&link) {
            links.push(link);
        }
        Ok(())
    }

    async fn get_relations(&self, left_id: &str) -> LinkResult<LinkStream> {
        self.begin().await?;
        let matching: Vec<LinkResult<RelationLink>> = lock(&self.links)
            .iter()
            .filter(|link| link.left_id == left_id)
            .cloned()
            .map(Ok)
            .collect();
        Ok(futures::stream::iter(matching).boxed())
    }

    async fn update_relationship(&self, request: UpdateLinkRequest) -> LinkResult<()> {
        self.begin().await?;
        let mut links = lock(&self.links);
        let slot = links
            .iter_mut()
            .find(|link| **link == request.current)
            .ok_or_else(|| LinkError::NotFound(format!("{:?}", request.current)))?;
        *slot = request.replacement;
        Ok(())
    }

    async fn delete_relationship(&self, link: RelationLink) -> LinkResult<()> {
        self.begin().await?;
        let mut links = lock(&self.links);
        let before = links.len();
        links.retain(|existing| *existing != link);
        if links.len() == before {
            return Err(LinkError::NotFound(format!("{link:?}")));
        }
        Ok(())
    }
}

/// Connects each resolved address to its own in-memory service.
///
/// Services are created on first connection and shared afterwards.
#[derive(Debug, Default)]
pub struct InMemoryConnector {
    services: Mutex<HashMap<ResolvedAddress, Arc<InMemoryLinkService>>>,
    unreachable: Mutex<HashSet<String>>,
    connections: Mutex<Vec<ResolvedAddress>>,
}

impl InMemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `address` with a specific service.
    pub fn register(&self, address: ResolvedAddress, service: Arc<InMemoryLinkService>) {
        lock(&self.services).insert(address, service);
    }

    /// Returns the service behind `address`, creating it when needed.
    pub fn service(&self, address: &ResolvedAddress) -> Arc<InMemoryLinkService> {
        lock(&self.services)
            .entry(address.clone())
            .or_insert_with(|| Arc::new(InMemoryLinkService::new()))
            .clone()
    }

    /// Refuses connections to `host` from now on.
    pub fn mark_unreachable(&self, host: impl Into<String>) {
        lock(&self.unreachable).insert(host.into());
    }

    /// Every address connected to, in order.
    pub fn connections(&self) -> Vec<ResolvedAddress> {
        lock(&self.connections).clone()
    }
}

impl LinkConnector for InMemoryConnector {
    fn connect(&self, address: &ResolvedAddress) -> LinkResult<Arc<dyn RelationshipService>> {
        if lock(&self.unreachable).contains(&address.host) {
            return Err(LinkError::Unavailable {
                address: address.to_string(),
                reason: "connection refused".to_string(),
            });
        }
        lock(&self.connections).push(address.clone());
        let service: Arc<dyn RelationshipService> = self.service(address);
        Ok(service)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
