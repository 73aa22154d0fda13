//! Relationship resolution engine.
//!
//! Fetches, saves and deletes an entity through its own service, together
//! with the related entities reachable through link-services.
//!
//! Each call walks `Idle → Dispatching → Settling → Merged | PartiallyFailed`.
//! Related requests fan out concurrently and are merged one at a time as they
//! settle, so merges into the same attribute never interleave.
//!
//! Failure policy differs per path:
//! - the root entity's own request failing is always a hard error
//! - related fetches and saves that fail are recorded under `errors`
//! - related deletes that fail make the whole delete fail
//!
//! The delete path is stricter than the other two.

use crate::cache::CacheInvalidator;
use crate::envelope;
use crate::error::{RelationFailure, RemoteError, RemoteResult};
use crate::events::{RelationshipChanged, RelationshipOp, SynchronizationEventBus};
use crate::fanout::{FanOut, Settled};
use crate::http::{HttpClient, RestRequest};
use crate::relations::RelationSet;
use remodel_links::LinkDirectory;
use remodel_model::{EntityModel, EntityType, HttpMethod, ERRORS_ATTRIBUTE};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where a resolution call stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionState {
    /// Nothing was dispatched.
    Idle,
    Dispatching,
    Settling,
    /// Every related request succeeded.
    Merged,
    /// At least one related request failed; see the `errors` attribute.
    PartiallyFailed,
}

impl fmt::Display for ResolutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResolutionState::Idle => "idle",
            ResolutionState::Dispatching => "dispatching",
            ResolutionState::Settling => "settling",
            ResolutionState::Merged => "merged",
            ResolutionState::PartiallyFailed => "partially-failed",
        };
        f.write_str(name)
    }
}

/// Resolves entities and their relations across services.
#[derive(Clone)]
pub struct RelationshipEngine {
    http: Arc<dyn HttpClient>,
    links: Arc<LinkDirectory>,
    cache: Arc<dyn CacheInvalidator>,
    events: Arc<SynchronizationEventBus>,
}

impl fmt::Debug for RelationshipEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelationshipEngine")
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

impl RelationshipEngine {
    pub fn new(
        http: Arc<dyn HttpClient>,
        links: Arc<LinkDirectory>,
        cache: Arc<dyn CacheInvalidator>,
        events: Arc<SynchronizationEventBus>,
    ) -> Self {
        Self {
            http,
            links,
            cache,
            events,
        }
    }

    pub fn events(&self) -> &Arc<SynchronizationEventBus> {
        &self.events
    }

    pub fn links(&self) -> &Arc<LinkDirectory> {
        &self.links
    }

    /// Starts a query for `entity_type` with no relations declared.
    pub fn query(&self, entity_type: Arc<EntityType>) -> Query<'_> {
        Query {
            engine: self,
            entity_type,
            relations: RelationSet::none(),
        }
    }

    // ── Fetch ────────────────────────────────────────────────────

    /// Fetches one entity by primary key.
    ///
    /// Returns `None` when the response carries no rows for the type.
    pub async fn fetch_one(
        &self,
        entity_type: &Arc<EntityType>,
        primary_key: &str,
        relations: &RelationSet,
    ) -> RemoteResult<Option<EntityModel>> {
        let url = entity_type.url(HttpMethod::Get, &[encode(primary_key).as_str()])?;
        let mut rows = self.fetch_rows(entity_type, url, relations).await?;
        if rows.is_empty() {
            return Ok(None);
        }
        Ok(Some(rows.swap_remove(0)))
    }

    /// Fetches every entity of a type.
    pub async fn fetch_all(
        &self,
        entity_type: &Arc<EntityType>,
        relations: &RelationSet,
    ) -> RemoteResult<Vec<EntityModel>> {
        let url = entity_type.url(HttpMethod::Get, &[])?;
        self.fetch_rows(entity_type, url, relations).await
    }

    /// Fetches the entities whose `key` attribute equals `value`.
    pub async fn fetch_where(
        &self,
        entity_type: &Arc<EntityType>,
        key: &str,
        value: &str,
        relations: &RelationSet,
    ) -> RemoteResult<Vec<EntityModel>> {
        let url = entity_type.url(HttpMethod::Get, &[encode(key).as_str(), encode(value).as_str()])?;
        self.fetch_rows(entity_type, url, relations).await
    }

    async fn fetch_rows(
        &self,
        entity_type: &Arc<EntityType>,
        url: String,
        relations: &RelationSet,
    ) -> RemoteResult<Vec<EntityModel>> {
        let response = self.http.send(RestRequest::get(url)).await?;
        let rows = envelope::rows(&response.body, &entity_type.plural_name());

        let mut instances = Vec::with_capacity(rows.len());
        for row in rows {
            let mut instance = EntityModel::from_attributes(entity_type.clone(), row);
            if !relations.is_empty() {
                self.resolve_relations(&mut instance, relations).await;
            }
            instances.push(instance);
        }
        Ok(instances)
    }

    /// Loads the related entities of `instance` for each declared type.
    ///
    /// Rows are merged under the related type's plural name in settle order,
    /// replacing any value the root row carried under that name.
    /// Failures are appended to `errors`; a type with no links adds nothing.
    pub async fn resolve_relations(
        &self,
        instance: &mut EntityModel,
        relations: &RelationSet,
    ) -> ResolutionState {
        if relations.is_empty() {
            return ResolutionState::Idle;
        }
        let Some(left_id) = instance.primary_key() else {
            warn!(
                entity = %instance.entity_type().name,
                "Cannot resolve relations for an entity without a primary key"
            );
            return ResolutionState::Idle;
        };
        let left_plural = instance.entity_type().plural_name();
        debug!(entity = %left_plural, id = %left_id, state = %ResolutionState::Dispatching, "Resolving relations");

        let mut failures: Vec<RelationFailure> = Vec::new();
        let mut fan_out = FanOut::new();

        for related_type in relations.iter() {
            let related_plural = related_type.plural_name();
            let ids = match self.linked_ids(&left_plural, &related_plural, &left_id).await {
                Ok(ids) => ids,
                Err(e) => {
                    warn!(relation = %related_plural, "Failed to list links: {e}");
                    failures.push(RelationFailure::new(related_plural, None, &e));
                    continue;
                }
            };

            for id in ids {
                let key = (related_type.clone(), id.clone());
                fan_out.submit(key, get_related(self.http.clone(), related_type.clone(), id));
            }
        }

        debug!(entity = %left_plural, requests = fan_out.submitted(), state = %ResolutionState::Settling, "Waiting for related fetches");
        // Whatever the root row held under a bucket is replaced by the rows
        // resolved in this cycle.
        let mut refreshed: HashSet<String> = HashSet::new();
        while let Some(Settled { key, result }) = fan_out.next_settled().await {
            let (related_type, id) = key;
            let related_plural = related_type.plural_name();
            match result {
                Ok(body) => {
                    let Some((bucket, rows)) = envelope::rows_or_first(&body, &related_plural) else {
                        debug!(relation = %related_plural, %id, "Related entity returned no rows");
                        continue;
                    };
                    if refreshed.insert(bucket.clone()) {
                        instance.remove_attribute(&bucket);
                    }
                    instance.merge_related_rows(
                        &bucket,
                        &related_type.primary_key_attribute,
                        rows.into_iter().map(Value::Object),
                    );
                }
                Err(e) => {
                    warn!(relation = %related_plural, %id, "Related fetch failed: {e}");
                    failures.push(RelationFailure::new(related_plural, Some(id), &e));
                }
            }
        }

        self.finish(instance, failures, &left_plural)
    }

    async fn linked_ids(
        &self,
        left_plural: &str,
        right_plural: &str,
        left_id: &str,
    ) -> RemoteResult<Vec<String>> {
        let gateway = self.links.gateway(left_plural, right_plural)?;
        Ok(gateway.linked_right_ids(left_id).await?)
    }

    fn finish(
        &self,
        model: &mut EntityModel,
        failures: Vec<RelationFailure>,
        plural: &str,
    ) -> ResolutionState {
        let state = if failures.is_empty() {
            ResolutionState::Merged
        } else {
            ResolutionState::PartiallyFailed
        };
        let failed = failures.len();
        for failure in failures {
            model.append_to_list(ERRORS_ATTRIBUTE, failure.into_entries());
        }
        debug!(entity = %plural, failed, %state, "Relations settled");
        state
    }

    // ── Save ─────────────────────────────────────────────────────

    /// Creates or updates `model`, then saves its attached relations.
    ///
    /// A model with a primary key is updated with `PUT {endpoint}/{id}`;
    /// otherwise it is created with `POST {endpoint}`. On success the model
    /// is filled from the response. A transport failure is returned before
    /// anything else happens.
    pub async fn save(&self, model: &mut EntityModel) -> RemoteResult<()> {
        let request = save_request(model)?;
        let plural = model.entity_type().plural_name();
        info!(entity = %plural, method = %request.method, "Saving entity");

        let response = self.http.send(request).await?;
        let Some(row) = envelope::rows(&response.body, &plural).into_iter().next() else {
            warn!(entity = %plural, "Save response carried no rows; relations not saved");
            return Ok(());
        };
        model.fill(row);

        self.save_relations(model).await;
        self.cache.invalidate(model);
        Ok(())
    }

    /// Saves every relation attached to `model` concurrently.
    ///
    /// Each saved child is filled from its response, appended under the
    /// response's collection name on the parent, dropped from the cache and
    /// announced with a `RelationshipChanged` event. Failed children are
    /// recorded under `errors` and announce nothing.
    pub async fn save_relations(&self, model: &mut EntityModel) -> ResolutionState {
        let children = model.relations().to_vec();
        if children.is_empty() {
            return ResolutionState::Idle;
        }
        let parent_plural = model.entity_type().plural_name();
        debug!(entity = %parent_plural, children = children.len(), state = %ResolutionState::Dispatching, "Saving relations");

        let mut failures: Vec<RelationFailure> = Vec::new();
        let mut fan_out = FanOut::new();

        for (index, child) in children.iter().enumerate() {
            let op = if child.primary_key().is_some() {
                RelationshipOp::Updated
            } else {
                RelationshipOp::Created
            };
            match save_request(child) {
                Ok(request) => {
                    let http = self.http.clone();
                    fan_out.submit((index, op), async move {
                        http.send(request)
                            .await
                            .map(|response| response.body)
                            .map_err(RemoteError::from)
                    });
                }
                Err(e) => failures.push(RelationFailure::new(
                    child.entity_type().plural_name(),
                    child.primary_key(),
                    &e,
                )),
            }
        }

        debug!(entity = %parent_plural, state = %ResolutionState::Settling, "Waiting for related saves");
        while let Some(Settled { key, result }) = fan_out.next_settled().await {
            let (index, op) = key;
            let child_type = children[index].entity_type().clone();
            let child_plural = child_type.plural_name();

            let body = match result {
                Ok(body) => body,
                Err(e) => {
                    warn!(relation = %child_plural, "Related save failed: {e}");
                    failures.push(RelationFailure::new(child_plural, children[index].primary_key(), &e));
                    continue;
                }
            };

            let Some((bucket, rows)) = envelope::rows_or_first(&body, &child_plural) else {
                warn!(relation = %child_plural, "Related save response carried no rows");
                continue;
            };
            let Some(row) = rows.into_iter().next() else {
                continue;
            };

            let saved = {
                let child = &mut model.relations_mut()[index];
                child.fill(row.clone());
                child.clone()
            };
            model.merge_related_rows(&bucket, &child_type.primary_key_attribute, [Value::Object(row)]);
            self.cache.invalidate(&saved);
            self.publish(RelationshipChanged::new(model.clone(), saved, op)).await;
        }

        self.finish(model, failures, &parent_plural)
    }

    // ── Delete ───────────────────────────────────────────────────

    /// Deletes an entity by primary key, then every entity linked to it
    /// through the declared relations.
    ///
    /// If the entity's own delete fails its relations are left untouched.
    pub async fn delete(
        &self,
        entity_type: &Arc<EntityType>,
        primary_key: &str,
        relations: &RelationSet,
    ) -> RemoteResult<()> {
        let mut model = EntityModel::new(entity_type.clone());
        model.set_primary_key(primary_key);

        let url = entity_type.url(HttpMethod::Delete, &[encode(primary_key).as_str()])?;
        info!(entity = %entity_type.plural_name(), id = %primary_key, "Deleting entity");
        self.http.send(RestRequest::delete(url)).await?;

        let outcome = self.delete_relations(&model, relations).await;
        self.cache.invalidate(&model);
        outcome.map(|_| ())
    }

    /// Deletes every entity linked to `model` through the declared relations.
    ///
    /// Returns `Ok(false)` without any remote call when no relations are
    /// declared. Link listing failures and failed deletes are hard errors;
    /// the remaining deletes still run to completion first.
    pub async fn delete_relations(
        &self,
        model: &EntityModel,
        relations: &RelationSet,
    ) -> RemoteResult<bool> {
        if relations.is_empty() {
            return Ok(false);
        }
        let left_id = model.primary_key().ok_or_else(|| {
            RemoteError::Resolution(format!(
                "cannot delete relations of {} without a primary key",
                model.entity_type().name
            ))
        })?;
        let left_plural = model.entity_type().plural_name();

        let mut fan_out = FanOut::new();
        for related_type in relations.iter() {
            let ids = self
                .linked_ids(&left_plural, &related_type.plural_name(), &left_id)
                .await?;

            for id in ids {
                let url = related_type.url(HttpMethod::Delete, &[encode(&id).as_str()])?;
                let mut related = EntityModel::new(related_type.clone());
                related.set_primary_key(id);

                let http = self.http.clone();
                fan_out.submit(related, async move {
                    http.send(RestRequest::delete(url))
                        .await
                        .map(|_| ())
                        .map_err(RemoteError::from)
                });
            }
        }

        debug!(entity = %left_plural, id = %left_id, requests = fan_out.submitted(), "Deleting related entities");
        let mut failures = Vec::new();
        while let Some(Settled { key: related, result }) = fan_out.next_settled().await {
            match result {
                Ok(()) => {
                    self.cache.invalidate(&related);
                    self.publish(RelationshipChanged::new(
                        model.clone(),
                        related,
                        RelationshipOp::Deleted,
                    ))
                    .await;
                }
                Err(e) => {
                    warn!(relation = %related.entity_type().plural_name(), "Related delete failed: {e}");
                    failures.push(RelationFailure::new(
                        related.entity_type().plural_name(),
                        related.primary_key(),
                        &e,
                    ));
                }
            }
        }

        if !failures.is_empty() {
            return Err(RemoteError::RelationDelete { failures });
        }
        Ok(true)
    }

    async fn publish(&self, event: RelationshipChanged) {
        let report = self.events.publish(event).await;
        if !report.is_clean() {
            warn!(failed = report.failures.len(), "Relationship change not fully synchronized");
        }
    }
}

/// A root entity type bound to its declared relations.
pub struct Query<'e> {
    engine: &'e RelationshipEngine,
    entity_type: Arc<EntityType>,
    relations: RelationSet,
}

impl<'e> Query<'e> {
    /// Declares the relation types to resolve alongside the root entity.
    pub fn with<I>(mut self, relations: I) -> RemoteResult<Self>
    where
        I: IntoIterator<Item = Arc<EntityType>>,
    {
        self.relations = RelationSet::new(relations)?;
        Ok(self)
    }

    pub fn entity_type(&self) -> &Arc<EntityType> {
        &self.entity_type
    }

    pub fn relations(&self) -> &RelationSet {
        &self.relations
    }

    pub async fn fetch_one(&self, primary_key: &str) -> RemoteResult<Option<EntityModel>> {
        self.engine
            .fetch_one(&self.entity_type, primary_key, &self.relations)
            .await
    }

    pub async fn fetch_all(&self) -> RemoteResult<Vec<EntityModel>> {
        self.engine.fetch_all(&self.entity_type, &self.relations).await
    }

    pub async fn fetch_where(&self, key: &str, value: &str) -> RemoteResult<Vec<EntityModel>> {
        self.engine
            .fetch_where(&self.entity_type, key, value, &self.relations)
            .await
    }

    pub async fn delete(&self, primary_key: &str) -> RemoteResult<()> {
        self.engine
            .delete(&self.entity_type, primary_key, &self.relations)
            .await
    }

    /// Deletes the related entities of an already-deleted model.
    pub async fn delete_relations(&self, model: &EntityModel) -> RemoteResult<bool> {
        self.engine.delete_relations(model, &self.relations).await
    }
}

fn save_request(model: &EntityModel) -> RemoteResult<RestRequest> {
    let ty = model.entity_type();
    let request = match model.primary_key() {
        Some(pk) => RestRequest::put(ty.url(HttpMethod::Put, &[encode(&pk).as_str()])?, model.to_json()),
        None => RestRequest::post(ty.url(HttpMethod::Post, &[])?, model.to_json()),
    };
    Ok(request)
}

async fn get_related(
    http: Arc<dyn HttpClient>,
    related_type: Arc<EntityType>,
    id: String,
) -> RemoteResult<Value> {
    let url = related_type.url(HttpMethod::Get, &[encode(&id).as_str()])?;
    let response = http.send(RestRequest::get(url)).await?;
    Ok(response.body)
}

fn encode(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}
