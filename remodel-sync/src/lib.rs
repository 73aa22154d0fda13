//! Relationship resolution and synchronization for remote entities.
//!
//! An entity lives in its own REST service. Which entities relate to which is
//! recorded separately, by one link-service per pair of entity types. This
//! crate stitches the two together:
//!
//! - [`RelationshipEngine`] fetches, saves and deletes an entity together with
//!   its related entities, fanning related requests out concurrently
//! - [`SynchronizationEventBus`] announces every relationship change after it
//!   settles
//! - [`LinkSynchronizer`] subscribes to those announcements and mirrors them
//!   into the link-services
//!
//! ```ignore
//! let links = Arc::new(LinkDirectory::new(AddressResolver::from_env(), connector));
//! let events = Arc::new(SynchronizationEventBus::new());
//! events.subscribe(Arc::new(LinkSynchronizer::new(links.clone())));
//!
//! let engine = RelationshipEngine::new(http, links, Arc::new(NoopCache), events);
//! let shop = engine.query(shop_type).with([address_type])?.fetch_one("42").await?;
//! ```

mod cache;
mod engine;
pub mod envelope;
mod error;
mod events;
pub mod fanout;
mod http;
mod relations;
mod synchronizer;

pub use cache::{CacheInvalidator, InMemoryCache, NoopCache};
pub use engine::{Query, RelationshipEngine, ResolutionState};
pub use error::{RelationFailure, RemoteError, RemoteResult, TransportError};
pub use events::{
    PublishReport, RelationshipChanged, RelationshipOp, RelationshipSubscriber,
    SynchronizationEventBus,
};
pub use fanout::{FanOut, Settled, SettledBatch};
pub use http::{HttpClient, HttpConfig, ReqwestHttpClient, RestRequest, RestResponse};
pub use relations::RelationSet;
pub use synchronizer::LinkSynchronizer;
