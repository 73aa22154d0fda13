//! Relationship link-service access for remodel.
//!
//! Entities owned by different microservices are related through a separate
//! link-service per `(left type, right type)` pair. The link-service stores
//! nothing but `(left id, right id)` pairs and speaks a four-method RPC
//! contract:
//!
//! - `CreateRelationship(left, right)`
//! - `GetRelations(left)`: a server stream of links
//! - `UpdateRelationship(current, replacement)`
//! - `DeleteRelationship(left, right)`
//!
//! # Components
//!
//! - **Address**: derives the link-service address for a pair of plural type
//!   names (`shops-addresses:50051`), honouring environment overrides
//! - **Contract**: the [`RelationshipService`] trait a wire client implements
//! - **Gateway**: [`RelationshipGateway`] binds one resolved address to a service
//! - **Memory**: an in-process link-service for tests and embedding
//!
//! # Example
//!
//! ```
//! use remodel_links::{AddressResolver, ResolverConfig};
//! use std::collections::HashMap;
//!
//! let resolver = AddressResolver::with_lookup(ResolverConfig::default(), HashMap::new());
//! let address = resolver.resolve("shops", "addresses");
//! assert_eq!(address.to_string(), "shops-addresses:50051");
//! ```

mod address;
mod contract;
pub mod deadline;
mod error;
mod gateway;
pub mod memory;

pub use address::{
    AddressResolver, EnvLookup, ProcessEnv, ResolvedAddress, ResolverConfig, DEFAULT_GRPC_PORT,
};
pub use contract::{LinkStream, RelationLink, RelationshipService, UpdateLinkRequest};
pub use deadline::{timeout_value, TimeUnit};
pub use error::{LinkError, LinkResult};
pub use gateway::{GatewayConfig, LinkConnector, LinkDirectory, RelationshipGateway};
pub use memory::{InMemoryConnector, InMemoryLinkService};
