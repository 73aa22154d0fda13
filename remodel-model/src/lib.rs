//! Remote entity model for remodel.
//!
//! Defines the types every other remodel crate depends on:
//! - [`EntityModel`]: an ordered attribute bag for one instance of a remote entity
//! - [`EntityType`]: describes a remote entity type: naming, endpoints, primary key
//! - [`HttpMethod`]: the REST verbs an entity type can override endpoints for
//! - [`pluralize`] / [`derive_plural_name`]: naming conventions for services
//!
//! An entity type is owned by exactly one microservice. Instances are filled
//! from that service's REST responses and never persisted in-process.

mod entity;
mod entity_type;
mod error;
mod method;
mod naming;

pub use entity::{EntityModel, ERRORS_ATTRIBUTE};
pub use entity_type::{EntityType, DEFAULT_PRIMARY_KEY};
pub use error::{ModelError, ModelResult};
pub use method::HttpMethod;
pub use naming::{derive_plural_name, pluralize};
