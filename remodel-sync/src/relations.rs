use crate::error::{RemoteError, RemoteResult};
use remodel_model::{EntityType, ERRORS_ATTRIBUTE};
use std::collections::HashSet;
use std::sync::Arc;

/// The relation types declared for one resolution, validated once.
///
/// Every type must be a usable remote entity, and each one owns a distinct
/// attribute on the root model (its plural name), so concurrent merges never
/// write the same key.
#[derive(Debug, Clone, Default)]
pub struct RelationSet {
    types: Vec<Arc<EntityType>>,
}

impl RelationSet {
    pub fn new<I>(types: I) -> RemoteResult<Self>
    where
        I: IntoIterator<Item = Arc<EntityType>>,
    {
        let mut seen = HashSet::new();
        let mut validated = Vec::new();

        for ty in types {
            ty.validate().map_err(|e| {
                RemoteError::Resolution(format!(
                    "relation type {} is not a usable remote entity: {e}",
                    ty.name
                ))
            })?;

            let plural = ty.plural_name();
            if plural == ERRORS_ATTRIBUTE {
                return Err(RemoteError::Resolution(format!(
                    "relation type {} uses the reserved name {ERRORS_ATTRIBUTE}",
                    ty.name
                )));
            }
            if !seen.insert(plural.clone()) {
                return Err(RemoteError::Resolution(format!(
                    "relation type {plural} is declared more than once"
                )));
            }
            validated.push(ty);
        }

        Ok(Self { types: validated })
    }

    /// A set declaring no relations.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<EntityType>> {
        self.types.iter()
    }

    pub fn plural_names(&self) -> Vec<String> {
        self.types.iter().map(|ty| ty.plural_name()).collect()
    }
}
