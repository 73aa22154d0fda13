use crate::entity_type::EntityType;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Attribute that collects failures of related-entity requests.
pub const ERRORS_ATTRIBUTE: &str = "errors";

/// One instance of a remote entity.
///
/// Attributes keep insertion order. Related instances attached with
/// [`add_relation`](Self::add_relation) are saved alongside this one; related
/// data resolved on fetch lands in list-valued attributes instead.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityModel {
    entity_type: Arc<EntityType>,
    attributes: Map<String, Value>,
    relations: Vec<EntityModel>,
}

impl EntityModel {
    /// Creates an empty instance of a type.
    pub fn new(entity_type: Arc<EntityType>) -> Self {
        Self {
            entity_type,
            attributes: Map::new(),
            relations: Vec::new(),
        }
    }

    /// Creates an instance filled from a raw attribute map.
    pub fn from_attributes(entity_type: Arc<EntityType>, attributes: Map<String, Value>) -> Self {
        let mut model = Self::new(entity_type);
        model.fill(attributes);
        model
    }

    pub fn entity_type(&self) -> &Arc<EntityType> {
        &self.entity_type
    }

    /// Sets every attribute in the map, overwriting existing values.
    pub fn fill(&mut self, attributes: Map<String, Value>) {
        for (key, value) in attributes {
            self.set_attribute(key, value);
        }
    }

    pub fn get_attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Whether the attribute is present and not null.
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.get(name).is_some_and(|v| !v.is_null())
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<Value> {
        self.attributes.shift_remove(name)
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    /// Returns the attribute map as a JSON object.
    pub fn to_json(&self) -> Value {
        Value::Object(self.attributes.clone())
    }

    /// Returns the primary key rendered as a string.
    ///
    /// Missing, null and empty-string values mean the instance has no
    /// identity yet.
    pub fn primary_key(&self) -> Option<String> {
        match self.attributes.get(&self.entity_type.primary_key_attribute)? {
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn set_primary_key(&mut self, value: impl Into<Value>) {
        let attribute = self.entity_type.primary_key_attribute.clone();
        self.attributes.insert(attribute, value.into());
    }

    pub fn relations(&self) -> &[EntityModel] {
        &self.relations
    }

    pub fn relations_mut(&mut self) -> &mut Vec<EntityModel> {
        &mut self.relations
    }

    pub fn set_relations(&mut self, relations: Vec<EntityModel>) {
        self.relations = relations;
    }

    pub fn add_relation(&mut self, relation: EntityModel) {
        self.relations.push(relation);
    }

    /// Entries collected under the `errors` attribute.
    pub fn errors(&self) -> &[Value] {
        self.list(ERRORS_ATTRIBUTE)
    }

    /// Returns a list-valued attribute, or an empty slice.
    pub fn list(&self, name: &str) -> &[Value] {
        match self.attributes.get(name) {
            Some(Value::Array(items)) => items,
            _ => &[],
        }
    }

    /// Appends values to a list-valued attribute, creating it when missing.
    ///
    /// A non-list value already stored under the name becomes the first element.
    pub fn append_to_list<I>(&mut self, name: &str, values: I)
    where
        I: IntoIterator<Item = Value>,
    {
        let slot = self
            .attributes
            .entry(name.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if !slot.is_array() {
            let existing = slot.take();
            *slot = Value::Array(if existing.is_null() { Vec::new() } else { vec![existing] });
        }
        if let Value::Array(items) = slot {
            items.extend(values);
        }
    }

    /// Merges related rows into a list-valued attribute.
    ///
    /// Rows are appended in the order given. A row whose `key_attribute`
    /// matches an entry already in the list replaces that entry in place, so
    /// repeated rows for the same related entity never duplicate.
    pub fn merge_related_rows<I>(&mut self, name: &str, key_attribute: &str, rows: I)
    where
        I: IntoIterator<Item = Value>,
    {
        for row in rows {
            let key = row.get(key_attribute).filter(|k| !k.is_null()).cloned();
            let existing = key.as_ref().and_then(|key| {
                self.list(name)
                    .iter()
                    .position(|item| item.get(key_attribute) == Some(key))
            });

            match existing {
                Some(index) => {
                    if let Some(Value::Array(items)) = self.attributes.get_mut(name) {
                        items[index] = row;
                    }
                }
                None => self.append_to_list(name, [row]),
            }
        }
    }

    /// Keys under which cached copies of this instance are stored.
    ///
    /// `{table}:{pk}` plus `{table}:{attribute}:{value}` for each declared
    /// cache-key attribute that has a value.
    pub fn cache_keys(&self) -> Vec<String> {
        let table = self.entity_type.table();
        let mut keys = Vec::new();

        if let Some(pk) = self.primary_key() {
            keys.push(format!("{table}:{pk}"));
        }

        for attribute in &self.entity_type.attribute_cache_keys {
            let value = match self.attributes.get(attribute) {
                Some(Value::String(s)) if !s.is_empty() => s.clone(),
                Some(Value::Number(n)) => n.to_string(),
                Some(Value::Bool(b)) => b.to_string(),
                _ => continue,
            };
            keys.push(format!("{table}:{attribute}:{value}"));
        }

        keys
    }
}

impl Serialize for EntityModel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.attributes.serialize(serializer)
    }
}
