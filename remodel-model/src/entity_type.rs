use crate::error::{ModelError, ModelResult};
use crate::method::HttpMethod;
use crate::naming::derive_plural_name;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attribute used as the primary key when a type does not name one.
pub const DEFAULT_PRIMARY_KEY: &str = "id";

/// Describes a remote entity type owned by a single microservice.
///
/// This is the capability every relation type must satisfy: it knows its
/// plural name, where its REST endpoints live and which attribute holds the
/// primary key. Types are usually built once at startup and shared behind an
/// `Arc`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityType {
    /// Type name, e.g. `Shop`. Used to derive the plural name.
    pub name: String,
    /// Explicit plural name. Derived from `name` when absent.
    #[serde(default)]
    pub plural_name: Option<String>,
    /// Attribute holding the primary key.
    #[serde(default = "default_primary_key")]
    pub primary_key_attribute: String,
    /// Host (and optional path) of the owning service.
    #[serde(default)]
    pub base_uri: Option<String>,
    /// Use `https` for requests when the base URI carries no scheme.
    #[serde(default = "default_https")]
    pub https: bool,
    /// Endpoint overrides per HTTP method.
    #[serde(default)]
    pub endpoints: BTreeMap<HttpMethod, String>,
    /// Attributes whose values also key cached copies of an instance.
    #[serde(default)]
    pub attribute_cache_keys: Vec<String>,
}

fn default_primary_key() -> String {
    DEFAULT_PRIMARY_KEY.to_string()
}

fn default_https() -> bool {
    true
}

impl EntityType {
    /// Creates a type with conventional defaults and no base URI.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            plural_name: None,
            primary_key_attribute: default_primary_key(),
            base_uri: None,
            https: true,
            endpoints: BTreeMap::new(),
            attribute_cache_keys: Vec::new(),
        }
    }

    pub fn with_base_uri(mut self, base_uri: impl Into<String>) -> Self {
        self.base_uri = Some(base_uri.into());
        self
    }

    pub fn with_plural_name(mut self, plural_name: impl Into<String>) -> Self {
        self.plural_name = Some(plural_name.into());
        self
    }

    pub fn with_primary_key(mut self, attribute: impl Into<String>) -> Self {
        self.primary_key_attribute = attribute.into();
        self
    }

    pub fn with_https(mut self, https: bool) -> Self {
        self.https = https;
        self
    }

    /// Overrides the endpoint used for one HTTP method.
    pub fn with_endpoint(mut self, method: HttpMethod, endpoint: impl Into<String>) -> Self {
        self.endpoints.insert(method, endpoint.into());
        self
    }

    pub fn with_cache_keys<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attribute_cache_keys = attributes.into_iter().map(Into::into).collect();
        self
    }

    /// Returns the plural name, explicit or derived from the type name.
    pub fn plural_name(&self) -> String {
        match &self.plural_name {
            Some(plural) if !plural.is_empty() => plural.clone(),
            _ => derive_plural_name(&self.name),
        }
    }

    /// The "table" of the type. For a remote type this is the service name.
    pub fn table(&self) -> String {
        self.plural_name()
    }

    /// Returns the endpoint for a method, falling back to the plural name.
    pub fn endpoint(&self, method: HttpMethod) -> String {
        match self.endpoints.get(&method) {
            Some(endpoint) if !endpoint.is_empty() => endpoint.clone(),
            _ => self.plural_name(),
        }
    }

    /// Returns the scheme-qualified base URL of the owning service.
    pub fn base_url(&self) -> ModelResult<String> {
        let base = self
            .base_uri
            .as_deref()
            .map(str::trim)
            .filter(|uri| !uri.is_empty())
            .ok_or_else(|| ModelError::MissingBaseUri(self.name.clone()))?;

        let base = base.trim_end_matches('/');
        if base.contains("://") {
            return Ok(base.to_string());
        }

        let scheme = if self.https { "https" } else { "http" };
        Ok(format!("{scheme}://{base}"))
    }

    /// Builds the absolute URL for a method, with optional trailing path segments.
    ///
    /// Segments are percent-encoded by the caller.
    pub fn url(&self, method: HttpMethod, segments: &[&str]) -> ModelResult<String> {
        let mut url = format!(
            "{}/{}",
            self.base_url()?,
            self.endpoint(method).trim_matches('/')
        );
        for segment in segments {
            url.push('/');
            url.push_str(segment);
        }
        Ok(url)
    }

    /// Checks the type can take part in remote resolution.
    pub fn validate(&self) -> ModelResult<()> {
        let invalid = |reason: &str| ModelError::InvalidEntityType {
            name: self.name.clone(),
            reason: reason.to_string(),
        };

        if self.name.trim().is_empty() {
            return Err(invalid("type name is empty"));
        }
        if self.primary_key_attribute.trim().is_empty() {
            return Err(invalid("primary key attribute is empty"));
        }
        if self.plural_name().is_empty() {
            return Err(invalid("plural name is empty"));
        }
        self.base_url()?;
        Ok(())
    }
}
