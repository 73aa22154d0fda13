//! Link-service address resolution.
//!
//! The link-service for a pair of entity types is found by convention at
//! `{left-plural}-{right-plural}:{port}`. Two environment variables adjust it:
//!
//! - `REMOTE_MODEL_{LEFT}_{RIGHT}_DNS` replaces the host
//! - `REMOTE_MODEL_GRPC_PORT` replaces the port (default 50051)
//!
//! Resolution never fails; anything unusable falls back to the convention.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Port the link-services listen on unless overridden.
pub const DEFAULT_GRPC_PORT: u16 = 50051;

/// A resolved link-service address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedAddress {
    pub host: String,
    pub port: u16,
}

impl fmt::Display for ResolvedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Configuration for address resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Prefix of every environment variable consulted.
    pub env_prefix: String,
    /// Port used when no port override is set.
    pub default_port: u16,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            env_prefix: "REMOTE_MODEL".to_string(),
            default_port: DEFAULT_GRPC_PORT,
        }
    }
}

/// Source of environment values.
pub trait EnvLookup: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvLookup for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvLookup for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

/// Derives link-service addresses from entity plural names.
#[derive(Clone)]
pub struct AddressResolver {
    config: ResolverConfig,
    env: Arc<dyn EnvLookup>,
}

impl fmt::Debug for AddressResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AddressResolver")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for AddressResolver {
    fn default() -> Self {
        Self::from_env()
    }
}

impl AddressResolver {
    /// Creates a resolver reading the process environment.
    pub fn from_env() -> Self {
        Self::with_config(ResolverConfig::default())
    }

    pub fn with_config(config: ResolverConfig) -> Self {
        Self {
            config,
            env: Arc::new(ProcessEnv),
        }
    }

    /// Creates a resolver reading overrides from a custom source.
    pub fn with_lookup(config: ResolverConfig, env: impl EnvLookup + 'static) -> Self {
        Self {
            config,
            env: Arc::new(env),
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Name of the variable that overrides the host for a pair of types.
    pub fn host_override_key(&self, left_plural: &str, right_plural: &str) -> String {
        format!(
            "{}_{}_{}_DNS",
            self.config.env_prefix,
            env_segment(left_plural),
            env_segment(right_plural)
        )
    }

    /// Name of the variable that overrides the port.
    pub fn port_override_key(&self) -> String {
        format!("{}_GRPC_PORT", self.config.env_prefix)
    }

    /// Resolves the link-service address for `(left, right)`.
    pub fn resolve(&self, left_plural: &str, right_plural: &str) -> ResolvedAddress {
        let key = self.host_override_key(left_plural, right_plural);
        let host = match self.lookup(&key) {
            Some(host) => {
                debug!(%key, %host, "Using link-service host override");
                host
            }
            None => format!(
                "{}-{}",
                left_plural.to_lowercase(),
                right_plural.to_lowercase()
            ),
        };

        ResolvedAddress {
            host,
            port: self.port(),
        }
    }

    fn port(&self) -> u16 {
        let key = self.port_override_key();
        match self.lookup(&key) {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warn!(%key, value = %raw, "Ignoring unparseable link-service port");
                self.config.default_port
            }),
            None => self.config.default_port,
        }
    }

    fn lookup(&self, key: &str) -> Option<String> {
        self.env
            .get(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

fn env_segment(plural: &str) -> String {
    plural
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}
