//! # Resolved configuration document.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::ConfigError;

/// A parsed, converted configuration mapping handed to the service factory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedConfig {
    scheme: String,
    root: Map<String, Value>,
}

impl ResolvedConfig {
    /// Wraps an already parsed mapping.
    pub fn new(scheme: impl Into<String>, root: Map<String, Value>) -> Self {
        Self {
            scheme: scheme.into(),
            root,
        }
    }

    /// Scheme of the source this document came from.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Top-level mapping.
    pub fn root(&self) -> &Map<String, Value> {
        &self.root
    }

    pub(crate) fn root_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.root
    }

    /// True when the document has no keys.
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Looks up a dotted path, e.g. `service.pipelines.traces`.
    ///
    /// ## Example
    /// ```
    /// use collectorvisor::ResolvedConfig;
    /// use serde_json::json;
    ///
    /// let root = json!({"service": {"pipelines": {"traces": {}}}});
    /// let cfg = ResolvedConfig::new("yaml", root.as_object().unwrap().clone());
    /// assert!(cfg.get("service.pipelines.traces").is_some());
    /// assert!(cfg.get("service.extensions").is_none());
    /// ```
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let first = parts.next()?;
        let mut cur = self.root.get(first)?;
        for part in parts {
            cur = cur.as_object()?.get(part)?;
        }
        Some(cur)
    }

    /// Deserializes the whole document into `T`.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, ConfigError> {
        serde_json::from_value(Value::Object(self.root.clone())).map_err(|e| ConfigError::Parse {
            error: e.to_string(),
        })
    }

    /// Consumes the wrapper and returns the mapping.
    pub fn into_inner(self) -> Map<String, Value> {
        self.root
    }
}
