//! # Configuration converters.
//!
//! A [`Converter`] rewrites the parsed document before it reaches the factory.
//! [`ExpandConverter`] substitutes environment references inside string values:
//!
//! | form          | result                               |
//! |---------------|--------------------------------------|
//! | `${env:NAME}` | value of `NAME` (unset → empty)      |
//! | `${NAME}`     | value of `NAME` (unset → empty)      |
//! | `$NAME`       | value of `NAME` (unset → empty)      |
//! | `$$`          | literal `$`                          |
//!
//! Any other `${scheme:...}` reference and unterminated `${` are errors.

use std::sync::Arc;

use serde_json::Value;

use super::{ConfigError, ResolvedConfig};

/// Environment lookup used by converters and the env provider.
pub type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Rewrites a resolved document in place.
pub trait Converter: Send + Sync + 'static {
    /// Applies the conversion.
    fn convert(&self, config: &mut ResolvedConfig) -> Result<(), ConfigError>;
}

/// Expands environment references in string values.
#[derive(Clone)]
pub struct ExpandConverter {
    lookup: EnvLookup,
}

impl ExpandConverter {
    /// Expands from the process environment.
    pub fn new() -> Self {
        Self::with_lookup(Arc::new(|name: &str| std::env::var(name).ok()))
    }

    /// Expands through a custom lookup.
    pub fn with_lookup(lookup: EnvLookup) -> Self {
        Self { lookup }
    }

    fn expand_value(&self, value: &mut Value) -> Result<(), ConfigError> {
        match value {
            Value::String(s) => {
                if s.contains('$') {
                    *s = self.expand_str(s)?;
                }
                Ok(())
            }
            Value::Array(items) => items.iter_mut().try_for_each(|v| self.expand_value(v)),
            Value::Object(map) => map.values_mut().try_for_each(|v| self.expand_value(v)),
            _ => Ok(()),
        }
    }

    fn expand_str(&self, s: &str) -> Result<String, ConfigError> {
        let mut out = String::with_capacity(s.len());
        let mut rest = s;

        while let Some(pos) = rest.find('$') {
            out.push_str(&rest[..pos]);
            let after = &rest[pos + 1..];

            if let Some(tail) = after.strip_prefix('$') {
                out.push('$');
                rest = tail;
                continue;
            }

            if let Some(inner) = after.strip_prefix('{') {
                let Some(end) = inner.find('}') else {
                    return Err(ConfigError::Convert {
                        error: format!("unterminated reference in {s:?}"),
                    });
                };
                let name = reference_name(&inner[..end])?;
                out.push_str(&self.lookup(name));
                rest = &inner[end + 1..];
                continue;
            }

            let len = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(after.len());
            if len == 0 {
                out.push('$');
            } else {
                out.push_str(&self.lookup(&after[..len]));
            }
            rest = &after[len..];
        }

        out.push_str(rest);
        Ok(out)
    }

    fn lookup(&self, name: &str) -> String {
        (self.lookup)(name).unwrap_or_default()
    }
}

impl Default for ExpandConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl Converter for ExpandConverter {
    fn convert(&self, config: &mut ResolvedConfig) -> Result<(), ConfigError> {
        config
            .root_mut()
            .values_mut()
            .try_for_each(|v| self.expand_value(v))
    }
}

/// Extracts the variable name from the inside of `${...}`.
fn reference_name(inner: &str) -> Result<&str, ConfigError> {
    let name = match inner.split_once(':') {
        Some(("env", name)) => name,
        Some((scheme, _)) => {
            return Err(ConfigError::Convert {
                error: format!("unsupported reference scheme {scheme:?}"),
            });
        }
        None => inner,
    };
    if name.is_empty() {
        return Err(ConfigError::Convert {
            error: "empty reference".to_string(),
        });
    }
    Ok(name)
}
