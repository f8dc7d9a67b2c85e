//! # Configuration source URIs.
//!
//! A source is `scheme:rest`. The scheme follows RFC 3986 (`ALPHA *( ALPHA / DIGIT /
//! "+" / "-" / "." )`) and is compared case-insensitively; `rest` is opaque and
//! interpreted by the provider.

use std::fmt;

use super::ConfigError;

/// Longest prefix of a rejected source echoed back in errors.
const ECHO_LIMIT: usize = 32;

/// A parsed configuration source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSource {
    scheme: String,
    rest: String,
    raw: String,
}

impl ConfigSource {
    /// Splits `raw` into scheme and remainder.
    ///
    /// ## Example
    /// ```
    /// use collectorvisor::ConfigSource;
    ///
    /// let src = ConfigSource::parse("YAML:receivers: {}").unwrap();
    /// assert_eq!(src.scheme(), "yaml");
    /// assert_eq!(src.rest(), "receivers: {}");
    /// ```
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let Some((scheme, rest)) = raw.split_once(':') else {
            return Err(ConfigError::MissingScheme {
                source_text: echo(raw),
            });
        };
        if !is_scheme(scheme) {
            return Err(ConfigError::MissingScheme {
                source_text: echo(raw),
            });
        }
        Ok(Self {
            scheme: scheme.to_ascii_lowercase(),
            rest: rest.to_string(),
            raw: raw.to_string(),
        })
    }

    /// Lowercased scheme.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Everything after the first `:`.
    pub fn rest(&self) -> &str {
        &self.rest
    }

    /// The source exactly as given.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for ConfigSource {
    /// Shows the scheme only; literal sources can be large or carry secrets.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:…", self.scheme)
    }
}

fn is_scheme(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

fn echo(raw: &str) -> String {
    raw.chars().take(ECHO_LIMIT).collect()
}
