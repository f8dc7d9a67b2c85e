//! # Configuration providers.
//!
//! A [`Provider`] fetches the raw YAML text for one URI scheme. Parsing and
//! conversion happen afterwards in the [`Resolver`](super::Resolver), so providers
//! stay dumb transports.
//!
//! | scheme            | provider          | `rest` means                     |
//! |-------------------|-------------------|----------------------------------|
//! | `yaml`            | [`YamlProvider`]  | literal YAML text                |
//! | `file`            | [`FileProvider`]  | filesystem path                  |
//! | `env`             | [`EnvProvider`]   | name of a variable holding YAML  |
//! | `http` / `https`  | `HttpProvider`    | the whole URI is fetched         |

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use super::{ConfigError, ConfigSource, EnvLookup};

/// Fetches configuration text for a single scheme.
#[async_trait]
pub trait Provider: Send + Sync + 'static {
    /// Lowercase scheme this provider answers to.
    fn scheme(&self) -> &str;

    /// Returns the YAML text behind `source`.
    async fn retrieve(&self, source: &ConfigSource) -> Result<String, ConfigError>;
}

/// `yaml:<text>`: the source carries the document itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct YamlProvider;

#[async_trait]
impl Provider for YamlProvider {
    fn scheme(&self) -> &str {
        "yaml"
    }

    async fn retrieve(&self, source: &ConfigSource) -> Result<String, ConfigError> {
        Ok(source.rest().to_string())
    }
}

/// `file:<path>`: reads the document from disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileProvider;

#[async_trait]
impl Provider for FileProvider {
    fn scheme(&self) -> &str {
        "file"
    }

    async fn retrieve(&self, source: &ConfigSource) -> Result<String, ConfigError> {
        let path = PathBuf::from(source.rest());
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(text),
            Err(source) => Err(ConfigError::Io { path, source }),
        }
    }
}

/// `env:<NAME>`: reads the document from an environment variable.
#[derive(Clone)]
pub struct EnvProvider {
    lookup: EnvLookup,
}

impl EnvProvider {
    /// Reads from the process environment.
    pub fn new() -> Self {
        Self::with_lookup(Arc::new(|name: &str| std::env::var(name).ok()))
    }

    /// Reads through a custom lookup (tests, sandboxed embedders).
    pub fn with_lookup(lookup: EnvLookup) -> Self {
        Self { lookup }
    }
}

impl Default for EnvProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for EnvProvider {
    fn scheme(&self) -> &str {
        "env"
    }

    async fn retrieve(&self, source: &ConfigSource) -> Result<String, ConfigError> {
        let name = source.rest();
        (self.lookup)(name).ok_or_else(|| ConfigError::EnvNotSet {
            name: name.to_string(),
        })
    }
}

/// `http:` / `https:`: fetches the document with a GET request.
#[cfg(feature = "http")]
#[derive(Clone)]
pub struct HttpProvider {
    scheme: &'static str,
    client: reqwest::Client,
}

#[cfg(feature = "http")]
impl HttpProvider {
    /// Provider for plain `http:` sources.
    pub fn http() -> Self {
        Self {
            scheme: "http",
            client: reqwest::Client::new(),
        }
    }

    /// Provider for `https:` sources.
    pub fn https() -> Self {
        Self {
            scheme: "https",
            client: reqwest::Client::new(),
        }
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl Provider for HttpProvider {
    fn scheme(&self) -> &str {
        self.scheme
    }

    async fn retrieve(&self, source: &ConfigSource) -> Result<String, ConfigError> {
        let uri = source.as_str();
        let fetch_err = |e: reqwest::Error| ConfigError::Fetch {
            uri: uri.to_string(),
            error: e.to_string(),
        };
        let resp = self
            .client
            .get(uri)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(fetch_err)?;
        resp.text().await.map_err(fetch_err)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    #[tokio::test]
    async fn test_yaml_provider_returns_rest() {
        let src = ConfigSource::parse("yaml:a: 1").unwrap();
        assert_eq!(YamlProvider.retrieve(&src).await.unwrap(), "a: 1");
    }

    #[tokio::test]
    async fn test_file_provider_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "receivers: {{}}").unwrap();
        let src = ConfigSource::parse(&format!("file:{}", file.path().display())).unwrap();

        let text = FileProvider.retrieve(&src).await.unwrap();
        assert_eq!(text.trim(), "receivers: {}");
    }

    #[tokio::test]
    async fn test_file_provider_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.yaml");
        let src = ConfigSource::parse(&format!("file:{}", missing.display())).unwrap();

        let err = FileProvider.retrieve(&src).await.unwrap_err();
        assert_eq!(err.as_label(), "config_io");
    }

    #[tokio::test]
    async fn test_env_provider_uses_lookup() {
        let vars: HashMap<String, String> =
            HashMap::from([("COLLECTOR_CONF".to_string(), "a: 1".to_string())]);
        let provider = EnvProvider::with_lookup(Arc::new(move |n: &str| vars.get(n).cloned()));

        let ok = ConfigSource::parse("env:COLLECTOR_CONF").unwrap();
        assert_eq!(provider.retrieve(&ok).await.unwrap(), "a: 1");

        let missing = ConfigSource::parse("env:NOPE").unwrap();
        assert!(matches!(
            provider.retrieve(&missing).await,
            Err(ConfigError::EnvNotSet { name }) if name == "NOPE"
        ));
    }
}
