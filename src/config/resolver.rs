//! # Resolver: provider dispatch, parsing and conversion.

use std::collections::HashMap;
use std::sync::Arc;

use figment::Figment;
use figment::providers::{Format, Yaml};
use serde_json::{Map, Value};

use super::{
    ConfigError, ConfigSource, Converter, EnvProvider, ExpandConverter, FileProvider, Provider,
    ResolvedConfig, YamlProvider,
};

/// Resolves configuration source URIs into [`ResolvedConfig`].
///
/// [`Resolver::default`] registers every built-in provider and the
/// [`ExpandConverter`]. [`Resolver::empty`] starts bare.
#[derive(Clone)]
pub struct Resolver {
    providers: HashMap<String, Arc<dyn Provider>>,
    converters: Vec<Arc<dyn Converter>>,
}

impl Resolver {
    /// A resolver without providers or converters.
    pub fn empty() -> Self {
        Self {
            providers: HashMap::new(),
            converters: Vec::new(),
        }
    }

    /// Registers a provider, replacing any previous one for the same scheme.
    pub fn with_provider(mut self, provider: Arc<dyn Provider>) -> Self {
        self.providers
            .insert(provider.scheme().to_ascii_lowercase(), provider);
        self
    }

    /// Appends a converter; converters run in registration order.
    pub fn with_converter(mut self, converter: Arc<dyn Converter>) -> Self {
        self.converters.push(converter);
        self
    }

    /// Sorted list of registered schemes.
    pub fn schemes(&self) -> Vec<String> {
        let mut schemes: Vec<String> = self.providers.keys().cloned().collect();
        schemes.sort_unstable();
        schemes
    }

    /// Fetches, parses and converts the document behind `raw`.
    pub async fn resolve(&self, raw: &str) -> Result<ResolvedConfig, ConfigError> {
        let source = ConfigSource::parse(raw)?;
        let provider =
            self.providers
                .get(source.scheme())
                .ok_or_else(|| ConfigError::UnsupportedScheme {
                    scheme: source.scheme().to_string(),
                })?;

        let text = provider.retrieve(&source).await?;
        let mut config = ResolvedConfig::new(source.scheme(), parse_yaml(&text)?);
        for converter in &self.converters {
            converter.convert(&mut config)?;
        }
        Ok(config)
    }
}

impl Default for Resolver {
    fn default() -> Self {
        let resolver = Self::empty()
            .with_provider(Arc::new(YamlProvider))
            .with_provider(Arc::new(FileProvider))
            .with_provider(Arc::new(EnvProvider::new()));

        #[cfg(feature = "http")]
        let resolver = resolver
            .with_provider(Arc::new(super::HttpProvider::http()))
            .with_provider(Arc::new(super::HttpProvider::https()));

        resolver.with_converter(Arc::new(ExpandConverter::new()))
    }
}

/// Parses a YAML document whose root must be a mapping.
///
/// A blank document is an empty mapping.
fn parse_yaml(text: &str) -> Result<Map<String, Value>, ConfigError> {
    if text.trim().is_empty() {
        return Ok(Map::new());
    }
    Figment::from(Yaml::string(text))
        .extract::<Map<String, Value>>()
        .map_err(|e| ConfigError::Parse {
            error: e.to_string(),
        })
}
