use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while resolving a configuration source.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The source string has no `scheme:` prefix.
    #[error("configuration source has no scheme: {source_text:?}")]
    MissingScheme {
        /// The offending source, shortened for display.
        source_text: String,
    },

    /// No provider is registered for the scheme.
    #[error("unsupported configuration scheme: {scheme:?}")]
    UnsupportedScheme {
        /// The scheme as written by the caller.
        scheme: String,
    },

    /// A file provider could not read its file.
    #[error("cannot read {path:?}: {source}")]
    Io {
        /// The path that was read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// An env provider referenced a variable that is not set.
    #[error("environment variable {name:?} is not set")]
    EnvNotSet {
        /// Variable name.
        name: String,
    },

    /// A remote provider could not fetch the document.
    #[error("cannot fetch {uri}: {error}")]
    Fetch {
        /// The URI that was fetched.
        uri: String,
        /// Transport or status error.
        error: String,
    },

    /// The document is not valid YAML or its root is not a mapping.
    #[error("cannot parse configuration: {error}")]
    Parse {
        /// Parser message.
        error: String,
    },

    /// A converter rejected the document.
    #[error("cannot convert configuration: {error}")]
    Convert {
        /// Converter message.
        error: String,
    },
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::MissingScheme { .. } => "config_missing_scheme",
            ConfigError::UnsupportedScheme { .. } => "config_unsupported_scheme",
            ConfigError::Io { .. } => "config_io",
            ConfigError::EnvNotSet { .. } => "config_env_not_set",
            ConfigError::Fetch { .. } => "config_fetch",
            ConfigError::Parse { .. } => "config_parse",
            ConfigError::Convert { .. } => "config_convert",
        }
    }
}
