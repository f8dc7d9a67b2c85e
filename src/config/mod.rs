//! # Configuration resolution.
//!
//! Turns a configuration source URI into a [`ResolvedConfig`] the service factory
//! can consume.
//!
//! ## Architecture
//! ```text
//! "scheme:rest" ──► ConfigSource::parse
//!                        │
//!                        ▼
//!               Provider (by scheme) ──► YAML text
//!                 yaml: | file: | env: | http: | https:
//!                        │
//!                        ▼
//!               figment YAML format ──► mapping (serde_json)
//!                        │
//!                        ▼
//!               Converter chain (ExpandConverter: ${env:NAME}, ${NAME}, $NAME)
//!                        │
//!                        ▼
//!                  ResolvedConfig
//! ```
//!
//! ## Rules
//! - A source without a recognised scheme is rejected, never guessed.
//! - The document root must be a mapping.
//! - Converters rewrite values only, never keys.

mod converter;
mod error;
mod provider;
mod resolved;
mod resolver;
mod source;

pub use converter::{Converter, EnvLookup, ExpandConverter};
pub use error::ConfigError;
#[cfg(feature = "http")]
pub use provider::HttpProvider;
pub use provider::{EnvProvider, FileProvider, Provider, YamlProvider};
pub use resolved::ResolvedConfig;
pub use resolver::Resolver;
pub use source::ConfigSource;
