pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;

pub use crate::config::{ConfigLoader, DEFAULT_ENVIRONMENT_NAME, ENVIRONMENT_PROPERTY};
pub use crate::core::{
    merge::merge,
    provider::ResolvedConfig,
    resolver::{resolve, MissingPolicy, Resolution, Resolver, ResolverOptions, MAX_RESOLVE_DEPTH},
};
pub use crate::domain::model::{mapping_from, PropertyMapping, PropertyValue, SourceLayer};
pub use crate::domain::ports::{ConfigProvider, PropertySource};
pub use crate::utils::error::{PropsError, ResolveError, Result};
