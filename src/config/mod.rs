#[cfg(feature = "cli")]
pub mod cli;
pub mod file;
pub mod loader;

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use loader::{ConfigLoader, DEFAULT_ENVIRONMENT_NAME, ENVIRONMENT_PROPERTY};
