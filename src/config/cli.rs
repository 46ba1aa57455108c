use crate::config::file::PropertyFile;
use crate::config::loader::{ConfigLoader, ENVIRONMENT_PROPERTY};
use crate::core::resolver::{MissingPolicy, ResolverOptions, MAX_RESOLVE_DEPTH};
use crate::domain::model::{PropertyMapping, PropertyValue};
use crate::domain::ports::PropertySource;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_environment_name, validate_path, validate_property_key, validate_range, Validate,
};
use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Type requested for `--get`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ValueType {
    String,
    Bool,
    Int,
    Float,
    Char,
    Url,
    Path,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "layered-props")]
#[command(about = "Resolve layered properties with placeholder interpolation")]
pub struct CliConfig {
    #[arg(long, default_value = ".", help = "Directory holding <env>.toml / <env>.properties")]
    pub dir: String,

    #[arg(long, help = "Environment to load, same as -D env=<name>")]
    pub env: Option<String>,

    #[arg(long, help = "Defaults file (.toml or .properties), lowest precedence")]
    pub defaults: Option<String>,

    #[arg(
        short = 'D',
        long = "define",
        value_name = "KEY=VALUE",
        value_parser = parse_definition,
        help = "System property, highest precedence"
    )]
    pub defines: Vec<(String, String)>,

    #[arg(long, help = "Do not read process environment variables")]
    pub no_env_vars: bool,

    #[arg(long, value_name = "KEY", help = "Print a single property")]
    pub get: Option<String>,

    #[arg(long = "type", value_enum, default_value_t = ValueType::String)]
    pub value_type: ValueType,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    #[arg(long, help = "Leave unresolvable placeholders in place instead of failing")]
    pub permissive: bool,

    #[arg(long, default_value_t = MAX_RESOLVE_DEPTH)]
    pub max_depth: usize,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

fn parse_definition(raw: &str) -> std::result::Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.trim().to_string(), value.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))
}

impl CliConfig {
    pub fn resolver_options(&self) -> ResolverOptions {
        ResolverOptions {
            max_depth: self.max_depth,
            on_missing: if self.permissive {
                MissingPolicy::Keep
            } else {
                MissingPolicy::Fail
            },
        }
    }

    pub fn system_properties(&self) -> PropertyMapping {
        let mut properties: PropertyMapping = self
            .defines
            .iter()
            .map(|(k, v)| (k.clone(), PropertyValue::from(v.as_str())))
            .collect();
        if let Some(env) = &self.env {
            properties.insert(ENVIRONMENT_PROPERTY.to_string(), env.as_str().into());
        }
        properties
    }

    pub fn to_loader(&self) -> Result<ConfigLoader> {
        let mut loader = ConfigLoader::new()
            .with_search_dir(&self.dir)
            .with_env_vars(!self.no_env_vars)
            .with_system_properties(self.system_properties())
            .with_options(self.resolver_options());

        if let Some(path) = &self.defaults {
            loader = loader.with_defaults(PropertyFile::new(path)?.load()?);
        }
        Ok(loader)
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_path("dir", &self.dir)?;
        if let Some(env) = &self.env {
            validate_environment_name("env", env)?;
        }
        if let Some(path) = &self.defaults {
            validate_path("defaults", path)?;
        }
        for (key, _) in &self.defines {
            validate_property_key("define", key)?;
        }
        if let Some(key) = &self.get {
            validate_property_key("get", key)?;
        }
        validate_range("max_depth", self.max_depth, 1, 64)
    }
}
