use crate::config::file::PropertyFile;
use crate::core::merge::merge_layers;
use crate::core::provider::ResolvedConfig;
use crate::core::resolver::{Resolution, Resolver, ResolverOptions};
use crate::domain::model::{PropertyMapping, PropertyValue, SourceLayer};
use crate::domain::ports::PropertySource;
use crate::utils::error::{PropsError, Result};
use crate::utils::validation::{
    validate_environment_name, validate_path, validate_range, Validate,
};
use std::path::{Path, PathBuf};

/// Property naming the environment, and thereby the property file, to load.
pub const ENVIRONMENT_PROPERTY: &str = "env";
pub const DEFAULT_ENVIRONMENT_NAME: &str = "default";

/// An in-memory layer: defaults, system properties, or a fixed environment.
#[derive(Debug, Clone)]
pub struct MapSource {
    name: String,
    properties: PropertyMapping,
}

impl MapSource {
    pub fn new(name: impl Into<String>, properties: PropertyMapping) -> Self {
        Self {
            name: name.into(),
            properties,
        }
    }
}

impl PropertySource for MapSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn load(&self) -> Result<PropertyMapping> {
        Ok(self.properties.clone())
    }
}

/// The process environment. Variables that are not valid unicode are skipped.
#[derive(Debug, Clone, Default)]
pub struct EnvVarSource;

impl PropertySource for EnvVarSource {
    fn name(&self) -> &str {
        "environment"
    }

    fn load(&self) -> Result<PropertyMapping> {
        Ok(std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .map(|(k, v)| (k, PropertyValue::String(v)))
            .collect())
    }
}

#[derive(Debug, Clone)]
enum EnvironmentVariables {
    Process,
    Fixed(PropertyMapping),
    Disabled,
}

/// Assembles the layers, lowest precedence first:
/// defaults, `<env>` property file, environment variables, system properties.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    defaults: Option<PropertyMapping>,
    search_dir: PathBuf,
    environment_variables: EnvironmentVariables,
    system_properties: PropertyMapping,
    options: ResolverOptions,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            defaults: None,
            search_dir: PathBuf::from("."),
            environment_variables: EnvironmentVariables::Process,
            system_properties: PropertyMapping::new(),
            options: ResolverOptions::default(),
        }
    }

    pub fn with_defaults(mut self, defaults: PropertyMapping) -> Self {
        self.defaults = Some(defaults);
        self
    }

    /// Directory holding `<env>.toml` / `<env>.properties`.
    pub fn with_search_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.search_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Highest precedence layer, the equivalent of `-Dkey=value`.
    pub fn with_system_properties(mut self, properties: PropertyMapping) -> Self {
        self.system_properties = properties;
        self
    }

    pub fn with_system_property(
        mut self,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Self {
        self.system_properties.insert(key.into(), value.into());
        self
    }

    /// Read the process environment (the default) or skip it entirely.
    pub fn with_env_vars(mut self, enabled: bool) -> Self {
        self.environment_variables = if enabled {
            EnvironmentVariables::Process
        } else {
            EnvironmentVariables::Disabled
        };
        self
    }

    /// Use a fixed mapping in place of the process environment.
    pub fn with_env_source(mut self, variables: PropertyMapping) -> Self {
        self.environment_variables = EnvironmentVariables::Fixed(variables);
        self
    }

    pub fn with_options(mut self, options: ResolverOptions) -> Self {
        self.options = options;
        self
    }

    pub fn search_dir(&self) -> &Path {
        &self.search_dir
    }

    /// Loads and resolves all layers. Fails on the first unresolvable key.
    pub fn load(&self) -> Result<ResolvedConfig> {
        let merged = self.merged()?;
        let config = ResolvedConfig::from_mapping(&merged, &Resolver::new(self.options))?;
        tracing::info!("Resolved {} properties", config.len());
        Ok(config)
    }

    /// Loads all layers and resolves each key independently.
    pub fn load_each(&self) -> Result<Resolution> {
        let merged = self.merged()?;
        let resolution = Resolver::new(self.options).resolve_each(&merged);
        if !resolution.is_complete() {
            tracing::warn!(
                "{} of {} properties failed to resolve",
                resolution.failures.len(),
                merged.len()
            );
        }
        Ok(resolution)
    }

    /// All layers merged, placeholders not yet resolved.
    pub fn merged(&self) -> Result<PropertyMapping> {
        self.validate()?;
        let mut layers = self.base_layers()?;

        let environment = self.environment_name(&layers)?;
        validate_environment_name(ENVIRONMENT_PROPERTY, &environment)?;

        match PropertyFile::locate(&self.search_dir, &environment) {
            Some(file) => {
                tracing::info!("Loading property file {}", file.path().display());
                let rank = usize::from(self.defaults.is_some());
                layers.insert(rank, layer_of(&file)?);
            }
            None => tracing::warn!(
                "Unable to find property file '{}' inside {}",
                environment,
                self.search_dir.display()
            ),
        }

        Ok(merge_layers(&layers))
    }

    fn base_layers(&self) -> Result<Vec<SourceLayer>> {
        let mut sources: Vec<Box<dyn PropertySource>> = Vec::new();
        if let Some(defaults) = &self.defaults {
            sources.push(Box::new(MapSource::new("defaults", defaults.clone())));
        }
        match &self.environment_variables {
            EnvironmentVariables::Process => sources.push(Box::new(EnvVarSource)),
            EnvironmentVariables::Fixed(variables) => {
                sources.push(Box::new(MapSource::new("environment", variables.clone())))
            }
            EnvironmentVariables::Disabled => {}
        }
        sources.push(Box::new(MapSource::new(
            "system",
            self.system_properties.clone(),
        )));

        sources.iter().map(|source| layer_of(source.as_ref())).collect()
    }

    /// The `env` property as seen before any property file is merged in.
    fn environment_name(&self, layers: &[SourceLayer]) -> Result<String> {
        let merged = merge_layers(layers);
        let resolver = Resolver::new(self.options);
        let name = resolver
            .resolve_key(&merged, ENVIRONMENT_PROPERTY)
            .map_err(|source| PropsError::Resolve {
                key: ENVIRONMENT_PROPERTY.to_string(),
                source,
            })?
            .map(|value| value.to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_ENVIRONMENT_NAME.to_string());
        tracing::debug!("Selected environment '{}'", name);
        Ok(name)
    }
}

impl Validate for ConfigLoader {
    fn validate(&self) -> Result<()> {
        validate_path("search_dir", &self.search_dir.to_string_lossy())?;
        validate_range("max_depth", self.options.max_depth, 1, 64)
    }
}

fn layer_of<S: PropertySource + ?Sized>(source: &S) -> Result<SourceLayer> {
    Ok(SourceLayer::new(source.name(), source.load()?))
}
