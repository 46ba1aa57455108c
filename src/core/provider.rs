use crate::core::coerce::FromPropertyValue;
use crate::core::resolver::Resolver;
use crate::domain::model::{PropertyMapping, PropertyValue};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{PropsError, Result};
use serde::Serialize;

/// Fully resolved properties with typed lookup.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResolvedConfig {
    properties: PropertyMapping,
}

impl ResolvedConfig {
    /// Wraps a mapping that has already been through the resolver.
    pub fn new(properties: PropertyMapping) -> Self {
        Self { properties }
    }

    pub fn from_mapping(mapping: &PropertyMapping, resolver: &Resolver) -> Result<Self> {
        resolver.resolve(mapping).map(Self::new)
    }

    pub fn properties(&self) -> &PropertyMapping {
        &self.properties
    }

    pub fn into_properties(self) -> PropertyMapping {
        self.properties
    }

    pub fn raw(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    fn convert<T: FromPropertyValue>(key: &str, value: &PropertyValue) -> Result<T> {
        T::from_property_value(value).ok_or_else(|| PropsError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            expected: T::EXPECTED,
        })
    }
}

impl ConfigProvider for ResolvedConfig {
    fn get<T: FromPropertyValue>(&self, key: &str) -> Result<T> {
        let value = self.raw(key).ok_or_else(|| PropsError::NotFound {
            key: key.to_string(),
        })?;
        Self::convert(key, value)
    }

    fn get_or<T: FromPropertyValue>(&self, key: &str, default: T) -> Result<T> {
        match self.raw(key) {
            Some(value) => Self::convert(key, value),
            None => Ok(default),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::mapping_from;

    fn config() -> ResolvedConfig {
        let mapping = mapping_from([("num", "5"), ("n", "${num}"), ("name", "svc")]);
        ResolvedConfig::from_mapping(&mapping, &Resolver::default()).unwrap()
    }

    #[test]
    fn test_typed_lookup_after_resolution() {
        let config = config();
        assert_eq!(config.get::<i32>("n").unwrap(), 5);
        assert_eq!(config.get::<String>("name").unwrap(), "svc");
    }

    #[test]
    fn test_missing_key_is_not_found() {
        let err = config().get::<String>("absent").unwrap_err();
        assert!(matches!(err, PropsError::NotFound { ref key } if key == "absent"));
    }

    #[test]
    fn test_get_or_only_defaults_on_absence() {
        let config = config();
        assert_eq!(config.get_or("absent", 42u16).unwrap(), 42);
        assert_eq!(config.get_or("num", 42u16).unwrap(), 5);
        assert!(matches!(
            config.get_or("name", 1i32),
            Err(PropsError::InvalidValue { expected: "32-bit integer", .. })
        ));
    }
}
