use crate::core::coerce::FromPropertyValue;
use crate::domain::model::PropertyMapping;
use crate::utils::error::Result;

/// Something that can produce one layer of properties.
pub trait PropertySource {
    fn name(&self) -> &str;
    fn load(&self) -> Result<PropertyMapping>;
}

/// Typed read access to resolved properties.
pub trait ConfigProvider {
    /// Fails with `NotFound` when the key is absent.
    fn get<T: FromPropertyValue>(&self, key: &str) -> Result<T>;

    /// Returns `default` when the key is absent. Conversion failures still surface.
    fn get_or<T: FromPropertyValue>(&self, key: &str, default: T) -> Result<T>;
}
