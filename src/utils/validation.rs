use crate::utils::error::{PropsError, Result};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(PropsError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(PropsError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

/// Environment names select `<name>.toml` / `<name>.properties` under the search
/// directory. Sub-directories are allowed, escaping the directory is not.
pub fn validate_environment_name(field_name: &str, name: &str) -> Result<()> {
    validate_non_empty_string(field_name, name)?;
    validate_path(field_name, name)?;

    if name.starts_with('/') || name.split(['/', '\\']).any(|segment| segment == "..") {
        return Err(PropsError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: name.to_string(),
            reason: "Environment name must stay inside the property directory".to_string(),
        });
    }

    Ok(())
}

pub fn validate_property_key(field_name: &str, key: &str) -> Result<()> {
    validate_non_empty_string(field_name, key)?;

    if key.contains('$') {
        return Err(PropsError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: key.to_string(),
            reason: "Property keys cannot contain '$'".to_string(),
        });
    }

    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(PropsError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(PropsError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}
