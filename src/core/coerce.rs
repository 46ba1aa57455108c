use crate::domain::model::PropertyValue;
use std::path::PathBuf;
use url::Url;

/// Conversion from a resolved property into a caller-requested type.
pub trait FromPropertyValue: Sized {
    /// Human-readable target type used in `InvalidValue` errors.
    const EXPECTED: &'static str;

    fn from_property_value(value: &PropertyValue) -> Option<Self>;
}

impl FromPropertyValue for PropertyValue {
    const EXPECTED: &'static str = "property value";

    fn from_property_value(value: &PropertyValue) -> Option<Self> {
        Some(value.clone())
    }
}

impl FromPropertyValue for String {
    const EXPECTED: &'static str = "string";

    fn from_property_value(value: &PropertyValue) -> Option<Self> {
        Some(value.to_string())
    }
}

impl FromPropertyValue for bool {
    const EXPECTED: &'static str = "boolean";

    fn from_property_value(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Bool(b) => Some(*b),
            PropertyValue::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

impl FromPropertyValue for char {
    const EXPECTED: &'static str = "character";

    fn from_property_value(value: &PropertyValue) -> Option<Self> {
        let text = value.to_string();
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Some(c),
            _ => None,
        }
    }
}

macro_rules! impl_integer {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl FromPropertyValue for $ty {
                const EXPECTED: &'static str = $name;

                fn from_property_value(value: &PropertyValue) -> Option<Self> {
                    match value {
                        PropertyValue::Integer(i) => <$ty>::try_from(*i).ok(),
                        PropertyValue::String(s) => s.trim().parse().ok(),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_integer!(
    i8 => "8-bit integer",
    i16 => "16-bit integer",
    i32 => "32-bit integer",
    i64 => "64-bit integer",
    u8 => "8-bit unsigned integer",
    u16 => "16-bit unsigned integer",
    u32 => "32-bit unsigned integer",
    u64 => "64-bit unsigned integer",
    usize => "unsigned integer",
);

impl FromPropertyValue for f64 {
    const EXPECTED: &'static str = "floating point number";

    fn from_property_value(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Float(x) => Some(*x),
            PropertyValue::Integer(i) => Some(*i as f64),
            PropertyValue::String(s) => s.trim().parse().ok(),
            PropertyValue::Bool(_) => None,
        }
    }
}

impl FromPropertyValue for f32 {
    const EXPECTED: &'static str = "floating point number";

    fn from_property_value(value: &PropertyValue) -> Option<Self> {
        f64::from_property_value(value).map(|x| x as f32)
    }
}

impl FromPropertyValue for PathBuf {
    const EXPECTED: &'static str = "path";

    fn from_property_value(value: &PropertyValue) -> Option<Self> {
        value
            .as_str()
            .filter(|s| !s.is_empty() && !s.contains('\0'))
            .map(PathBuf::from)
    }
}

impl FromPropertyValue for Url {
    const EXPECTED: &'static str = "URL";

    fn from_property_value(value: &PropertyValue) -> Option<Self> {
        value.as_str().and_then(|s| Url::parse(s.trim()).ok())
    }
}
