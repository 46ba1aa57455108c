use crate::domain::model::{PropertyMapping, PropertyValue};
use crate::domain::ports::PropertySource;
use crate::utils::error::{PropsError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

// key, optional `=`/`:` separator (or just whitespace), value
static PROPERTIES_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^((?:\\.|[^=:\s\\])+)\s*(?:[=:]\s*)?(.*)$").expect("valid properties regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Toml,
    Properties,
}

impl FileFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            FileFormat::Toml => "toml",
            FileFormat::Properties => "properties",
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Some(FileFormat::Toml),
            Some("properties") => Some(FileFormat::Properties),
            _ => None,
        }
    }
}

/// A property file on disk, one layer of the configuration.
#[derive(Debug, Clone)]
pub struct PropertyFile {
    path: PathBuf,
    format: FileFormat,
    name: String,
}

impl PropertyFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let format = FileFormat::from_path(&path).ok_or_else(|| PropsError::FileLoad {
            path: path.display().to_string(),
            message: "Unsupported file extension, expected .toml or .properties".to_string(),
        })?;
        Ok(Self {
            name: format!("file:{}", path.display()),
            path,
            format,
        })
    }

    /// Looks for `<environment>.toml`, then `<environment>.properties`, in `dir`.
    pub fn locate(dir: &Path, environment: &str) -> Option<Self> {
        [FileFormat::Toml, FileFormat::Properties]
            .into_iter()
            .map(|format| dir.join(format!("{}.{}", environment, format.extension())))
            .find(|candidate| candidate.is_file())
            .and_then(|path| Self::new(path).ok())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> FileFormat {
        self.format
    }

    fn load_error(&self, message: impl std::fmt::Display) -> PropsError {
        PropsError::FileLoad {
            path: self.path.display().to_string(),
            message: message.to_string(),
        }
    }
}

impl PropertySource for PropertyFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn load(&self) -> Result<PropertyMapping> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| self.load_error(e))?;
        let properties = match self.format {
            FileFormat::Toml => parse_toml(&content).map_err(|e| self.load_error(e))?,
            FileFormat::Properties => parse_properties(&content),
        };
        tracing::debug!(
            "Loaded {} properties from {}",
            properties.len(),
            self.path.display()
        );
        Ok(properties)
    }
}

/// Parses TOML, flattening nested tables into dotted keys. Scalars keep their
/// type; arrays and datetimes are stored as their TOML text.
pub fn parse_toml(content: &str) -> Result<PropertyMapping> {
    let table: toml::Table = toml::from_str(content)?;
    let mut properties = PropertyMapping::new();
    flatten_table("", &table, &mut properties);
    Ok(properties)
}

fn flatten_table(prefix: &str, table: &toml::Table, out: &mut PropertyMapping) {
    for (key, value) in table {
        let full_key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };

        let property = match value {
            toml::Value::Table(nested) => {
                flatten_table(&full_key, nested, out);
                continue;
            }
            toml::Value::String(s) => PropertyValue::String(s.clone()),
            toml::Value::Integer(i) => PropertyValue::Integer(*i),
            toml::Value::Float(x) => PropertyValue::Float(*x),
            toml::Value::Boolean(b) => PropertyValue::Bool(*b),
            other => PropertyValue::String(other.to_string()),
        };
        out.insert(full_key, property);
    }
}

/// Parses the `key=value` properties format: `=`, `:` or whitespace separators,
/// `#`/`!` comments and backslash line continuations. All values are strings.
pub fn parse_properties(content: &str) -> PropertyMapping {
    let mut properties = PropertyMapping::new();
    let mut logical = String::new();

    for line in content.lines() {
        let line = line.trim_start();
        if logical.is_empty() && (line.is_empty() || line.starts_with('#') || line.starts_with('!')) {
            continue;
        }

        if ends_with_continuation(line) {
            logical.push_str(&line[..line.len() - 1]);
            continue;
        }
        logical.push_str(line);

        if let Some(caps) = PROPERTIES_ENTRY.captures(&logical) {
            let key = unescape(&caps[1]);
            properties.insert(key, PropertyValue::String(unescape(&caps[2])));
        }
        logical.clear();
    }

    if !logical.is_empty() {
        if let Some(caps) = PROPERTIES_ENTRY.captures(&logical) {
            properties.insert(unescape(&caps[1]), PropertyValue::String(unescape(&caps[2])));
        }
    }

    properties
}

fn ends_with_continuation(line: &str) -> bool {
    line.bytes().rev().take_while(|&b| b == b'\\').count() % 2 == 1
}

fn unescape(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('r') => result.push('\r'),
            Some('f') => result.push('\u{c}'),
            Some('u') => {
                let hex: String = chars.clone().take(4).collect();
                let decoded = Some(&hex)
                    .filter(|hex| hex.len() == 4 && hex.bytes().all(|b| b.is_ascii_hexdigit()))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .and_then(char::from_u32);
                match decoded {
                    Some(decoded) => {
                        result.push(decoded);
                        chars.nth(3);
                    }
                    _ => result.push('u'),
                }
            }
            Some(other) => result.push(other),
            None => {}
        }
    }
    result
}
