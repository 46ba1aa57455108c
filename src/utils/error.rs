use thiserror::Error;

/// Failure while expanding the placeholders of a single value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolveError {
    #[error("Unable to find placeholder value '{placeholder}' for string: {value}")]
    UnresolvedPlaceholder { placeholder: String, value: String },

    #[error("Infinite loop in property interpolation of {root}: {}", .chain.join("->"))]
    CyclicReference { root: String, chain: Vec<String> },

    #[error(
        "Infinite loop in property interpolation of {root}: maximum depth {max_depth} exceeded ({})",
        .chain.join("->")
    )]
    MaxDepthExceeded {
        root: String,
        chain: Vec<String>,
        max_depth: usize,
    },

    #[error("Unable to find placeholder closing key in '{value}', embraced placeholders must be closed")]
    SyntaxError { value: String },
}

#[derive(Error, Debug)]
pub enum PropsError {
    #[error("Failed to resolve property '{key}': {source}")]
    Resolve {
        key: String,
        #[source]
        source: ResolveError,
    },

    #[error("Property '{key}' is not defined")]
    NotFound { key: String },

    #[error("Property '{key}' has value '{value}' which is not a valid {expected}")]
    InvalidValue {
        key: String,
        value: String,
        expected: &'static str,
    },

    #[error("Unable to load property file '{path}': {message}")]
    FileLoad { path: String, message: String },

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Interpolation,
    Lookup,
    Source,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl PropsError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            PropsError::Resolve { .. } => ErrorCategory::Interpolation,
            PropsError::NotFound { .. } | PropsError::InvalidValue { .. } => ErrorCategory::Lookup,
            PropsError::FileLoad { .. } | PropsError::TomlError(_) => ErrorCategory::Source,
            PropsError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            PropsError::NotFound { .. } => ErrorSeverity::Low,
            PropsError::InvalidValue { .. } | PropsError::InvalidConfigValueError { .. } => {
                ErrorSeverity::Medium
            }
            PropsError::Resolve { .. } => ErrorSeverity::High,
            PropsError::FileLoad { .. } | PropsError::TomlError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            PropsError::Resolve { source, .. } => match source {
                ResolveError::UnresolvedPlaceholder { .. } => {
                    "Define the referenced property or add a default value with ${key:default}"
                }
                ResolveError::CyclicReference { .. } => {
                    "Break the reference cycle between the listed properties"
                }
                ResolveError::MaxDepthExceeded { .. } => {
                    "Flatten the chain of nested property references"
                }
                ResolveError::SyntaxError { .. } => "Close every '${' with a matching '}'",
            },
            PropsError::NotFound { .. } => "Define the property in a source layer or pass -D key=value",
            PropsError::InvalidValue { .. } => "Check the property value against the requested type",
            PropsError::FileLoad { .. } | PropsError::TomlError(_) => {
                "Check the property file syntax and permissions"
            }
            PropsError::InvalidConfigValueError { .. } => "Check the command line arguments",
        }
    }

    /// The resolve failure behind this error, if it is one.
    pub fn as_resolve_error(&self) -> Option<&ResolveError> {
        match self {
            PropsError::Resolve { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PropsError>;
