//! Error types for SQL generation.
//!
//! Every public entry point either returns a finished statement or one of
//! these errors. Nothing is deferred to execution time.

use thiserror::Error as ThisError;

/// The primary error type for all sqlgen operations.
#[derive(Debug, ThisError)]
pub enum Error {
    /// The active dialect does not support the requested feature or options
    #[error(transparent)]
    Capability(CapabilityError),
    /// The operation descriptor is structurally invalid
    #[error(transparent)]
    Validation(ValidationError),
    /// A generated identifier exceeds the dialect's length limit
    #[error(transparent)]
    IdentifierLength(IdentifierLengthError),
    /// Invalid dialect registration or generator configuration
    #[error("Configuration error: {0}")]
    Config(ConfigError),
    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// A feature or option is not supported by the active dialect.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
#[error("{message}")]
pub struct CapabilityError {
    /// Name of the dialect that rejected the request
    pub dialect: String,
    /// The generator operation, when the error concerns its options
    pub operation: Option<String>,
    /// Every unsupported option found, in the order they were checked
    pub options: Vec<String>,
    /// Human-readable message
    pub message: String,
}

impl CapabilityError {
    /// Aggregated error listing every option the dialect cannot honor.
    pub fn invalid_options(
        operation: impl Into<String>,
        dialect: impl Into<String>,
        options: Vec<String>,
    ) -> Self {
        let operation = operation.into();
        let dialect = dialect.into();
        let message = format!(
            "The following options are not supported by {} in {}: {}",
            operation,
            dialect,
            options.join(", ")
        );
        Self {
            dialect,
            operation: Some(operation),
            options,
            message,
        }
    }

    /// A single unsupported feature with a custom message.
    pub fn unsupported(
        dialect: impl Into<String>,
        option: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            dialect: dialect.into(),
            operation: None,
            options: vec![option.into()],
            message: message.into(),
        }
    }
}

/// The type of structural problem found in an operation descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Operator tag does not exist
    UnknownOperator,
    /// Operand has the wrong shape for its operator
    InvalidOperand,
    /// NaN, infinity or a malformed decimal
    InvalidNumber,
    /// A caller bind parameter collides with a reserved name
    BindCollision,
    /// A statement needs at least one column
    MissingColumns,
    /// Two options cannot be combined
    ConflictingOptions,
    /// An identifier or table reference is malformed
    InvalidIdentifier,
    /// Anything else
    Invalid,
}

/// The operation descriptor is invalid regardless of dialect.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
#[error("{message}")]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    pub message: String,
    /// Attribute the problem was found on
    pub attribute: Option<String>,
    /// Operator the problem was found on
    pub operator: Option<String>,
}

impl ValidationError {
    /// Create a validation error without attribute context.
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            attribute: None,
            operator: None,
        }
    }

    /// Attach the offending attribute.
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    /// Attach the offending operator.
    pub fn with_operator(mut self, operator: impl Into<String>) -> Self {
        self.operator = Some(operator.into());
        self
    }
}

/// A generated identifier is longer than the dialect allows.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
#[error(
    "Identifier \"{identifier}\" is {length} bytes long, which exceeds the {max} byte limit of the {dialect} dialect. Enable alias minification or use a shorter name"
)]
pub struct IdentifierLengthError {
    pub dialect: String,
    pub identifier: String,
    pub length: usize,
    pub max: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
#[error("{message}")]
pub struct ConfigError {
    pub message: String,
}

impl ConfigError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Error {
    /// Shorthand for a validation error of the given kind.
    pub fn validation(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Error::Validation(ValidationError::new(kind, message))
    }

    /// Shorthand for a single-feature capability error.
    pub fn unsupported(
        dialect: impl Into<String>,
        option: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Error::Capability(CapabilityError::unsupported(dialect, option, message))
    }

    /// Is this a capability (unsupported feature) error?
    pub fn is_capability(&self) -> bool {
        matches!(self, Error::Capability(_))
    }

    /// Is this a validation error?
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    /// Is this an identifier length error?
    pub fn is_identifier_length(&self) -> bool {
        matches!(self, Error::IdentifierLength(_))
    }

    /// Name of the dialect that raised the error, if any.
    pub fn dialect(&self) -> Option<&str> {
        match self {
            Error::Capability(e) => Some(&e.dialect),
            Error::IdentifierLength(e) => Some(&e.dialect),
            _ => None,
        }
    }

    /// Unsupported option names carried by a capability error.
    pub fn unsupported_options(&self) -> &[String] {
        match self {
            Error::Capability(e) => &e.options,
            _ => &[],
        }
    }
}

impl From<CapabilityError> for Error {
    fn from(err: CapabilityError) -> Self {
        Error::Capability(err)
    }
}

impl From<ValidationError> for Error {
    fn from(err: ValidationError) -> Self {
        Error::Validation(err)
    }
}

impl From<IdentifierLengthError> for Error {
    fn from(err: IdentifierLengthError) -> Self {
        Error::IdentifierLength(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err)
    }
}

/// Result type alias for sqlgen operations.
pub type Result<T> = std::result::Result<T, Error>;
