use ares_core::ConfigError;

/// Errors raised while coercing raw input into a [`QueryCriteria`](crate::QueryCriteria).
#[derive(Debug, Clone, PartialEq)]
pub enum CriteriaError {
    /// A configuration key that criteria do not recognise.
    UnknownKey(String),
    /// A recognised key holding a value of the wrong shape.
    TypeMismatch { key: String, expected: &'static str },
    /// A limit other than `-1` or a positive integer.
    InvalidLimit(i64),
    /// An offset below `-1`.
    InvalidOffset(i64),
    /// Persisted criteria that could not be decoded.
    Malformed(String),
}

impl std::fmt::Display for CriteriaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CriteriaError::UnknownKey(key) => write!(f, "Unknown criteria key: {key}"),
            CriteriaError::TypeMismatch { key, expected } => {
                write!(f, "Criteria key '{key}' must be {expected}")
            }
            CriteriaError::InvalidLimit(v) => {
                write!(f, "Invalid limit {v}: expected -1 or a positive integer")
            }
            CriteriaError::InvalidOffset(v) => {
                write!(f, "Invalid offset {v}: expected -1 or a non-negative integer")
            }
            CriteriaError::Malformed(msg) => write!(f, "Malformed criteria: {msg}"),
        }
    }
}

impl std::error::Error for CriteriaError {}

/// Errors that can occur in the resource data layer.
#[derive(Debug)]
pub enum DataError {
    NotFound(String),
    /// The remote collection call failed. Never retried here.
    Remote(Box<dyn std::error::Error + Send + Sync>),
    /// Missing schema, malformed relation or bad provider configuration.
    Configuration(String),
    Criteria(CriteriaError),
    /// A key attribute the item does not expose.
    MissingAttribute { attribute: String, position: usize },
    Other(String),
}

impl DataError {
    /// Construct a `Remote` variant from any error type.
    ///
    /// Used by model implementations to wrap transport-specific errors.
    pub fn remote(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        DataError::Remote(Box::new(err))
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        DataError::Configuration(msg.into())
    }

    /// Whether this is a fatal configuration problem.
    pub fn is_configuration(&self) -> bool {
        matches!(self, DataError::Configuration(_))
    }
}

impl std::fmt::Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataError::NotFound(msg) => write!(f, "Not found: {msg}"),
            DataError::Remote(err) => write!(f, "Remote error: {err}"),
            DataError::Configuration(msg) => write!(f, "Configuration error: {msg}"),
            DataError::Criteria(err) => write!(f, "{err}"),
            DataError::MissingAttribute { attribute, position } => {
                write!(f, "Item {position} has no attribute '{attribute}'")
            }
            DataError::Other(msg) => write!(f, "Data error: {msg}"),
        }
    }
}

impl std::error::Error for DataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DataError::Remote(err) => Some(err.as_ref()),
            DataError::Criteria(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CriteriaError> for DataError {
    fn from(err: CriteriaError) -> Self {
        DataError::Criteria(err)
    }
}

impl From<ConfigError> for DataError {
    fn from(err: ConfigError) -> Self {
        DataError::Configuration(err.to_string())
    }
}
