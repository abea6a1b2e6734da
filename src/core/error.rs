//! Typed error handling for sortable tables
//!
//! Every failure the query shaper can report is a variant of [`SortableError`],
//! so HTTP handlers can match on the category and decide between falling back
//! to defaults and rejecting the request.
//!
//! # Error Categories
//!
//! - [`SortError`]: requested sort or secondary sort key is not configured
//! - [`FilterError`]: a filter or letter parameter could not be interpreted
//! - [`ConfigError`]: table configuration is invalid (detected at setup)
//! - [`RequestError`]: the query string itself could not be decoded
//!
//! # Example
//!
//! ```rust,ignore
//! use sortable::prelude::*;
//!
//! match shaper.shape(&params) {
//!     Ok(descriptor) => run_query(descriptor),
//!     Err(SortableError::Sort(SortError::InvalidSortKey { .. })) => {
//!         // fall back to the default ordering
//!         shaper.shape(&params.without(&["sort", "secondary_sort"]))?
//!     }
//!     Err(e) => return Err(e),
//! }
//! ```

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;

/// The main error type for the sortable crate
#[derive(Debug)]
pub enum SortableError {
    /// Sort resolution errors
    Sort(SortError),

    /// Filter and letter parameter errors
    Filter(FilterError),

    /// Configuration errors (setup time)
    Config(ConfigError),

    /// Query string decoding errors
    Request(RequestError),
}

impl fmt::Display for SortableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortableError::Sort(e) => write!(f, "{}", e),
            SortableError::Filter(e) => write!(f, "{}", e),
            SortableError::Config(e) => write!(f, "{}", e),
            SortableError::Request(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for SortableError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SortableError::Sort(e) => Some(e),
            SortableError::Filter(e) => Some(e),
            SortableError::Config(e) => Some(e),
            SortableError::Request(e) => Some(e),
        }
    }
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl SortableError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            SortableError::Sort(_) => StatusCode::BAD_REQUEST,
            SortableError::Filter(_) => StatusCode::BAD_REQUEST,
            SortableError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            SortableError::Request(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            SortableError::Sort(e) => e.error_code(),
            SortableError::Filter(e) => e.error_code(),
            SortableError::Config(_) => "CONFIG_ERROR",
            SortableError::Request(_) => "INVALID_QUERY",
        }
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            details: self.details(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            SortableError::Sort(SortError::InvalidSortKey { param, key }) => {
                Some(serde_json::json!({ "param": param, "key": key }))
            }
            SortableError::Filter(FilterError::ParseError {
                key, expected, ..
            }) => Some(serde_json::json!({ "filter": key, "expected": expected })),
            SortableError::Filter(FilterError::InvalidLetter { .. }) => {
                Some(serde_json::json!({ "param": "letter" }))
            }
            _ => None,
        }
    }
}

impl IntoResponse for SortableError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

// =============================================================================
// Sort Errors
// =============================================================================

/// Errors raised while resolving sort parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortError {
    /// The requested key (after stripping `_reverse`) is not in the sort map
    InvalidSortKey {
        /// Request parameter that carried the key (`sort` or `secondary_sort`)
        param: String,
        /// The raw key as received
        key: String,
    },
}

impl fmt::Display for SortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortError::InvalidSortKey { param, key } => {
                write!(f, "Invalid {} parameter passed: '{}'", param, key)
            }
        }
    }
}

impl std::error::Error for SortError {}

impl SortError {
    pub fn error_code(&self) -> &'static str {
        match self {
            SortError::InvalidSortKey { .. } => "INVALID_SORT_KEY",
        }
    }
}

impl From<SortError> for SortableError {
    fn from(err: SortError) -> Self {
        SortableError::Sort(err)
    }
}

// =============================================================================
// Filter Errors
// =============================================================================

/// Errors raised while turning filter or letter parameters into conditions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// A typed filter value could not be parsed
    ParseError {
        key: String,
        value: String,
        expected: String,
    },

    /// The letter parameter is not a single alphabetic character
    InvalidLetter { value: String },
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterError::ParseError {
                key,
                value,
                expected,
            } => {
                write!(
                    f,
                    "Filter '{}' expects a {} value, got '{}'",
                    key, expected, value
                )
            }
            FilterError::InvalidLetter { value } => {
                write!(
                    f,
                    "Letter search expects a single alphabetic character, got '{}'",
                    value
                )
            }
        }
    }
}

impl std::error::Error for FilterError {}

impl FilterError {
    pub fn error_code(&self) -> &'static str {
        match self {
            FilterError::ParseError { .. } => "FILTER_PARSE_ERROR",
            FilterError::InvalidLetter { .. } => "INVALID_LETTER",
        }
    }
}

impl From<FilterError> for SortableError {
    fn from(err: FilterError) -> Self {
        SortableError::Filter(err)
    }
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to table configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Failed to parse a configuration document
    ParseError {
        file: Option<String>,
        message: String,
    },

    /// A sort map entry has no targets
    EmptySortTargets { key: String },

    /// A key referenced by the configuration is missing from the sort map
    UnknownSortKey { key: String, context: String },

    /// Invalid value in configuration
    InvalidValue {
        field: String,
        value: String,
        message: String,
    },

    /// IO error while reading configuration
    IoError { message: String },

    /// A condition template whose placeholders do not match its bind values
    PlaceholderMismatch {
        template: String,
        placeholders: usize,
        binds: usize,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError { file, message } => {
                if let Some(file) = file {
                    write!(f, "Failed to parse config file '{}': {}", file, message)
                } else {
                    write!(f, "Failed to parse config: {}", message)
                }
            }
            ConfigError::EmptySortTargets { key } => {
                write!(f, "Sort map entry '{}' has no targets", key)
            }
            ConfigError::UnknownSortKey { key, context } => {
                write!(f, "Sort key '{}' used by {} is not in the sort map", key, context)
            }
            ConfigError::InvalidValue {
                field,
                value,
                message,
            } => {
                write!(
                    f,
                    "Invalid value '{}' for field '{}': {}",
                    value, field, message
                )
            }
            ConfigError::IoError { message } => {
                write!(f, "IO error: {}", message)
            }
            ConfigError::PlaceholderMismatch {
                template,
                placeholders,
                binds,
            } => {
                write!(
                    f,
                    "Condition '{}' has {} placeholder(s) but {} bind value(s)",
                    template, placeholders, binds
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for SortableError {
    fn from(err: ConfigError) -> Self {
        SortableError::Config(err)
    }
}

// =============================================================================
// Request Errors
// =============================================================================

/// Errors related to decoding the incoming request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// The query string could not be decoded
    InvalidQueryString { message: String },
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::InvalidQueryString { message } => {
                write!(f, "Invalid query string: {}", message)
            }
        }
    }
}

impl std::error::Error for RequestError {}

impl From<RequestError> for SortableError {
    fn from(err: RequestError) -> Self {
        SortableError::Request(err)
    }
}

// =============================================================================
// Conversions from external errors
// =============================================================================

impl From<std::io::Error> for SortableError {
    fn from(err: std::io::Error) -> Self {
        SortableError::Config(ConfigError::IoError {
            message: err.to_string(),
        })
    }
}

impl From<serde_yaml::Error> for SortableError {
    fn from(err: serde_yaml::Error) -> Self {
        SortableError::Config(ConfigError::ParseError {
            file: None,
            message: err.to_string(),
        })
    }
}

// =============================================================================
// Result type alias
// =============================================================================

/// A specialized Result type for sortable operations
pub type SortableResult<T> = Result<T, SortableError>;
