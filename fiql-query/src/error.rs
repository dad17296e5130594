//! Error types for predicate and order clause building.
//!
//! Every failure in this crate is scoped to a single build call. Predicate
//! building collects all resolution problems it finds in one pass and reports
//! them together as [`FiqlError::Rejected`]; order clause building stops at the
//! first malformed token.
//!
//! # Error Codes
//!
//! Error codes follow a pattern: F{category}{number}
//! - 1xxx: Resolution errors (unknown selector, argument type, conversion)
//! - 2xxx: Sort string errors
//! - 3xxx: Catalog declaration errors
//! - 7xxx: Configuration errors
//!
//! ```rust
//! use fiql_query::{ErrorCode, FiqlError};
//!
//! let err = FiqlError::invalid_selector("nme");
//! assert_eq!(err.code(), ErrorCode::InvalidSelector);
//! assert_eq!(err.code().code(), "F1001");
//! ```

// These warnings are false positives - the fields are read by the derive macros
#![allow(unused_assignments)]

use std::fmt;

use miette::Diagnostic;
use thiserror::Error;

use crate::catalog::TypeTag;

/// Result type for fiql operations.
pub type FiqlResult<T> = Result<T, FiqlError>;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Selector not present in the field catalog (F1001).
    InvalidSelector = 1001,
    /// Argument kind incompatible with the selector's type (F1002).
    InvalidArgumentType = 1002,
    /// Argument could not be converted to the expected type (F1003).
    ArgumentConversionFailure = 1003,
    /// One or more resolution errors rejected the filter (F1004).
    Rejected = 1004,
    /// Unrecognized operator or type name (F1005).
    UnknownToken = 1005,

    /// Malformed sort token (F2001).
    InvalidOrderBySyntax = 2001,

    /// Malformed field annotation (F3001).
    InvalidAnnotation = 3001,

    /// Invalid configuration (F7001).
    InvalidConfiguration = 7001,
    /// Configuration file could not be read (F7002).
    ConfigurationIo = 7002,
}

impl ErrorCode {
    /// Get the error code string (e.g., "F1001").
    pub fn code(&self) -> String {
        format!("F{}", *self as u16)
    }

    /// Get a short description of the error code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::InvalidSelector => "Invalid selector",
            Self::InvalidArgumentType => "Invalid argument type",
            Self::ArgumentConversionFailure => "Argument conversion failure",
            Self::Rejected => "Filter rejected",
            Self::UnknownToken => "Unknown token",
            Self::InvalidOrderBySyntax => "Invalid order by syntax",
            Self::InvalidAnnotation => "Invalid field annotation",
            Self::InvalidConfiguration => "Invalid configuration",
            Self::ConfigurationIo => "Configuration file unreadable",
        }
    }

    /// Whether the error was caused by the filter or sort input rather than
    /// by how the adapter was set up.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidSelector
                | Self::InvalidArgumentType
                | Self::ArgumentConversionFailure
                | Self::Rejected
                | Self::UnknownToken
                | Self::InvalidOrderBySyntax
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Failure of one of the typed argument accessors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("`{literal}` is not a valid {target}")]
pub struct ConversionError {
    /// The literal that failed to convert.
    pub literal: String,
    /// Human readable name of the target type.
    pub target: &'static str,
}

impl ConversionError {
    pub(crate) fn new(literal: impl Into<String>, target: &'static str) -> Self {
        Self {
            literal: literal.into(),
            target,
        }
    }
}

/// Errors produced while building predicates, order clauses, catalogs or
/// loading configuration.
#[derive(Error, Debug, Diagnostic)]
pub enum FiqlError {
    /// The selector has no entry in the field catalog.
    #[error("invalid selector: `{selector}`")]
    #[diagnostic(
        code(fiql::invalid_selector),
        help("only fields registered in the field catalog can be filtered or sorted")
    )]
    InvalidSelector { selector: String },

    /// The argument's value kind cannot be compared with the selector's type.
    #[error("invalid type of argument `{argument}` for selector `{selector}`, expected {expected}")]
    #[diagnostic(code(fiql::invalid_argument_type))]
    InvalidArgumentType {
        selector: String,
        argument: String,
        expected: TypeTag,
    },

    /// The argument looked like the expected kind but did not parse.
    #[error("could not convert argument `{argument}` for selector `{selector}`")]
    #[diagnostic(code(fiql::argument_conversion_failure))]
    ArgumentConversionFailure {
        selector: String,
        argument: String,
        #[source]
        source: ConversionError,
    },

    /// A sort token is malformed or names an unknown field.
    #[error("invalid order by selector: `{token}`")]
    #[diagnostic(
        code(fiql::invalid_order_by_syntax),
        help("sort tokens are `+alias` or `-alias`, separated by `;`")
    )]
    InvalidOrderBySyntax { token: String },

    /// The filter was rejected; `errors` holds every problem in discovery order.
    #[error("filter rejected with {} error(s)", .errors.len())]
    #[diagnostic(code(fiql::rejected))]
    Rejected {
        #[related]
        errors: Vec<FiqlError>,
    },

    /// A comparison operator or type name that is not recognized.
    #[error("unknown {kind} `{token}`")]
    #[diagnostic(code(fiql::unknown_token))]
    UnknownToken { kind: &'static str, token: String },

    /// A catalog registration row carries an unusable annotation.
    #[error("invalid annotation `{annotation}` on field `{field}`: {message}")]
    #[diagnostic(code(fiql::invalid_annotation))]
    InvalidAnnotation {
        field: String,
        annotation: String,
        message: String,
    },

    /// Configuration error.
    #[error("configuration error: {message}")]
    #[diagnostic(code(fiql::config_error))]
    Config { message: String },

    /// Error reading a configuration file.
    #[error("failed to read file: {path}")]
    #[diagnostic(code(fiql::io_error))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error.
    #[error("failed to parse TOML")]
    #[diagnostic(code(fiql::toml_error))]
    Toml {
        #[source]
        source: toml::de::Error,
    },
}

impl FiqlError {
    /// Create an invalid selector error.
    pub fn invalid_selector(selector: impl Into<String>) -> Self {
        Self::InvalidSelector {
            selector: selector.into(),
        }
    }

    /// Create an invalid argument type error.
    pub fn invalid_argument_type(
        selector: impl Into<String>,
        argument: impl Into<String>,
        expected: TypeTag,
    ) -> Self {
        Self::InvalidArgumentType {
            selector: selector.into(),
            argument: argument.into(),
            expected,
        }
    }

    /// Create an argument conversion error.
    pub fn conversion_failure(
        selector: impl Into<String>,
        argument: impl Into<String>,
        source: ConversionError,
    ) -> Self {
        Self::ArgumentConversionFailure {
            selector: selector.into(),
            argument: argument.into(),
            source,
        }
    }

    /// Create an invalid order by error.
    pub fn invalid_order_by(token: impl Into<String>) -> Self {
        Self::InvalidOrderBySyntax {
            token: token.into(),
        }
    }

    /// Create an unknown token error.
    pub fn unknown_token(kind: &'static str, token: impl Into<String>) -> Self {
        Self::UnknownToken {
            kind,
            token: token.into(),
        }
    }

    /// Create an invalid annotation error.
    pub fn invalid_annotation(
        field: impl Into<String>,
        annotation: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidAnnotation {
            field: field.into(),
            annotation: annotation.into(),
            message: message.into(),
        }
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidSelector { .. } => ErrorCode::InvalidSelector,
            Self::InvalidArgumentType { .. } => ErrorCode::InvalidArgumentType,
            Self::ArgumentConversionFailure { .. } => ErrorCode::ArgumentConversionFailure,
            Self::InvalidOrderBySyntax { .. } => ErrorCode::InvalidOrderBySyntax,
            Self::Rejected { .. } => ErrorCode::Rejected,
            Self::UnknownToken { .. } => ErrorCode::UnknownToken,
            Self::InvalidAnnotation { .. } => ErrorCode::InvalidAnnotation,
            Self::Config { .. } | Self::Toml { .. } => ErrorCode::InvalidConfiguration,
            Self::Io { .. } => ErrorCode::ConfigurationIo,
        }
    }

    /// All individual errors carried by this error.
    ///
    /// For [`FiqlError::Rejected`] these are the accumulated errors; any other
    /// variant yields itself.
    pub fn errors(&self) -> &[FiqlError] {
        match self {
            Self::Rejected { errors, .. } => errors,
            other => std::slice::from_ref(other),
        }
    }

    /// The first individual error carried by this error.
    pub fn first(&self) -> Option<&FiqlError> {
        self.errors().first()
    }

    /// Check if this is a composite of accumulated errors.
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

/// Ordered accumulator for errors found during a single build pass.
#[derive(Debug, Default)]
pub struct ErrorList {
    errors: Vec<FiqlError>,
}

impl ErrorList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error.
    pub fn push(&mut self, error: FiqlError) {
        self.errors.push(error);
    }

    /// Check whether any error was recorded.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Number of recorded errors.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Check whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// The first recorded error.
    pub fn first(&self) -> Option<&FiqlError> {
        self.errors.first()
    }

    /// All recorded errors in discovery order.
    pub fn errors(&self) -> &[FiqlError] {
        &self.errors
    }

    /// Return `value` if nothing was recorded, otherwise the composite error.
    pub fn finish<T>(self, value: T) -> FiqlResult<T> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(FiqlError::Rejected {
                errors: self.errors,
            })
        }
    }
}
