//! Error handling and error types for gbcent-rust.
//!
//! All fallible operations in the crate return [`Result`], whose error type
//! [`GBCentError`] distinguishes the one unrecoverable training failure
//! (numeric divergence) from configuration, data and parameter-space misuse.
//! Insufficient support, insufficient gain and interrupted workers are normal
//! outcomes of the algorithm and are reported through return values, not
//! through this enum.

use std::io;
use thiserror::Error;

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum GBCentError {
    /// Configuration and validation errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The cumulative objective became NaN during optimization.
    #[error("Numeric divergence: objective became NaN after {instances} instances")]
    NumericDivergence { instances: usize },

    /// Tree construction errors
    #[error("Tree construction error: {message}")]
    TreeConstruction { message: String },

    /// Thread synchronization errors
    #[error("Threading error: {message}")]
    Threading { message: String },

    /// Lookup of a parameter name that was never declared (or was released)
    #[error("Unknown parameter: {name}")]
    UnknownParameter { name: String },

    /// Invalid input parameters
    #[error("Invalid parameter: {parameter} = {value}, {reason}")]
    InvalidParameter {
        parameter: String,
        value: String,
        reason: String,
    },

    /// Dimension mismatch errors
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: String, actual: String },

    /// Out of bounds access
    #[error("Index out of bounds: index {index}, length {length}")]
    IndexOutOfBounds { index: usize, length: usize },

    /// File I/O errors
    #[error("I/O error: {source}")]
    IO {
        #[from]
        source: io::Error,
    },

    /// JSON serialization errors
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    /// TOML parsing errors
    #[error("TOML error: {source}")]
    Toml {
        #[from]
        source: toml::de::Error,
    },
}

/// Type alias for Results using GBCentError
pub type Result<T> = std::result::Result<T, GBCentError>;

impl GBCentError {
    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        GBCentError::Config {
            message: message.into(),
        }
    }

    /// Create a numeric divergence error
    pub fn numeric_divergence(instances: usize) -> Self {
        GBCentError::NumericDivergence { instances }
    }

    /// Create a tree construction error
    pub fn tree_construction<S: Into<String>>(message: S) -> Self {
        GBCentError::TreeConstruction {
            message: message.into(),
        }
    }

    /// Create a threading error
    pub fn threading<S: Into<String>>(message: S) -> Self {
        GBCentError::Threading {
            message: message.into(),
        }
    }

    /// Create an unknown parameter error
    pub fn unknown_parameter<S: Into<String>>(name: S) -> Self {
        GBCentError::UnknownParameter { name: name.into() }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter<P, V, R>(parameter: P, value: V, reason: R) -> Self
    where
        P: Into<String>,
        V: Into<String>,
        R: Into<String>,
    {
        GBCentError::InvalidParameter {
            parameter: parameter.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a dimension mismatch error
    pub fn dimension_mismatch<E, A>(expected: E, actual: A) -> Self
    where
        E: Into<String>,
        A: Into<String>,
    {
        GBCentError::DimensionMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create an index out of bounds error
    pub fn index_out_of_bounds(index: usize, length: usize) -> Self {
        GBCentError::IndexOutOfBounds { index, length }
    }

    /// Whether this error aborts the current training invocation for good.
    pub fn is_numeric_divergence(&self) -> bool {
        matches!(self, GBCentError::NumericDivergence { .. })
    }

    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            GBCentError::Config { .. } => false,
            GBCentError::NumericDivergence { .. } => false,
            GBCentError::TreeConstruction { .. } => true,
            GBCentError::Threading { .. } => true,
            GBCentError::UnknownParameter { .. } => false,
            GBCentError::InvalidParameter { .. } => false,
            GBCentError::DimensionMismatch { .. } => false,
            GBCentError::IndexOutOfBounds { .. } => false,
            GBCentError::IO { .. } => false,
            GBCentError::Json { .. } => false,
            GBCentError::Toml { .. } => false,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            GBCentError::Config { .. } => "config",
            GBCentError::NumericDivergence { .. } => "numeric_divergence",
            GBCentError::TreeConstruction { .. } => "tree_construction",
            GBCentError::Threading { .. } => "threading",
            GBCentError::UnknownParameter { .. } => "unknown_parameter",
            GBCentError::InvalidParameter { .. } => "invalid_parameter",
            GBCentError::DimensionMismatch { .. } => "dimension_mismatch",
            GBCentError::IndexOutOfBounds { .. } => "index_out_of_bounds",
            GBCentError::IO { .. } => "io",
            GBCentError::Json { .. } => "json",
            GBCentError::Toml { .. } => "toml",
        }
    }
}

/// Convenience macros for error creation
#[macro_export]
macro_rules! config_error {
    ($msg:expr) => {
        $crate::core::error::GBCentError::config($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::core::error::GBCentError::config(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !($cond) {
            return Err($err.into());
        }
    };
}
