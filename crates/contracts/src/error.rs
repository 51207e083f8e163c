//! Layered error definitions
//!
//! Categorized by source: config / source / time

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Source Errors =====
    /// Source not found in a registry
    #[error("source not found: {source_id}")]
    SourceNotFound { source_id: String },

    /// Source id registered twice
    #[error("duplicate source id: {source_id}")]
    DuplicateSource { source_id: String },

    // ===== Time Errors =====
    /// Rational time construction or arithmetic error
    #[error("time error: {0}")]
    Time(#[from] timecode::TimeError),

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create source-not-found error
    pub fn source_not_found(source_id: impl Into<String>) -> Self {
        Self::SourceNotFound {
            source_id: source_id.into(),
        }
    }

    /// Create duplicate-source error
    pub fn duplicate_source(source_id: impl Into<String>) -> Self {
        Self::DuplicateSource {
            source_id: source_id.into(),
        }
    }
}
