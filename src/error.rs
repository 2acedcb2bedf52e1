//! Error types for document access and form model building.

use thiserror::Error;

/// Structural errors that abort a form model build.
///
/// No partial model is produced when one of these is returned.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("operation id must not be empty")]
    MissingOperationId,

    #[error("operation '{operation}': method must not be empty")]
    MissingMethod { operation: String },

    #[error("operation '{operation}': path must not be empty")]
    MissingPath { operation: String },

    #[error("operation '{operation}': array schema at {path} has no items")]
    ArrayWithoutItems { operation: String, path: String },
}

/// Errors while reading operations out of a raw document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid document: {message}")]
    InvalidDocument { message: String },

    #[error("operation not found: {id}")]
    OperationNotFound { id: String },

    #[error("pointer not found: {pointer}")]
    Pointer { pointer: String },
}
