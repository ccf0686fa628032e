// In: src/error.rs

//! This module defines the single, unified error type for the entire writer.
//! It uses the `thiserror` crate to provide ergonomic, context-aware error handling.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrcError {
    // =========================================================================
    // === Caller-facing Errors (schema and data disagreements)
    // =========================================================================
    /// The textual type description could not be parsed.
    #[error("Schema error: {0}")]
    Schema(String),

    /// The number of supplied values or columns does not match the schema.
    #[error("Arity mismatch: expected {expected} {what}, got {found}")]
    Arity {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    /// A value's runtime shape disagrees with the schema node it was routed to.
    #[error("Type mismatch at '{path}': expected {expected}, got {found}")]
    TypeMismatch {
        path: String,
        expected: String,
        found: String,
    },

    #[error("Invalid writer configuration: {0}")]
    Config(String),

    // =========================================================================
    // === Lifecycle Errors
    // =========================================================================
    #[error("Writer is closed")]
    ClosedWriter,

    /// A previous flush failed part-way; the output can no longer be trusted.
    #[error("Writer is unusable after a failed flush")]
    Poisoned,

    // =========================================================================
    // === External Error Wrappers (Using #[from] for automatic conversion)
    // =========================================================================
    /// An error originating from the sink (e.g., disk full, broken pipe).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error from the Serde JSON library, during footer serialization.
    #[error("Serde JSON error: {0}")]
    Serialization(#[from] serde_json::Error),

    // =========================================================================
    // === Low-Level Kernel Errors
    // =========================================================================
    /// A codec failed internally. Never expected in practice; fatal.
    #[error("Compression codec failure: {0}")]
    Compression(String),

    #[error("LEB128 decoding error: {0}")]
    Leb128DecodeError(String),

    #[error("RLE decoding error: {0}")]
    RleDecodeError(String),

    #[error("File format error: {0}")]
    FormatError(String),

    #[error("Internal logic error (this is a bug): {0}")]
    InternalError(String),
}

impl OrcError {
    /// Shorthand for building a `TypeMismatch` from displayable parts.
    pub(crate) fn mismatch(
        path: &str,
        expected: impl std::fmt::Display,
        found: impl std::fmt::Display,
    ) -> Self {
        OrcError::TypeMismatch {
            path: path.to_string(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    /// `true` for errors after which the writer refuses further work.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            OrcError::Io(_)
                | OrcError::Poisoned
                | OrcError::Compression(_)
                | OrcError::Serialization(_)
                | OrcError::InternalError(_)
        )
    }
}
