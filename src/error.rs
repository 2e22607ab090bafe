//! Error types for the instruction selector.
//!
//! Using thiserror for idiomatic error handling. Failure policy is coarse:
//! an unreadable input skips that resource, and any other fault aborts the
//! remaining lines of the resource it occurred in. An unresolved tile is
//! deliberately *not* an error (the emitter skips it).

use thiserror::Error;

/// Main error type for the parse/tile/emit pipeline.
#[derive(Error, Debug)]
pub enum SelectError {
    #[error("cannot read input {path}: {source}")]
    Input {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("unexpected token '{found}' in expression")]
    UnexpectedToken { found: String },

    #[error("trailing input after expression: '{found}'")]
    TrailingInput { found: String },

    #[error("code generation failed: {reason}")]
    CodeGeneration { reason: String },
}

/// Result type alias for selector operations.
pub type SelectResult<T> = Result<T, SelectError>;
