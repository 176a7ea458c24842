//! Base error type.
//!
//! Higher crates define their own enums and wrap `CoreError` as one variant
//! through `#[from]`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),
}

/// Shorthand result type for `cs-core`.
pub type CoreResult<T> = Result<T, CoreError>;
