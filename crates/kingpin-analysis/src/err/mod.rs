//! Error types for the Option Validator. Every variant here is fatal
//! (`InvalidOptions` in spec terms) — a malformed option schema or input
//! always aborts the build, never surfaces as a recoverable actor failure.

use thiserror::Error;

/// Option-validation error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown option: {name}")]
    UnknownOption { name: String },

    #[error("missing required option: {name}")]
    MissingRequiredOption { name: String },

    #[error("invalid option '{name}': {message}")]
    InvalidOption { name: String, message: String },

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
