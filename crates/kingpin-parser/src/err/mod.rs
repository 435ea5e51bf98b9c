//! Error types for the Token Substituter and Document Loader.
//!
//! Every variant here is fatal at load time or at instantiation — this
//! crate never produces a recoverable actor failure (§4.1, §4.2).

use thiserror::Error;

/// Token substitution / document loading error type.
#[derive(Debug, Error)]
pub enum Error {
    /// One or more `%NAME%`/`{NAME}` references had no binding and no
    /// inline default. All unresolved names are accumulated into one
    /// report rather than failing on the first.
    #[error("missing token(s): {}", .names.join(", "))]
    MissingToken { names: Vec<String> },

    /// The document source names an unsupported scheme or extension
    /// (`ftp://`, or a file with no recognized syntax).
    #[error("invalid script name: {0}")]
    InvalidScriptName(String),

    /// The parsed document failed schema validation.
    #[error("schema invalid: {0}")]
    SchemaInvalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
