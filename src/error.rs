//! The top-level error type aggregating every crate's own error into one
//! value the CLI can report and map to an exit code.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Parser(#[from] kingpin_parser::err::Error),

    #[error(transparent)]
    Reactor(#[from] kingpin_reactor::Error),

    #[error("invalid command line arguments: {0}")]
    Usage(String),
}

pub type Result<T> = std::result::Result<T, Error>;
