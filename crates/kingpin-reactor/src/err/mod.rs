//! Construction-time error type for the reactor crate.
//!
//! Every variant here happens during the build phase — resolving an actor
//! identifier, substituting an actor's options, or validating them — and
//! is always fatal (§8 invariant 2: "pre-flight completeness"). Failures
//! that happen *during* execution of an already-built actor are a
//! different type, [`crate::outcome::ActorFailure`], which distinguishes
//! Recoverable from Fatal per §7.

use thiserror::Error;

/// Reactor build-phase error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown actor identifier: {id}")]
    InvalidActor { id: String },

    #[error("missing contextual token(s): {}", .names.join(", "))]
    MissingContext { names: Vec<String> },

    #[error("parser error: {0}")]
    Parser(#[from] kingpin_parser::err::Error),

    #[error("analysis error: {0}")]
    Analysis(#[from] kingpin_analysis::err::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
