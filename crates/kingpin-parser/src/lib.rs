//! Token substitution (C1) and document loading (C2) for the Kingpin
//! deployment engine.
//!
//! Two independent concerns share this crate because they share one
//! algorithm: the substituter is parameterized over a delimiter pair and a
//! token source, and the loader is simply "read text, run the substituter
//! in document-time mode, parse, validate".

pub mod err;
pub mod loader;
pub mod schema;
pub mod substitute;

pub use err::{Error, Result};
pub use loader::DocumentLoader;
pub use substitute::{substitute, substitute_value, Delimiter};
