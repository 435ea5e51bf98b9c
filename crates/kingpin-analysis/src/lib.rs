//! The Option Validator (C3): type-checks and custom-validates an actor's
//! options against its declared schema.

pub mod err;
pub mod types;
pub mod validator;

pub use err::{Error, Result};
pub use types::{OptionRequirement, OptionSchema, OptionSpec, OptionType};
pub use validator::validate_options;
