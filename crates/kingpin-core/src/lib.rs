//! Shared types and configuration plumbing for the Kingpin deployment engine.
//!
//! Every other crate in the workspace depends on this one for the context
//! map and the config struct built once at process start and threaded
//! through constructors.

pub mod config;
pub mod context;

pub use config::{FeatureFlags, KingpinConfig};
pub use context::Context;
