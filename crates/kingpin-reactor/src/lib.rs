//! Actor lifecycle, composition, and reconciliation primitives for the
//! Kingpin deployment engine (C4–C8): the registry actor classes resolve
//! through, the uniform construction-time error type, the execution-time
//! outcome taxonomy, the timeout shield, and `group`/`macro`/`ensure_state`
//! built in.

pub mod actor;
pub mod build;
pub mod dry;
pub mod ensure_state;
pub mod err;
pub mod group;
pub mod macro_actor;
pub mod outcome;
pub mod registry;
pub mod spec;
mod timeout;

pub use actor::{
    resolve_bool_field, resolve_desc, resolve_timeout, substitute_options, substitute_str, ActorBody,
    ActorNode,
};
pub use build::build_actor;
pub use dry::dry;
pub use err::{Error, Result};
pub use outcome::{ActorFailure, ActorResult, FailureKind};
pub use registry::{core_registry, ActorConstructor, Registry};
pub use spec::{BuildCtx, RawActorSpec};
pub use timeout::run_shielded;
