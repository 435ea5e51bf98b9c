//! Actor Core's registry (C4): maps a namespaced actor identifier
//! (`"group.Sync"`, `"misc.Sleep"`, `"ensure_state.Node"`, ...) to the
//! constructor that builds it.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, OnceLock};

use crate::err::{Error, Result};
use crate::spec::{BuildCtx, RawActorSpec};
use crate::ActorNode;

type BuildFuture = Pin<Box<dyn Future<Output = Result<ActorNode>> + Send>>;

/// A constructor builds one `ActorNode` from its raw spec and the
/// build-time context. Boxed because the document tree is built
/// recursively and each class's constructor may itself recurse into
/// children (Group) or a sub-document (Macro).
pub type ActorConstructor = Arc<dyn Fn(RawActorSpec, BuildCtx) -> BuildFuture + Send + Sync>;

/// The table of known actor identifiers. Populated once at process
/// start by [`default_registry`]; callers needing custom actors (the
/// root crate's `misc.*` namespace, say) extend a fresh `Registry`
/// rather than mutate the shared default.
#[derive(Clone, Default)]
pub struct Registry {
    constructors: HashMap<String, ActorConstructor>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, id: impl Into<String>, constructor: ActorConstructor) {
        self.constructors.insert(id.into(), constructor);
    }

    pub fn merge(mut self, other: Registry) -> Self {
        self.constructors.extend(other.constructors);
        self
    }

    pub async fn build(&self, raw: RawActorSpec, ctx: BuildCtx) -> Result<ActorNode> {
        let constructor = self
            .constructors
            .get(&raw.actor)
            .cloned()
            .ok_or_else(|| Error::InvalidActor { id: raw.actor.clone() })?;
        constructor(raw, ctx).await
    }

    pub fn contains(&self, id: &str) -> bool {
        self.constructors.contains_key(id)
    }
}

static GROUP_REGISTRY: OnceLock<Registry> = OnceLock::new();

/// The registry for every actor class this crate defines: `group.Sync`,
/// `group.Async`, `macro.Macro`, and `ensure_state.Node`. The root crate
/// merges its own `misc.*` registry on top of this one before building
/// anything (§4.4).
pub fn core_registry() -> &'static Registry {
    GROUP_REGISTRY.get_or_init(|| {
        let mut registry = Registry::new();
        crate::group::register(&mut registry);
        crate::macro_actor::register(&mut registry);
        crate::ensure_state::register(&mut registry);
        registry
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_registry_knows_the_built_in_classes() {
        let registry = core_registry();
        assert!(registry.contains("group.Sync"));
        assert!(registry.contains("group.Async"));
        assert!(registry.contains("macro.Macro"));
        assert!(registry.contains("ensure_state.Node"));
    }
}
