//! Actor classes owned by the root crate rather than `kingpin-reactor`:
//! the `misc` namespace.

pub mod misc;

use kingpin_reactor::Registry;

/// The full registry this binary builds actors from: every class
/// `kingpin-reactor` registers, plus `misc.*`.
pub fn full_registry() -> Registry {
    let mut registry = Registry::new();
    registry = registry.merge(kingpin_reactor::core_registry().clone());
    misc::register(&mut registry);
    registry
}

/// Documentation text for `--explain --actor ID`. Returns `None` for an
/// identifier with no canned explanation.
pub fn explain(actor_id: &str) -> Option<&'static str> {
    misc::explain(actor_id).or_else(|| match actor_id {
        "group.Sync" => Some("group.Sync: runs options.acts in order; fans out over options.contexts if given."),
        "group.Async" => {
            Some("group.Async: runs options.acts concurrently, bounded by options.concurrency (default: CPU count).")
        }
        "macro.Macro" => {
            Some("macro.Macro: loads the document at options.macro and runs it as an isolated child tree.")
        }
        "ensure_state.Node" => {
            Some("ensure_state.Node: reconciles a JSON-file-backed resource toward options.state (present/absent) and its other options as managed properties.")
        }
        _ => None,
    })
}
