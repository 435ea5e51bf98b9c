//! The contextual-token map a group injects into its children at
//! instantiation (§3, "Context").

use std::collections::HashMap;

/// An unordered identifier→string mapping passed from a group to each
/// child at instantiation time, used to resolve `{NAME}` tokens.
///
/// Inheritance is explicit: a group may inject additional keys on top of
/// whatever it itself received, but a Macro never forwards its enclosing
/// context into the sub-document it loads (macro isolation, §4.7).
pub type Context = HashMap<String, String>;

/// Builds the context a group hands to the k-th block of children when
/// fanning out over `contexts` (§4.6): the enclosing context plus this
/// context element's own keys, which take precedence on collision.
pub fn merge(outer: &Context, element: &Context) -> Context {
    let mut merged = outer.clone();
    merged.extend(element.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}
