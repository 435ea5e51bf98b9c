//! The actor-node JSON Schema (§6) that the Document Loader validates a
//! parsed document against, after phase-1 substitution and before the
//! tree is handed to the Actor Registry.

use serde_json::{json, Value};

use crate::err::{Error, Result};

/// Returns the JSON Schema describing one actor node, as specified in §6.
/// `options` is intentionally left un-typed at this level (`true`, i.e.
/// "any object") — actor-specific option shapes are the Option
/// Validator's job (C3), not the loader's.
pub fn actor_node_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "actor": { "type": "string" },
            "desc": { "type": "string" },
            "options": { "type": "object" },
            "condition": { "type": ["boolean", "string"] },
            "warn_on_failure": { "type": ["boolean", "string"] },
            "timeout": { "type": ["number", "integer", "string"] }
        },
        "required": ["actor"],
        "additionalProperties": false
    })
}

/// Validates `value` against the actor-node schema. A bare top-level array
/// is accepted too: it is equivalent to a single `group.Sync` node (§3)
/// and is rewritten to that shape before validation by the caller, not
/// here — this function only ever sees object nodes.
pub fn validate_actor_node(value: &Value) -> Result<()> {
    let schema = actor_node_schema();
    let compiled = jsonschema::JSONSchema::compile(&schema)
        .map_err(|e| Error::Internal(format!("invalid built-in schema: {e}")))?;

    if let Err(errors) = compiled.validate(value) {
        let message = errors
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(Error::SchemaInvalid(message));
    }
    Ok(())
}

/// Recursively validates every actor node in a tree: the root, and (for
/// group-shaped nodes) every entry of `options.acts`, and (for macro
/// nodes) nothing further — a Macro's sub-document is validated
/// independently when it is itself loaded.
///
/// A bare array at any position is the implicit `group.Sync` shorthand
/// (§3) and is validated by recursing into its entries rather than
/// against the object schema, which a plain array could never satisfy.
pub fn validate_tree(value: &Value) -> Result<()> {
    if let Some(acts) = value.as_array() {
        for child in acts {
            validate_tree(child)?;
        }
        return Ok(());
    }

    validate_actor_node(value)?;
    if let Some(acts) = value.pointer("/options/acts").and_then(Value::as_array) {
        for child in acts {
            validate_tree(child)?;
        }
    }
    Ok(())
}
