//! The actor specification as read from a parsed document node (§3), and
//! the build-time context every constructor receives.

use std::sync::Arc;

use kingpin_core::{Context, KingpinConfig};
use kingpin_parser::loader::DocumentLoader;
use serde_json::{Map, Value};

use crate::err::{Error, Result};
use crate::registry::Registry;

/// The raw per-node shape from the document, before option validation.
/// `options`, `condition`, `warn_on_failure`, and `timeout` are still
/// whatever the document contained — substitution and defaulting happen
/// during construction, not here.
#[derive(Debug, Clone)]
pub struct RawActorSpec {
    pub actor: String,
    pub desc: Option<String>,
    pub options: Map<String, Value>,
    pub condition: Value,
    pub warn_on_failure: Value,
    pub timeout: Option<Value>,
}

impl RawActorSpec {
    /// Parses a document node, rewriting a bare top-level array into the
    /// equivalent `group.Sync` node (§3).
    pub fn from_value(value: &Value) -> Result<Self> {
        let node = if let Some(acts) = value.as_array() {
            Value::Object(Map::from_iter([(
                "actor".to_string(),
                Value::String("group.Sync".to_string()),
            ), (
                "options".to_string(),
                Value::Object(Map::from_iter([(
                    "acts".to_string(),
                    Value::Array(acts.clone()),
                )])),
            )]))
        } else {
            value.clone()
        };

        let obj = node
            .as_object()
            .ok_or_else(|| Error::Internal("actor node must be an object or array".to_string()))?;

        let actor = obj
            .get("actor")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Internal("actor node missing required 'actor' field".to_string()))?
            .to_string();

        let desc = obj.get("desc").and_then(Value::as_str).map(str::to_string);
        let options = obj.get("options").and_then(Value::as_object).cloned().unwrap_or_default();
        let condition = obj.get("condition").cloned().unwrap_or(Value::Bool(true));
        let warn_on_failure = obj.get("warn_on_failure").cloned().unwrap_or(Value::Bool(false));
        let timeout = obj.get("timeout").cloned();

        Ok(Self {
            actor,
            desc,
            options,
            condition,
            warn_on_failure,
            timeout,
        })
    }
}

/// Shared build-time state threaded through every constructor: the
/// process-wide config, a document loader for Macro's sub-document
/// fetches, and the contextual tokens inherited from the enclosing group.
#[derive(Clone)]
pub struct BuildCtx {
    pub config: Arc<KingpinConfig>,
    pub loader: Arc<DocumentLoader>,
    pub registry: Arc<Registry>,
    pub context: Context,
    /// Whether this pass is a rehearsal (dry) pass — baked into every
    /// actor instance at construction, per §3's "dry flag" invariant.
    pub dry: bool,
}

impl BuildCtx {
    pub fn new(config: Arc<KingpinConfig>, loader: Arc<DocumentLoader>, registry: Arc<Registry>, dry: bool) -> Self {
        Self {
            config,
            loader,
            registry,
            context: Context::new(),
            dry,
        }
    }

    /// Returns a copy of this context with `context` replaced — used when
    /// a group injects its own keys or fans out over `contexts` (§4.6).
    pub fn with_context(&self, context: Context) -> Self {
        Self {
            config: self.config.clone(),
            loader: self.loader.clone(),
            registry: self.registry.clone(),
            context,
            dry: self.dry,
        }
    }
}
