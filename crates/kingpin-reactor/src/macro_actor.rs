//! The Macro actor (C7): loads a sub-document and builds it into an
//! isolated sub-tree. Isolation means the sub-tree's own nodes never see
//! the calling context — only the literal `tokens` map (merged over the
//! ambient environment by the document loader) resolves its phase-1
//! `%NAME%` placeholders (§4.7).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use kingpin_core::Context;
use serde_json::{Map, Value};

use crate::actor::{resolve_bool_field, resolve_desc, resolve_timeout, substitute_str, ActorBody};
use crate::err::{Error, Result};
use crate::outcome::ActorResult;
use crate::registry::Registry;
use crate::spec::{BuildCtx, RawActorSpec};
use crate::ActorNode;

pub fn register(registry: &mut Registry) {
    registry.register("macro.Macro", Arc::new(|raw, ctx| Box::pin(construct(raw, ctx))));
}

async fn construct(raw: RawActorSpec, ctx: BuildCtx) -> Result<ActorNode> {
    let condition = resolve_bool_field(&raw.condition, &ctx.context)?;
    let warn_on_failure = resolve_bool_field(&raw.warn_on_failure, &ctx.context)?;
    let default_timeout = ctx.config.default_group_timeout();
    let timeout = resolve_timeout(raw.timeout.as_ref(), &ctx.context, default_timeout)?;
    let desc = resolve_desc(raw.desc.as_deref(), "macro", &ctx.context, &raw.options)?;

    let raw_target = raw
        .options
        .get("macro")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::Internal("macro actor requires a 'macro' target".to_string()))?;
    // The macro target is phase-2 substituted against the calling context,
    // same as desc and condition (§4.5).
    let target = substitute_str(raw_target, &ctx.context)?;

    let tokens = parse_tokens(&raw.options)?;
    let document = ctx.loader.load(&target, &tokens).await?;

    // The sub-document starts from an empty context: macro isolation means
    // the calling group's contextual tokens do not leak into it.
    let isolated_ctx = ctx.with_context(Context::new());
    let inner = Box::pin(crate::build::build_actor(&document, &isolated_ctx)).await?;

    Ok(ActorNode::new(
        desc,
        condition,
        warn_on_failure,
        timeout,
        ctx.dry,
        Arc::new(MacroBody { inner }),
    ))
}

fn parse_tokens(options: &Map<String, Value>) -> Result<HashMap<String, String>> {
    let Some(raw_tokens) = options.get("tokens") else {
        return Ok(HashMap::new());
    };
    let object = raw_tokens
        .as_object()
        .ok_or_else(|| Error::Internal("'tokens' must be an object".to_string()))?;
    Ok(object.iter().map(|(k, v)| (k.clone(), value_to_string(v))).collect())
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

struct MacroBody {
    inner: ActorNode,
}

#[async_trait]
impl ActorBody for MacroBody {
    async fn run(&self) -> ActorResult {
        self.inner.run().await
    }
}
