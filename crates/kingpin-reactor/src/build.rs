//! The recursive entry point every actor class's constructor calls to
//! build its children: parse the raw node, then dispatch to whichever
//! constructor the registry has for its `actor` identifier.

use serde_json::Value;

use crate::err::Result;
use crate::spec::{BuildCtx, RawActorSpec};
use crate::ActorNode;

pub async fn build_actor(value: &Value, ctx: &BuildCtx) -> Result<ActorNode> {
    let raw = RawActorSpec::from_value(value)?;
    let registry = ctx.registry.clone();
    registry.build(raw, ctx.clone()).await
}
