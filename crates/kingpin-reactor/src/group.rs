//! Group actors (C6): `group.Sync` runs its children in order, `group.Async`
//! runs them concurrently under a bounded semaphore. Both fan out over the
//! cartesian product of `contexts` (if given) and `acts` (§4.6).

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use kingpin_core::context::merge;
use kingpin_core::Context;
use serde_json::{Map, Value};
use tokio::sync::Semaphore;

use crate::actor::{resolve_bool_field, resolve_desc, resolve_timeout, ActorBody};
use crate::err::{Error, Result};
use crate::outcome::{aggregate, ActorFailure, ActorResult};
use crate::registry::Registry;
use crate::spec::{BuildCtx, RawActorSpec};
use crate::ActorNode;

pub fn register(registry: &mut Registry) {
    registry.register(
        "group.Sync",
        Arc::new(|raw, ctx| Box::pin(construct(raw, ctx, GroupKind::Sync))),
    );
    registry.register(
        "group.Async",
        Arc::new(|raw, ctx| Box::pin(construct(raw, ctx, GroupKind::Async))),
    );
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum GroupKind {
    Sync,
    Async,
}

async fn construct(raw: RawActorSpec, ctx: BuildCtx, kind: GroupKind) -> Result<ActorNode> {
    let condition = resolve_bool_field(&raw.condition, &ctx.context)?;
    let warn_on_failure = resolve_bool_field(&raw.warn_on_failure, &ctx.context)?;
    let default_timeout = ctx.config.default_group_timeout();
    let timeout = resolve_timeout(raw.timeout.as_ref(), &ctx.context, default_timeout)?;
    let default_desc = match kind {
        GroupKind::Sync => "sync group",
        GroupKind::Async => "async group",
    };
    let desc = resolve_desc(raw.desc.as_deref(), default_desc, &ctx.context, &raw.options)?;

    let acts = raw
        .options
        .get("acts")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::Internal("group requires an 'acts' array".to_string()))?;

    let contexts = parse_contexts(&raw.options, &ctx).await?;

    let mut children = Vec::with_capacity(acts.len() * contexts.len().max(1));
    let iterations: Vec<Context> = if contexts.is_empty() {
        vec![Context::new()]
    } else {
        contexts
    };

    for iteration in &iterations {
        let merged = merge(&ctx.context, iteration);
        let child_ctx = ctx.with_context(merged);
        for act in acts {
            let child = Box::pin(crate::build::build_actor(act, &child_ctx)).await?;
            children.push(child);
        }
    }

    let body: Arc<dyn ActorBody> = match kind {
        GroupKind::Sync => Arc::new(SyncGroupBody {
            children,
            dry: ctx.dry,
        }),
        GroupKind::Async => {
            // `0` means unbounded (§4.6); the `num_cpus` default only
            // applies when the key is absent altogether.
            let concurrency = match raw.options.get("concurrency") {
                None => Some(num_cpus::get()),
                Some(v) => match v.as_u64() {
                    Some(0) => None,
                    Some(n) => Some(n as usize),
                    None => return Err(Error::Internal("'concurrency' must be an integer".to_string())),
                },
            };
            Arc::new(AsyncGroupBody {
                children,
                concurrency,
            })
        }
    };

    Ok(ActorNode::new(desc, condition, warn_on_failure, timeout, ctx.dry, body))
}

async fn parse_contexts(options: &Map<String, Value>, ctx: &BuildCtx) -> Result<Vec<Context>> {
    let Some(raw_contexts) = options.get("contexts") else {
        return Ok(Vec::new());
    };

    // A string names a file holding the list instead of inlining it; the
    // referenced file is itself phase-1-substituted using the group's
    // inherited token set before being parsed (§4.6).
    let array_value;
    let array = match raw_contexts {
        Value::String(source) => {
            array_value = ctx.loader.load_unvalidated(source, &ctx.context).await?;
            array_value
                .as_array()
                .ok_or_else(|| Error::Internal(format!("'{source}' must contain an array of objects")))?
        }
        other => other
            .as_array()
            .ok_or_else(|| Error::Internal("'contexts' must be an array, or a path to one".to_string()))?,
    };

    array
        .iter()
        .map(|entry| {
            let object = entry
                .as_object()
                .ok_or_else(|| Error::Internal("each 'contexts' entry must be an object".to_string()))?;
            Ok(object
                .iter()
                .map(|(k, v)| (k.clone(), value_to_string(v)))
                .collect())
        })
        .collect()
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

struct SyncGroupBody {
    children: Vec<ActorNode>,
    dry: bool,
}

#[async_trait]
impl ActorBody for SyncGroupBody {
    async fn run(&self) -> ActorResult {
        if self.dry {
            // Rehearsal runs every child regardless of earlier failures so
            // the operator sees the whole plan, then reports the worst
            // outcome across all of them (§4.6).
            let mut outcomes = Vec::with_capacity(self.children.len());
            for child in &self.children {
                outcomes.push(child.run().await);
            }
            aggregate(outcomes.iter())
        } else {
            for child in &self.children {
                child.run().await?;
            }
            Ok(())
        }
    }
}

struct AsyncGroupBody {
    children: Vec<ActorNode>,
    /// `None` means unbounded (`concurrency: 0` in the document, §4.6).
    concurrency: Option<usize>,
}

#[async_trait]
impl ActorBody for AsyncGroupBody {
    async fn run(&self) -> ActorResult {
        // An unbounded group just never acquires a permit; sizing the
        // semaphore to the child count would work too but this skips the
        // allocation and the (infallible here) acquire entirely.
        let semaphore = self.concurrency.map(Semaphore::new);
        let mut pending = FuturesUnordered::new();

        for child in &self.children {
            pending.push(async {
                let _permit = match &semaphore {
                    Some(semaphore) => Some(
                        semaphore
                            .acquire()
                            .await
                            .map_err(|e| ActorFailure::fatal(format!("concurrency semaphore closed: {e}")))?,
                    ),
                    None => None,
                };
                child.run().await
            });
        }

        let mut outcomes = Vec::with_capacity(self.children.len());
        while let Some(outcome) = pending.next().await {
            outcomes.push(outcome);
        }
        aggregate(outcomes.iter())
    }
}

#[cfg(test)]
mockall::mock! {
    pub ActorBody {}

    #[async_trait]
    impl ActorBody for ActorBody {
        async fn run(&self) -> ActorResult;
    }
}
