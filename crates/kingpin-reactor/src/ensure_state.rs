//! The Ensure-State mixin (C8): a declarative `get`/`compare`/`set`
//! reconciliation loop over an actor's managed sub-properties, plus
//! `state: present|absent` handling for the resource itself.
//!
//! [`EnsureStateResource`] is the narrow interface a concrete resource
//! actor implements; [`EnsureStateBody`] is the generic lifecycle that
//! drives it. `ensure_state.Node` is the one concrete resource this crate
//! registers: a toy JSON-file-backed resource, useful for tests and
//! scenario scripts that want to exercise the reconciliation loop without
//! a real integration.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::actor::{resolve_bool_field, resolve_desc, resolve_timeout, substitute_options};
use crate::actor::ActorBody;
use crate::err::{Error, Result};
use crate::outcome::{ActorFailure, ActorResult};
use crate::registry::Registry;
use crate::spec::{BuildCtx, RawActorSpec};
use crate::ActorNode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Present,
    Absent,
}

impl Presence {
    fn parse(value: &str) -> Result<Self> {
        match value {
            "present" => Ok(Presence::Present),
            "absent" => Ok(Presence::Absent),
            other => Err(Error::Internal(format!(
                "'state' must be \"present\" or \"absent\", got {other:?}"
            ))),
        }
    }
}

/// The interface a concrete resource embeds to get the reconcile loop
/// (§4.8). A default byte-equality `compare` is provided; resources with
/// richer comparison semantics (order-insensitive sets, normalized
/// numbers) override it.
#[async_trait]
pub trait EnsureStateResource: Send + Sync {
    /// Single read of any shared remote state, performed once per run
    /// before any property is reconciled.
    async fn precache(&self) -> ActorResult;
    async fn exists(&self) -> std::result::Result<bool, ActorFailure>;
    async fn create(&self) -> ActorResult;
    async fn delete(&self) -> ActorResult;
    async fn get(&self, property: &str) -> std::result::Result<Option<String>, ActorFailure>;
    async fn set(&self, property: &str, value: &str) -> ActorResult;

    fn compare(&self, want: &str, have: Option<&str>) -> bool {
        have.map(|h| h == want).unwrap_or(false)
    }
}

/// A managed property's desired value. `None` means the option carried
/// the `"undefined"` sentinel — the actor does not manage this property
/// at all (§4.8).
pub type ManagedProperties = Vec<(String, Option<String>)>;

pub struct EnsureStateBody<R: EnsureStateResource> {
    resource: R,
    state: Presence,
    managed: ManagedProperties,
    dry: bool,
}

impl<R: EnsureStateResource> EnsureStateBody<R> {
    pub fn new(resource: R, state: Presence, managed: ManagedProperties, dry: bool) -> Self {
        Self {
            resource,
            state,
            managed,
            dry,
        }
    }
}

#[async_trait]
impl<R: EnsureStateResource> ActorBody for EnsureStateBody<R> {
    async fn run(&self) -> ActorResult {
        self.resource.precache().await?;

        let exists = self.resource.exists().await?;
        match self.state {
            Presence::Absent => {
                if exists {
                    if self.dry {
                        tracing::info!("would delete resource (dry run)");
                        return Ok(());
                    }
                    return self.resource.delete().await;
                }
                return Ok(());
            }
            Presence::Present if !exists => {
                if self.dry {
                    tracing::info!("would create resource (dry run)");
                } else {
                    self.resource.create().await?;
                }
            }
            Presence::Present => {}
        }

        for (name, desired) in &self.managed {
            let Some(desired) = desired else {
                continue;
            };
            let have = self.resource.get(name).await?;
            if self.resource.compare(desired, have.as_deref()) {
                continue;
            }
            if self.dry {
                tracing::info!(property = %name, want = %desired, have = ?have, "would set (dry run)");
            } else {
                self.resource.set(name, desired).await?;
            }
        }

        Ok(())
    }
}

pub fn register(registry: &mut Registry) {
    registry.register("ensure_state.Node", Arc::new(|raw, ctx| Box::pin(construct(raw, ctx))));
}

const UNMANAGED_OPTIONS: &[&str] = &["path", "state"];
const UNDEFINED_SENTINEL: &str = "undefined";

async fn construct(raw: RawActorSpec, ctx: BuildCtx) -> Result<ActorNode> {
    let condition = resolve_bool_field(&raw.condition, &ctx.context)?;
    let warn_on_failure = resolve_bool_field(&raw.warn_on_failure, &ctx.context)?;
    let default_timeout = ctx.config.default_timeout();
    let timeout = resolve_timeout(raw.timeout.as_ref(), &ctx.context, default_timeout)?;
    let substituted = substitute_options(&raw.options, &ctx.context)?;
    let desc = resolve_desc(raw.desc.as_deref(), "ensure {path}", &ctx.context, &substituted)?;

    let path = substituted
        .get("path")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::Internal("ensure_state.Node requires a 'path' option".to_string()))?;

    let state_raw = substituted
        .get("state")
        .and_then(Value::as_str)
        .unwrap_or("present");
    let state = Presence::parse(state_raw)?;

    let managed = managed_properties(&substituted);

    let resource = FileStateResource::new(PathBuf::from(path));
    let body = EnsureStateBody::new(resource, state, managed, ctx.dry);

    Ok(ActorNode::new(
        desc,
        condition,
        warn_on_failure,
        timeout,
        ctx.dry,
        Arc::new(body),
    ))
}

fn managed_properties(options: &Map<String, Value>) -> ManagedProperties {
    options
        .iter()
        .filter(|(key, _)| !UNMANAGED_OPTIONS.contains(&key.as_str()))
        .map(|(key, value)| {
            let desired = match value {
                Value::String(s) if s == UNDEFINED_SENTINEL => None,
                other => Some(value_to_string(other)),
            };
            (key.clone(), desired)
        })
        .collect()
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// A toy resource: a single JSON object on disk, one key per managed
/// property. Exists purely so `ensure_state.Node` is constructible for
/// tests and ad-hoc scripts without a real backing integration.
struct FileStateResource {
    path: PathBuf,
    cache: Mutex<Option<Map<String, Value>>>,
}

impl FileStateResource {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            cache: Mutex::new(None),
        }
    }

    async fn write(&self, map: &Map<String, Value>) -> ActorResult {
        let text = serde_json::to_string_pretty(map)
            .map_err(|e| ActorFailure::fatal(format!("failed to encode state file: {e}")))?;
        tokio::fs::write(&self.path, text)
            .await
            .map_err(|e| ActorFailure::recoverable(format!("failed to write state file: {e}")))
    }
}

#[async_trait]
impl EnsureStateResource for FileStateResource {
    async fn precache(&self) -> ActorResult {
        let mut cache = self.cache.lock().await;
        if cache.is_some() {
            return Ok(());
        }
        *cache = Some(match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => serde_json::from_str(&text)
                .map_err(|e| ActorFailure::fatal(format!("state file is not valid JSON: {e}")))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(e) => return Err(ActorFailure::recoverable(format!("failed to read state file: {e}"))),
        });
        Ok(())
    }

    async fn exists(&self) -> std::result::Result<bool, ActorFailure> {
        Ok(tokio::fs::metadata(&self.path).await.is_ok())
    }

    async fn create(&self) -> ActorResult {
        let cache = self.cache.lock().await;
        let map = cache.clone().unwrap_or_default();
        drop(cache);
        self.write(&map).await
    }

    async fn delete(&self) -> ActorResult {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ActorFailure::recoverable(format!("failed to delete state file: {e}"))),
        }
    }

    async fn get(&self, property: &str) -> std::result::Result<Option<String>, ActorFailure> {
        let cache = self.cache.lock().await;
        let map = cache
            .as_ref()
            .ok_or_else(|| ActorFailure::fatal("precache() was not called before get()".to_string()))?;
        Ok(map.get(property).map(value_to_string))
    }

    async fn set(&self, property: &str, value: &str) -> ActorResult {
        let mut cache = self.cache.lock().await;
        let map = cache
            .get_or_insert_with(Map::new);
        map.insert(property.to_string(), Value::String(value.to_string()));
        let snapshot = map.clone();
        drop(cache);
        self.write(&snapshot).await
    }
}
