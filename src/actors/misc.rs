//! The `misc` namespace: trivial actors with no external integration,
//! used by the seed scenarios and ad-hoc (`--actor`) CLI runs. Neither
//! actor exists in the source specification's own namespace — both are
//! demo surface the CLI and test scenarios need something concrete to
//! exercise the engine with.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use kingpin_analysis::{validate_options, OptionSchema, OptionSpec, OptionType};
use kingpin_reactor::outcome::ActorResult;
use kingpin_reactor::registry::Registry;
use kingpin_reactor::spec::{BuildCtx, RawActorSpec};
use kingpin_reactor::{
    dry, resolve_bool_field, resolve_desc, resolve_timeout, substitute_options, ActorBody, ActorNode,
};
use serde_json::Value;

pub fn register(registry: &mut Registry) {
    registry.register("misc.Sleep", Arc::new(|raw, ctx| Box::pin(construct_sleep(raw, ctx))));
    registry.register("misc.Note", Arc::new(|raw, ctx| Box::pin(construct_note(raw, ctx))));
    registry.register("misc.Fail", Arc::new(|raw, ctx| Box::pin(construct_fail(raw, ctx))));
}

/// Documentation strings for `--explain`, keyed by actor identifier.
pub fn explain(actor_id: &str) -> Option<&'static str> {
    match actor_id {
        "misc.Sleep" => Some("misc.Sleep: sleeps for `sleep` seconds (default 1, numeric or numeric string). Skipped in dry mode."),
        "misc.Note" => Some("misc.Note: logs `message` at info level. No side effects; runs the same dry or real."),
        "misc.Fail" => Some("misc.Fail: always fails with `message` (default recoverable, `fatal=true` to escalate). For exercising error-handling paths."),
        _ => None,
    }
}

fn sleep_schema() -> OptionSchema {
    let mut schema = OptionSchema::new();
    schema.insert(
        "sleep",
        OptionSpec::optional(OptionType::Number, Value::from(1.0), "How long to sleep, in seconds."),
    );
    schema
}

/// `sleep` is declared `OptionType::Number`, which accepts either a
/// native JSON number or a numeric string — the latter is what a
/// `%TOKEN%`-substituted option looks like once the Document Loader has
/// run phase-1 substitution.
fn sleep_seconds(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(1.0),
        Value::String(s) => s.trim().parse().unwrap_or(1.0),
        _ => 1.0,
    }
}

async fn construct_sleep(raw: RawActorSpec, ctx: BuildCtx) -> kingpin_reactor::Result<ActorNode> {
    let condition = resolve_bool_field(&raw.condition, &ctx.context)?;
    let warn_on_failure = resolve_bool_field(&raw.warn_on_failure, &ctx.context)?;
    let timeout = resolve_timeout(raw.timeout.as_ref(), &ctx.context, ctx.config.default_timeout())?;

    let substituted = substitute_options(&raw.options, &ctx.context)?;
    let resolved = validate_options(&sleep_schema(), &substituted)
        .map_err(|e| kingpin_reactor::Error::Internal(e.to_string()))?;
    let seconds = sleep_seconds(resolved.get("sleep").unwrap_or(&Value::from(1.0)));

    let desc = resolve_desc(raw.desc.as_deref(), "sleep for {sleep}s", &ctx.context, &resolved)?;

    Ok(ActorNode::new(
        desc,
        condition,
        warn_on_failure,
        timeout,
        ctx.dry,
        Arc::new(SleepBody { seconds, dry: ctx.dry }),
    ))
}

struct SleepBody {
    seconds: f64,
    dry: bool,
}

#[async_trait]
impl ActorBody for SleepBody {
    async fn run(&self) -> ActorResult {
        let seconds = self.seconds;
        dry(self.dry, format!("slept {seconds}s"), || async move {
            tokio::time::sleep(Duration::from_secs_f64(seconds.max(0.0))).await;
            Ok(())
        })
        .await
    }
}

fn note_schema() -> OptionSchema {
    let mut schema = OptionSchema::new();
    schema.insert("message", OptionSpec::required(OptionType::String, "The message to log."));
    schema
}

async fn construct_note(raw: RawActorSpec, ctx: BuildCtx) -> kingpin_reactor::Result<ActorNode> {
    let condition = resolve_bool_field(&raw.condition, &ctx.context)?;
    let warn_on_failure = resolve_bool_field(&raw.warn_on_failure, &ctx.context)?;
    let timeout = resolve_timeout(raw.timeout.as_ref(), &ctx.context, ctx.config.default_timeout())?;

    let substituted = substitute_options(&raw.options, &ctx.context)?;
    let resolved = validate_options(&note_schema(), &substituted)
        .map_err(|e| kingpin_reactor::Error::Internal(e.to_string()))?;
    let message = resolved
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let desc = resolve_desc(raw.desc.as_deref(), "note: {message}", &ctx.context, &resolved)?;

    Ok(ActorNode::new(
        desc,
        condition,
        warn_on_failure,
        timeout,
        ctx.dry,
        Arc::new(NoteBody { message }),
    ))
}

struct NoteBody {
    message: String,
}

#[async_trait]
impl ActorBody for NoteBody {
    async fn run(&self) -> ActorResult {
        tracing::info!(note = %self.message, "note");
        Ok(())
    }
}

fn fail_schema() -> OptionSchema {
    let mut schema = OptionSchema::new();
    schema.insert(
        "message",
        OptionSpec::optional(OptionType::String, Value::from("misc.Fail always fails"), "The failure message."),
    );
    schema.insert(
        "fatal",
        OptionSpec::optional(OptionType::Boolean, Value::from(false), "Fail fatally instead of recoverably."),
    );
    schema
}

async fn construct_fail(raw: RawActorSpec, ctx: BuildCtx) -> kingpin_reactor::Result<ActorNode> {
    let condition = resolve_bool_field(&raw.condition, &ctx.context)?;
    let warn_on_failure = resolve_bool_field(&raw.warn_on_failure, &ctx.context)?;
    let timeout = resolve_timeout(raw.timeout.as_ref(), &ctx.context, ctx.config.default_timeout())?;

    let substituted = substitute_options(&raw.options, &ctx.context)?;
    let resolved = validate_options(&fail_schema(), &substituted)
        .map_err(|e| kingpin_reactor::Error::Internal(e.to_string()))?;
    let message = resolved.get("message").and_then(Value::as_str).unwrap_or_default().to_string();
    let fatal = resolved.get("fatal").and_then(Value::as_bool).unwrap_or(false);

    let desc = resolve_desc(raw.desc.as_deref(), "fail: {message}", &ctx.context, &resolved)?;

    Ok(ActorNode::new(
        desc,
        condition,
        warn_on_failure,
        timeout,
        ctx.dry,
        Arc::new(FailBody { message, fatal }),
    ))
}

struct FailBody {
    message: String,
    fatal: bool,
}

#[async_trait]
impl ActorBody for FailBody {
    async fn run(&self) -> ActorResult {
        if self.fatal {
            Err(kingpin_reactor::ActorFailure::fatal(self.message.clone()))
        } else {
            Err(kingpin_reactor::ActorFailure::recoverable(self.message.clone()))
        }
    }
}
