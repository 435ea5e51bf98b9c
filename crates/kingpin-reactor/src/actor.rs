//! The actor lifecycle common to every actor class (§4.5): condition
//! check, shielded timeout, `warn_on_failure` suppression, and the
//! `[DRY: desc]` / `[desc]` framing used for logging.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use kingpin_core::Context;
use kingpin_parser::substitute::{substitute, substitute_value, Delimiter};
use serde_json::{Map, Value};

use crate::err::{Error, Result};
use crate::outcome::ActorResult;
use crate::timeout::run_shielded;

/// The execution-time behavior of one actor class. Implementors only
/// need to produce an outcome; condition checks, timeout shielding, and
/// `warn_on_failure` suppression are handled uniformly by [`ActorNode`].
#[async_trait]
pub trait ActorBody: Send + Sync {
    async fn run(&self) -> ActorResult;
}

/// A fully constructed, ready-to-run actor: the resolved `desc`,
/// `condition`, `warn_on_failure`, and `timeout` fields, the dry flag
/// baked in at build time, and the class-specific body.
pub struct ActorNode {
    desc: String,
    condition: bool,
    warn_on_failure: bool,
    timeout: Duration,
    dry: bool,
    body: Arc<dyn ActorBody>,
}

impl ActorNode {
    pub fn new(
        desc: String,
        condition: bool,
        warn_on_failure: bool,
        timeout: Duration,
        dry: bool,
        body: Arc<dyn ActorBody>,
    ) -> Self {
        Self {
            desc,
            condition,
            warn_on_failure,
            timeout,
            dry,
            body,
        }
    }

    pub fn desc(&self) -> &str {
        &self.desc
    }

    pub fn is_dry(&self) -> bool {
        self.dry
    }

    fn framed(&self) -> String {
        if self.dry {
            format!("[DRY: {}]", self.desc)
        } else {
            format!("[{}]", self.desc)
        }
    }

    /// Runs this actor's full lifecycle: condition gate, shielded
    /// timeout, then `warn_on_failure` suppression of a non-fatal
    /// failure (§7).
    pub async fn run(&self) -> ActorResult {
        let framed = self.framed();

        if !self.condition {
            tracing::info!(actor = %framed, "condition is false, skipping");
            return Ok(());
        }

        tracing::info!(actor = %framed, "running");

        let body = self.body.clone();
        let started = std::time::Instant::now();
        let outcome = run_shielded(async move { body.run().await }, self.timeout).await;
        record_operation(&self.desc, started.elapsed(), outcome.as_ref().err());

        match &outcome {
            Ok(()) => tracing::info!(actor = %framed, "completed"),
            Err(failure) => tracing::warn!(actor = %framed, error = %failure, "failed"),
        }

        match outcome {
            Err(failure) if self.warn_on_failure && !failure.is_fatal() => {
                tracing::warn!(actor = %framed, "failure suppressed by warn_on_failure");
                Ok(())
            }
            Err(failure) => Err(failure.trace(&self.desc)),
            Ok(()) => Ok(()),
        }
    }
}

/// Records an actor run as a `kingpin_operations_total` counter and
/// `kingpin_operation_duration_seconds` histogram, labeled by `desc`, plus
/// a `kingpin_errors_total` counter labeled by failure kind on failure —
/// the ambient observability surface, not part of the actor contract
/// itself, so it's a free function rather than something threaded through
/// every constructor.
#[cfg(feature = "metrics")]
fn record_operation(desc: &str, elapsed: Duration, failure: Option<&crate::outcome::ActorFailure>) {
    let labels = [("actor", desc.to_string())];
    metrics::histogram!("kingpin_operation_duration_seconds", elapsed.as_secs_f64(), &labels);
    metrics::counter!("kingpin_operations_total", 1, &labels);
    if let Some(failure) = failure {
        let error_labels = [("kind", if failure.is_fatal() { "fatal" } else { "recoverable" }.to_string())];
        metrics::counter!("kingpin_errors_total", 1, &error_labels);
    }
}

#[cfg(not(feature = "metrics"))]
fn record_operation(_desc: &str, _elapsed: Duration, _failure: Option<&crate::outcome::ActorFailure>) {}

/// Resolves a `condition` or `warn_on_failure` field (bool, number, or
/// string — §3) against the incoming context.
pub fn resolve_bool_field(value: &Value, context: &Context) -> Result<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => Ok(n.as_f64().map(|f| f != 0.0).unwrap_or(true)),
        Value::String(s) => {
            let resolved = substitute_str(s, context)?;
            Ok(kingpin_core::config::is_truthy(&resolved))
        }
        _ => Err(Error::Internal(
            "condition/warn_on_failure must be boolean, number, or string".to_string(),
        )),
    }
}

/// Resolves a `timeout` field against the incoming context, falling back
/// to `default` when the node didn't specify one.
pub fn resolve_timeout(value: Option<&Value>, context: &Context, default: Duration) -> Result<Duration> {
    match value {
        None => Ok(default),
        Some(Value::Number(n)) => {
            let secs = n
                .as_f64()
                .ok_or_else(|| Error::Internal("timeout must be numeric".to_string()))?;
            Ok(Duration::from_secs_f64(secs.max(0.0)))
        }
        Some(Value::String(s)) => {
            let resolved = substitute_str(s, context)?;
            let secs: f64 = resolved
                .trim()
                .parse()
                .map_err(|_| Error::Internal(format!("invalid timeout value: {resolved}")))?;
            Ok(Duration::from_secs_f64(secs.max(0.0)))
        }
        Some(_) => Err(Error::Internal(
            "timeout must be a number or string".to_string(),
        )),
    }
}

/// Resolves `desc`: an explicit value substitutes against the incoming
/// context, same as `condition`; a missing one falls back to the actor
/// class's default template, which substitutes against this actor's own
/// resolved options instead (§3 — default descriptions reference option
/// names, not contextual ones).
pub fn resolve_desc(
    raw_desc: Option<&str>,
    default_template: &str,
    context: &Context,
    options: &Map<String, Value>,
) -> Result<String> {
    match raw_desc {
        Some(d) => substitute_str(d, context),
        None => {
            let tokens = options_as_tokens(options);
            substitute(default_template, &tokens, Delimiter::Instantiation).map_err(map_parser_error)
        }
    }
}

fn options_as_tokens(options: &Map<String, Value>) -> Context {
    options
        .iter()
        .map(|(k, v)| (k.clone(), value_to_token_string(v)))
        .collect()
}

fn value_to_token_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Phase-2 (`{NAME}`) substitution against the incoming context, mapping
/// a missing token into the construction-time `MissingContext` error.
pub fn substitute_str(input: &str, context: &Context) -> Result<String> {
    substitute(input, context, Delimiter::Instantiation).map_err(map_parser_error)
}

/// Deep phase-2 substitution of an entire `options` map against the
/// incoming context — the "strict context" rule §4.5 applies to ordinary
/// leaf actors (everything except Group and Macro, which only
/// phase-2-substitute their own `desc`/`condition`/target and leave their
/// structural fields for each child to resolve against its own context).
pub fn substitute_options(options: &Map<String, Value>, context: &Context) -> Result<Map<String, Value>> {
    let value = substitute_value(&Value::Object(options.clone()), context, Delimiter::Instantiation)
        .map_err(map_parser_error)?;
    match value {
        Value::Object(map) => Ok(map),
        _ => unreachable!("substituting an object always yields an object"),
    }
}

fn map_parser_error(err: kingpin_parser::err::Error) -> Error {
    match err {
        kingpin_parser::err::Error::MissingToken { names } => Error::MissingContext { names },
        other => Error::Parser(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(pairs: &[(&str, &str)]) -> Context {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    struct FailingBody;

    #[async_trait]
    impl ActorBody for FailingBody {
        async fn run(&self) -> ActorResult {
            Err(crate::outcome::ActorFailure::recoverable("boom"))
        }
    }

    /// §7: a failure propagating through `ActorNode::run` picks up that
    /// node's own `desc`, so by the time it reaches the top, `trace`
    /// holds the chain of enclosing actors it passed through.
    #[tokio::test]
    async fn run_appends_its_own_desc_to_the_failure_trace() {
        let node = ActorNode::new(
            "leaf".to_string(),
            true,
            false,
            Duration::from_secs(1),
            false,
            Arc::new(FailingBody),
        );
        let err = node.run().await.unwrap_err();
        assert_eq!(err.trace, vec!["leaf".to_string()]);
    }

    #[tokio::test]
    async fn warn_on_failure_suppression_does_not_record_a_trace_entry() {
        let node = ActorNode::new(
            "leaf".to_string(),
            true,
            true,
            Duration::from_secs(1),
            false,
            Arc::new(FailingBody),
        );
        assert!(node.run().await.is_ok());
    }

    #[test]
    fn bool_field_accepts_native_bool() {
        assert!(resolve_bool_field(&Value::Bool(true), &ctx(&[])).unwrap());
    }

    #[test]
    fn bool_field_parses_falsy_strings_after_substitution() {
        let context = ctx(&[("GO", "false")]);
        let resolved = resolve_bool_field(&Value::String("{GO}".to_string()), &context).unwrap();
        assert!(!resolved);
    }

    #[test]
    fn bool_field_numeric_zero_is_falsy() {
        let value = serde_json::json!(0);
        assert!(!resolve_bool_field(&value, &ctx(&[])).unwrap());
    }

    #[test]
    fn timeout_falls_back_to_default_when_absent() {
        let resolved = resolve_timeout(None, &ctx(&[]), Duration::from_secs(7)).unwrap();
        assert_eq!(resolved, Duration::from_secs(7));
    }

    #[test]
    fn timeout_string_substitutes_then_parses() {
        let context = ctx(&[("T", "12")]);
        let value = Value::String("{T}".to_string());
        let resolved = resolve_timeout(Some(&value), &context, Duration::from_secs(1)).unwrap();
        assert_eq!(resolved, Duration::from_secs(12));
    }

    #[test]
    fn desc_default_template_uses_own_options_not_context() {
        let mut options = Map::new();
        options.insert("sleep".to_string(), serde_json::json!(3));
        let context = ctx(&[("sleep", "WRONG")]);
        let desc = resolve_desc(None, "sleep for {sleep}s", &context, &options).unwrap();
        assert_eq!(desc, "sleep for 3s");
    }

    #[test]
    fn desc_explicit_value_substitutes_against_context() {
        let context = ctx(&[("NAME", "db"), ("ACTION", "restart")]);
        let desc = resolve_desc(Some("{ACTION} {NAME}"), "unused", &context, &Map::new()).unwrap();
        assert_eq!(desc, "restart db");
    }

    #[test]
    fn missing_context_token_surfaces_as_missing_context_error() {
        let err = substitute_str("{MISSING}", &ctx(&[])).unwrap_err();
        assert!(matches!(err, Error::MissingContext { .. }));
    }
}
