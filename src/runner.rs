//! The Runner (C9): build phase, rehearsal (dry) pass, real pass, and the
//! exit-code mapping the CLI reports.

use std::collections::HashMap;
use std::sync::Arc;

use kingpin_core::KingpinConfig;
use kingpin_parser::DocumentLoader;
use kingpin_reactor::{build_actor, ActorResult, BuildCtx, Registry};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::error::Result;

pub struct Runner {
    config: Arc<KingpinConfig>,
    loader: Arc<DocumentLoader>,
    registry: Arc<Registry>,
}

/// What happened across however many passes the run performed.
pub struct RunReport {
    pub rehearsal: Option<ActorResult>,
    pub real: Option<ActorResult>,
    pub built_only: bool,
}

impl RunReport {
    /// §4.9 step 4 and §6's `--build-only`/`--dry` variants: zero if
    /// `--build-only` only had to construct the tree, zero if `--dry`'s
    /// rehearsal-only pass succeeded, zero if a full run's real pass
    /// succeeded with no unignored failures; one otherwise. A build
    /// error never reaches this report — it surfaces as `Err` from
    /// `Runner::run_document` instead.
    pub fn exit_code(&self) -> i32 {
        if self.built_only {
            return 0;
        }
        match (&self.rehearsal, &self.real) {
            (_, Some(real)) => i32::from(real.is_err()),
            (Some(rehearsal), None) => i32::from(rehearsal.is_err()),
            (None, None) => 0,
        }
    }
}

/// Renders a failure's `trace` (innermost actor first) as the "short
/// trace of enclosing group descriptions" §7 asks the top level to log
/// alongside the per-actor `[desc]`-prefixed lines each level already
/// emitted on its own.
fn breadcrumb(failure: &kingpin_reactor::ActorFailure) -> String {
    if failure.trace.is_empty() {
        "(no enclosing actors)".to_string()
    } else {
        failure.trace.join(" < ")
    }
}

impl Runner {
    pub fn new(config: Arc<KingpinConfig>) -> Self {
        Self {
            config,
            loader: Arc::new(DocumentLoader::new()),
            registry: Arc::new(crate::actors::full_registry()),
        }
    }

    /// Loads and runs a script document through the full build →
    /// rehearsal → real pipeline. `only_dry` runs just the rehearsal
    /// pass (the CLI's `--dry`); `build_only` builds the rehearsal tree
    /// and returns without executing anything.
    pub async fn run_script(
        &self,
        source: &str,
        tokens: HashMap<String, String>,
        only_dry: bool,
        build_only: bool,
    ) -> Result<RunReport> {
        let document = self.loader.load(source, &tokens).await?;
        self.run_document(&document, only_dry, build_only).await
    }

    /// Runs a single ad-hoc actor node: phase-1 substitutes it against
    /// the caller's tokens merged over the environment, validates it
    /// against the actor-node schema, then runs it exactly like a
    /// one-node script (§6 CLI surface).
    pub async fn run_ad_hoc(
        &self,
        node: &Value,
        tokens: HashMap<String, String>,
        only_dry: bool,
        build_only: bool,
    ) -> Result<RunReport> {
        let merged = kingpin_parser::substitute::env_overlaid(&tokens);
        let substituted = kingpin_parser::substitute::substitute_value(
            node,
            &merged,
            kingpin_parser::substitute::Delimiter::Document,
        )?;
        kingpin_parser::schema::validate_actor_node(&substituted)?;
        self.run_document(&substituted, only_dry, build_only).await
    }

    /// Runs an already-parsed document — used by ad-hoc `--actor` runs,
    /// which synthesize a single-node document in place of loading one.
    pub async fn run_document(
        &self,
        document: &Value,
        only_dry: bool,
        build_only: bool,
    ) -> Result<RunReport> {
        let dry_ctx = BuildCtx::new(self.config.clone(), self.loader.clone(), self.registry.clone(), true);
        let rehearsal_root = build_actor(document, &dry_ctx).await?;

        if build_only {
            info!("build-only: tree constructed successfully");
            return Ok(RunReport {
                rehearsal: None,
                real: None,
                built_only: true,
            });
        }

        info!("starting rehearsal pass");
        let rehearsal_outcome = rehearsal_root.run().await;
        match &rehearsal_outcome {
            Ok(()) => info!("rehearsal pass succeeded"),
            Err(failure) => warn!(error = %failure, trace = %breadcrumb(failure), "rehearsal pass failed"),
        }

        if only_dry {
            return Ok(RunReport {
                rehearsal: Some(rehearsal_outcome),
                real: None,
                built_only: false,
            });
        }

        if rehearsal_outcome.is_err() && !self.config.skip_dry {
            error!("aborting before the real pass (rehearsal failed, SKIP_DRY not set)");
            return Ok(RunReport {
                rehearsal: Some(rehearsal_outcome),
                real: None,
                built_only: false,
            });
        }

        // Rebuild rather than reuse: an actor instance is good for one
        // pass only (§3 invariant), and dry must be baked in fresh.
        let real_ctx = BuildCtx::new(self.config.clone(), self.loader.clone(), self.registry.clone(), false);
        let real_root = build_actor(document, &real_ctx).await?;

        info!("starting real pass");
        let real_outcome = real_root.run().await;
        match &real_outcome {
            Ok(()) => info!("real pass succeeded"),
            Err(failure) => error!(error = %failure, trace = %breadcrumb(failure), "real pass failed"),
        }

        Ok(RunReport {
            rehearsal: Some(rehearsal_outcome),
            real: Some(real_outcome),
            built_only: false,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn tokens(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn runner() -> Runner {
        Runner::new(Arc::new(KingpinConfig::default()))
    }

    /// S1 — sleep with environment token: `%T%` resolves at phase 1,
    /// rehearsal and real passes both succeed.
    #[tokio::test]
    async fn s1_sleep_with_environment_token() {
        let node = serde_json::json!({ "actor": "misc.Sleep", "options": { "sleep": "%T%" } });
        let report = runner()
            .run_ad_hoc(&node, tokens(&[("T", "0.01")]), false, false)
            .await
            .unwrap();
        assert_eq!(report.exit_code(), 0);
        assert!(report.rehearsal.unwrap().is_ok());
        assert!(report.real.unwrap().is_ok());
    }

    /// S2 — missing token: the document never reaches construction, let
    /// alone execution.
    #[tokio::test]
    async fn s2_missing_token_is_a_load_time_error() {
        let node = serde_json::json!({ "actor": "misc.Note", "options": { "message": "hi %NAME%" } });
        let err = runner().run_ad_hoc(&node, tokens(&[]), false, false).await.unwrap_err();
        assert!(matches!(err, Error::Parser(kingpin_parser::err::Error::MissingToken { .. })));
    }

    /// S3 — sync group, first child warns: the recoverable failure is
    /// suppressed, the second child still runs, the group succeeds.
    #[tokio::test]
    async fn s3_sync_group_first_child_warns() {
        let tree = serde_json::json!({
            "actor": "group.Sync",
            "options": {
                "acts": [
                    { "actor": "misc.Fail", "warn_on_failure": true, "options": { "message": "boom" } },
                    { "actor": "misc.Note", "options": { "message": "b ran" } }
                ]
            }
        });
        let report = runner().run_document(&tree, false, false).await.unwrap();
        assert_eq!(report.exit_code(), 0);
    }

    /// S6 — condition skip: a falsy `condition` short-circuits to success
    /// without running the body.
    #[tokio::test]
    async fn s6_condition_skip() {
        let node = serde_json::json!({
            "actor": "misc.Sleep",
            "condition": "%GO%",
            "options": { "sleep": 5 }
        });
        let report = runner()
            .run_ad_hoc(&node, tokens(&[("GO", "false")]), false, false)
            .await
            .unwrap();
        assert_eq!(report.exit_code(), 0);
    }

    /// `--build-only` constructs the tree and stops — no rehearsal, no
    /// real pass, and a full exit 0 even though nothing ran.
    #[tokio::test]
    async fn build_only_constructs_without_executing() {
        let node = serde_json::json!({ "actor": "misc.Sleep", "options": { "sleep": 5 } });
        let report = runner().run_ad_hoc(&node, tokens(&[]), false, true).await.unwrap();
        assert_eq!(report.exit_code(), 0);
        assert!(report.rehearsal.is_none());
        assert!(report.real.is_none());
    }

    /// `--dry` runs only the rehearsal pass; a failing rehearsal is
    /// reported without ever attempting a real pass.
    #[tokio::test]
    async fn dry_only_skips_the_real_pass_even_on_rehearsal_failure() {
        let node = serde_json::json!({ "actor": "misc.Fail", "options": { "message": "rehearsal failure" } });
        let report = runner().run_ad_hoc(&node, tokens(&[]), true, false).await.unwrap();
        assert_eq!(report.exit_code(), 1);
        assert!(report.real.is_none());
    }

    /// A rehearsal failure aborts the real pass entirely when `SKIP_DRY`
    /// is unset (§4.9 step 2).
    #[tokio::test]
    async fn rehearsal_failure_aborts_before_the_real_pass() {
        let node = serde_json::json!({ "actor": "misc.Fail", "options": { "message": "rehearsal failure" } });
        let report = runner().run_ad_hoc(&node, tokens(&[]), false, false).await.unwrap();
        assert_eq!(report.exit_code(), 1);
        assert!(report.real.is_none());
    }
}
