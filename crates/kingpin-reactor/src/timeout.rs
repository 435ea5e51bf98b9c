//! Per-actor timeout with "shielded" semantics (§5): on deadline expiry,
//! `run()` returns `ActorTimedOut` immediately, but the execution body is
//! *not* cancelled — it keeps running detached. This is the one place the
//! teacher's `with_retry` timeout-race (`tokio::time::timeout` racing a
//! future) had to change shape: racing the future directly drops — and
//! therefore cancels — it on elapse. Racing a spawned task's `JoinHandle`
//! instead lets us stop *awaiting* without stopping the task.

use std::future::Future;
use std::time::Duration;

use crate::outcome::{ActorFailure, ActorResult};

/// Runs `fut` to completion, or returns `ActorTimedOut` if `timeout` (when
/// non-zero) elapses first. `fut` keeps running in the background past
/// the deadline; callers must not assume any side effect it performs has
/// completed by the time this function returns on a timeout.
pub async fn run_shielded<F>(fut: F, timeout: Duration) -> ActorResult
where
    F: Future<Output = ActorResult> + Send + 'static,
{
    if timeout.is_zero() {
        return fut.await;
    }

    let handle = tokio::spawn(fut);
    match tokio::time::timeout(timeout, handle).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(join_error)) => Err(ActorFailure::recoverable(format!(
            "actor task panicked: {join_error}"
        ))),
        Err(_elapsed) => Err(ActorFailure::timed_out(timeout)),
    }
}
