//! The `@dry` helper (§4.5): wraps a single side-effecting operation so a
//! leaf actor body doesn't have to duplicate the dry/real branch itself.
//!
//! The "would have" message is an ordinary argument, so it is always
//! built before this function is called — a malformed template in it
//! fails the same way on a rehearsal pass as on a real one, rather than
//! only surfacing once `--dry` is dropped.

use std::future::Future;

use crate::outcome::ActorResult;

pub async fn dry<F, Fut>(is_dry: bool, would_have: impl std::fmt::Display, op: F) -> ActorResult
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = ActorResult>,
{
    if is_dry {
        tracing::info!("would have {would_have}");
        Ok(())
    } else {
        op().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::ActorFailure;

    #[tokio::test]
    async fn dry_mode_skips_the_operation() {
        let mut ran = false;
        let outcome = dry(true, "delete the thing", || async {
            ran = true;
            Ok(())
        })
        .await;
        assert!(outcome.is_ok());
        assert!(!ran);
    }

    #[tokio::test]
    async fn real_mode_runs_the_operation() {
        let outcome = dry(false, "delete the thing", || async { Err(ActorFailure::recoverable("nope")) }).await;
        assert!(outcome.is_err());
    }
}
