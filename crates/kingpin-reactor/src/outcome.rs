//! The uniform error taxonomy actors fail with at execution time (§7).

use std::fmt;
use std::time::Duration;

/// Distinguishes an operational failure an operator can choose to ignore
/// from a programming/configuration error that always aborts the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Timed out, remote 4xx/5xx, resource-not-found where absence is
    /// plausible. Suppressible by `warn_on_failure`.
    Recoverable,
    /// Invalid actor identifier, invalid options, missing credentials,
    /// schema violation. Never suppressed by `warn_on_failure`.
    Fatal,
}

impl FailureKind {
    /// Escalates to `Fatal` if either side is fatal — the rule Async
    /// groups and Sync-dry groups use to aggregate children (§7).
    pub fn escalate(self, other: FailureKind) -> FailureKind {
        if self == FailureKind::Fatal || other == FailureKind::Fatal {
            FailureKind::Fatal
        } else {
            FailureKind::Recoverable
        }
    }
}

/// A failure produced by an actor's execution body, already classified as
/// Recoverable or Fatal.
#[derive(Debug)]
pub struct ActorFailure {
    pub kind: FailureKind,
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
    /// The `desc` of every enclosing actor this failure has propagated
    /// through so far, innermost first. [`ActorNode::run`](crate::actor::ActorNode::run)
    /// appends its own `desc` each time a failure passes through it, so by
    /// the time the top-level `Runner` sees it, `trace` is the "short
    /// trace of enclosing group descriptions" §7 calls for.
    pub trace: Vec<String>,
}

impl ActorFailure {
    pub fn recoverable(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Recoverable,
            message: message.into(),
            source: None,
            trace: Vec::new(),
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Fatal,
            message: message.into(),
            source: None,
            trace: Vec::new(),
        }
    }

    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// The `ActorTimedOut` failure from §5: always Recoverable, regardless
    /// of what the underlying body was doing.
    pub fn timed_out(after: Duration) -> Self {
        Self::recoverable(format!("actor timed out after {after:?}"))
    }

    pub fn is_fatal(&self) -> bool {
        self.kind == FailureKind::Fatal
    }

    /// Records `desc` as the next enclosing actor this failure passed
    /// through, innermost-called-first.
    pub fn trace(mut self, desc: &str) -> Self {
        self.trace.push(desc.to_string());
        self
    }
}

impl fmt::Display for ActorFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ActorFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_deref().map(|e| e as _)
    }
}

/// The outcome of a single `ActorNode::run()` call.
pub type ActorResult = std::result::Result<(), ActorFailure>;

/// Aggregates a batch of child outcomes into one composite failure per
/// §7: fatal if any child was fatal, else recoverable if any failed,
/// else success. Used by Async groups always, and by Sync groups in dry
/// mode (§4.6).
pub fn aggregate<'a>(outcomes: impl IntoIterator<Item = &'a ActorResult>) -> ActorResult {
    let mut kind: Option<FailureKind> = None;
    let mut messages = Vec::new();

    for outcome in outcomes {
        if let Err(failure) = outcome {
            kind = Some(match kind {
                Some(existing) => existing.escalate(failure.kind),
                None => failure.kind,
            });
            messages.push(failure.message.clone());
        }
    }

    match kind {
        None => Ok(()),
        Some(kind) => Err(ActorFailure {
            kind,
            message: messages.join("; "),
            source: None,
            trace: Vec::new(),
        }),
    }
}
