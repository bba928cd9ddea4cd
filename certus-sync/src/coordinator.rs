//! Dual-read coordinator.
//!
//! Races an uncertified query read against a certified update read for the
//! same resource and decides which results reach the caller. The rule is
//! simple: once the certified path has settled (success or failure), nothing
//! from the uncertified path of the same invocation is delivered.
//!
//! # Example
//!
//! ```ignore
//! let handle = race_read(
//!     identities.as_ref(),
//!     ReadOptions::new().with_label("balance"),
//!     |request| transport.balance(request.trust, request.identity),
//!     |result| store.upsert(key.clone(), result),
//!     |failure| tracing::warn!(trust = %failure.trust, "balance read failed"),
//! )
//! .await?;
//!
//! // Returns after the first path settled. Wait for the rest if needed:
//! let settlement = handle.settled().await;
//! ```

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use certus_core::{
    CertusResult, Identity, IdentityKind, IdentityProvider, ReadStrategy, TrustLevel, TrustTagged,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Arguments handed to the fetch function for one read path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadRequest {
    pub trust: TrustLevel,
    pub identity: Identity,
}

/// A failed read path, passed to the error callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadFailure<E> {
    pub error: E,
    pub trust: TrustLevel,
}

/// Per-invocation options.
#[derive(Debug, Clone)]
pub struct ReadOptions {
    pub strategy: ReadStrategy,
    pub identity_kind: IdentityKind,
    /// Name used in log events.
    pub label: String,
    pub log_reads: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            strategy: ReadStrategy::default(),
            identity_kind: IdentityKind::default(),
            label: "read".to_string(),
            log_reads: true,
        }
    }
}

impl ReadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strategy(mut self, strategy: ReadStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_identity_kind(mut self, kind: IdentityKind) -> Self {
        self.identity_kind = kind;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_logging(mut self, enabled: bool) -> Self {
        self.log_reads = enabled;
        self
    }
}

/// What happened to a settled read path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// The load callback received the value.
    Loaded,
    /// The error callback received the error.
    Failed { reason: String },
    /// The path settled after the certified path and was dropped.
    Suppressed,
}

impl Delivery {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Loaded => "loaded",
            Self::Failed { .. } => "failed",
            Self::Suppressed => "suppressed",
        }
    }
}

/// Outcome of one read path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathOutcome {
    pub trust: TrustLevel,
    pub delivery: Delivery,
}

/// Outcomes of every path of one invocation, in issue order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settlement {
    outcomes: Vec<PathOutcome>,
}

impl Settlement {
    pub fn outcomes(&self) -> &[PathOutcome] {
        &self.outcomes
    }

    pub fn path(&self, trust: TrustLevel) -> Option<&Delivery> {
        self.outcomes
            .iter()
            .find(|outcome| outcome.trust == trust)
            .map(|outcome| &outcome.delivery)
    }

    /// Highest trust level whose value reached the load callback.
    pub fn loaded_trust(&self) -> Option<TrustLevel> {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.delivery == Delivery::Loaded)
            .map(|outcome| outcome.trust)
            .max()
    }

    pub fn is_certified(&self) -> bool {
        self.loaded_trust() == Some(TrustLevel::Certified)
    }
}

/// Handle to the read paths of one invocation.
///
/// Dropping the handle does not cancel the paths; they run to completion
/// and still deliver (or get suppressed) through the callbacks.
#[derive(Debug)]
pub struct ReadHandle {
    label: Arc<str>,
    paths: Vec<(TrustLevel, JoinHandle<Delivery>)>,
}

impl ReadHandle {
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Trust levels issued by this invocation.
    pub fn trust_levels(&self) -> Vec<TrustLevel> {
        self.paths.iter().map(|(trust, _)| *trust).collect()
    }

    /// Wait for every path to settle.
    pub async fn settled(self) -> Settlement {
        let mut outcomes = Vec::with_capacity(self.paths.len());
        for (trust, path) in self.paths {
            match path.await {
                Ok(delivery) => outcomes.push(PathOutcome { trust, delivery }),
                Err(err) => {
                    warn!(read = %self.label, %trust, error = %err, "read path aborted");
                }
            }
        }
        Settlement { outcomes }
    }
}

/// Completion gate shared by the paths of one invocation.
///
/// The flag is held across the check and the callback so that a certified
/// delivery and a later uncertified check can never interleave.
struct ReadGate<L, R> {
    authoritative_done: Mutex<bool>,
    on_load: L,
    on_error: R,
}

impl<L, R> ReadGate<L, R> {
    fn new(on_load: L, on_error: R) -> Self {
        Self {
            authoritative_done: Mutex::new(false),
            on_load,
            on_error,
        }
    }

    fn deliver<T, E>(&self, trust: TrustLevel, outcome: Result<T, E>) -> Delivery
    where
        L: Fn(TrustTagged<T>),
        R: Fn(ReadFailure<E>),
        E: fmt::Display,
    {
        let mut done = self
            .authoritative_done
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if *done {
            return Delivery::Suppressed;
        }

        let delivery = match outcome {
            Ok(value) => {
                (self.on_load)(TrustTagged::new(value, trust));
                Delivery::Loaded
            }
            Err(error) => {
                let reason = error.to_string();
                (self.on_error)(ReadFailure { error, trust });
                Delivery::Failed { reason }
            }
        };

        if trust.is_certified() {
            *done = true;
        }
        delivery
    }
}

/// Race an uncertified and a certified read of the same resource.
///
/// The identity is resolved once; if that fails no read is issued and the
/// error is returned. Otherwise every path of `options.strategy` is started
/// concurrently and this returns as soon as the first of them settles.
///
/// Delivery rules:
/// - certified success or failure always reaches `on_load` / `on_error`,
///   then closes the gate;
/// - an uncertified result or error reaches the callbacks only while the
///   gate is open, and is dropped silently afterwards.
///
/// There is no retry and no cancellation. Callers that need authoritative
/// completion either watch the trust tag in the callbacks or await
/// [`ReadHandle::settled`].
pub async fn race_read<T, E, F, Fut, L, R>(
    identities: &dyn IdentityProvider,
    options: ReadOptions,
    fetch: F,
    on_load: L,
    on_error: R,
) -> CertusResult<ReadHandle>
where
    T: Send + 'static,
    E: fmt::Display + Send + 'static,
    F: Fn(ReadRequest) -> Fut,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    L: Fn(TrustTagged<T>) + Send + Sync + 'static,
    R: Fn(ReadFailure<E>) + Send + Sync + 'static,
{
    let identity = identities.resolve(options.identity_kind).await?;
    Ok(race_read_as(identity, options, fetch, on_load, on_error).await)
}

/// [`race_read`] under an identity the caller already resolved.
///
/// Used when several reads must run under one identity, such as a fan-out
/// that resolves once up front. `options.identity_kind` is ignored.
pub async fn race_read_as<T, E, F, Fut, L, R>(
    identity: Identity,
    options: ReadOptions,
    fetch: F,
    on_load: L,
    on_error: R,
) -> ReadHandle
where
    T: Send + 'static,
    E: fmt::Display + Send + 'static,
    F: Fn(ReadRequest) -> Fut,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    L: Fn(TrustTagged<T>) + Send + Sync + 'static,
    R: Fn(ReadFailure<E>) + Send + Sync + 'static,
{
    let label: Arc<str> = Arc::from(options.label.as_str());
    let log_reads = options.log_reads;
    let levels = options.strategy.trust_levels();
    let gate = Arc::new(ReadGate::new(on_load, on_error));
    let (settled_tx, mut settled_rx) = mpsc::channel::<TrustLevel>(levels.len().max(1));

    let mut paths = Vec::with_capacity(levels.len());
    for &trust in levels {
        let call = fetch(ReadRequest {
            trust,
            identity: identity.clone(),
        });
        let gate = Arc::clone(&gate);
        let settled_tx = settled_tx.clone();
        let path_label = Arc::clone(&label);

        let path = tokio::spawn(async move {
            let started = Instant::now();
            let outcome = call.await;
            let delivery = gate.deliver(trust, outcome);
            if log_reads {
                debug!(
                    read = %path_label,
                    %trust,
                    elapsed = ?started.elapsed(),
                    delivery = delivery.as_str(),
                    "read path settled"
                );
            }
            let _ = settled_tx.try_send(trust);
            delivery
        });
        paths.push((trust, path));
    }
    drop(settled_tx);

    // First settled path, or every sender gone if all paths panicked.
    let _ = settled_rx.recv().await;

    ReadHandle { label, paths }
}
