//! Entity sync: a dual read bound to a transport, a store and a notifier.
//!
//! This is the caller policy every data-fetch path shares:
//! - a delivered value is upserted into the store with its trust tag;
//! - an uncertified failure is logged and never touches the store;
//! - a certified failure invalidates the key and is reported, because the
//!   store can no longer vouch for what it holds.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use certus_core::{
    CertusResult, FetchError, Identity, IdentityKind, IdentityProvider, ReadStrategy,
    ResourceKey, SyncConfig, SyncError, TrustLevel, TrustTagged,
};
use tracing::{error, warn};

use crate::coordinator::{
    race_read, race_read_as, Delivery, ReadFailure, ReadHandle, ReadOptions, ReadRequest,
};
use crate::fanout::{FanOut, FanOutReport};
use crate::notify::{Notice, Notifier};
use crate::store::{Reconcile, ReconcilingStore};

/// Transport collaborator: fetch one resource at one trust level.
///
/// Timeouts and concurrency limits, if any, belong to the implementation.
#[async_trait]
pub trait ResourceFetcher<K, T>: Send + Sync
where
    K: ResourceKey,
    T: Send + 'static,
{
    async fn fetch(&self, key: &K, trust: TrustLevel, identity: &Identity)
        -> Result<T, FetchError>;
}

/// Who reports a certified failure to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ErrorReporting {
    /// One notice per failing key.
    PerKey,
    /// The caller aggregates (fan-out); no per-key notices.
    Deferred,
}

/// Dual reads of one resource type into one store.
pub struct EntitySync<K, T>
where
    K: ResourceKey,
    T: Reconcile,
{
    resource: &'static str,
    fetcher: Arc<dyn ResourceFetcher<K, T>>,
    identities: Arc<dyn IdentityProvider>,
    store: ReconcilingStore<K, T>,
    notifier: Arc<dyn Notifier>,
    config: SyncConfig,
    strategy: ReadStrategy,
    identity_kind: IdentityKind,
}

impl<K, T> EntitySync<K, T>
where
    K: ResourceKey,
    T: Reconcile,
{
    pub fn new(
        resource: &'static str,
        fetcher: Arc<dyn ResourceFetcher<K, T>>,
        identities: Arc<dyn IdentityProvider>,
        store: ReconcilingStore<K, T>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            resource,
            fetcher,
            identities,
            store,
            notifier,
            config: SyncConfig::default(),
            strategy: ReadStrategy::default(),
            identity_kind: IdentityKind::default(),
        }
    }

    pub fn with_config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_strategy(mut self, strategy: ReadStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_identity_kind(mut self, kind: IdentityKind) -> Self {
        self.identity_kind = kind;
        self
    }

    pub fn store(&self) -> &ReconcilingStore<K, T> {
        &self.store
    }

    pub fn resource(&self) -> &'static str {
        self.resource
    }

    /// Strategy actually used, after any configured override.
    pub fn effective_strategy(&self) -> ReadStrategy {
        self.config.effective_strategy(self.strategy)
    }

    /// Start a dual read of `key`. Returns once the first path settled.
    ///
    /// Certified failures are reported through the notifier.
    pub async fn load(&self, key: &K) -> CertusResult<ReadHandle> {
        self.start(key, None, ErrorReporting::PerKey).await
    }

    /// Read `key` and wait until every path settled.
    ///
    /// No notices are raised; the outcome of the highest-trust path is
    /// returned instead so that a fan-out can aggregate it.
    pub async fn load_settled(&self, key: &K) -> CertusResult<()> {
        let identity = self.resolve_identity().await?;
        self.load_settled_as(key, identity).await
    }

    /// Sync every key not in `excluded` through `fan_out`.
    ///
    /// The identity is resolved once before any read is issued. If that
    /// fails the whole fan-out fails with the identity error: no key is read
    /// and no notice is raised.
    pub async fn load_all(
        &self,
        fan_out: &FanOut,
        keys: &[K],
        excluded: &HashSet<K>,
    ) -> CertusResult<FanOutReport<K>> {
        let identity = self.resolve_identity().await?;
        let identity = &identity;
        Ok(fan_out
            .run(keys, excluded, |key| async move {
                self.load_settled_as(&key, identity.clone()).await
            })
            .await)
    }

    async fn resolve_identity(&self) -> CertusResult<Identity> {
        Ok(self.identities.resolve(self.identity_kind).await?)
    }

    async fn load_settled_as(&self, key: &K, identity: Identity) -> CertusResult<()> {
        let trust = self.effective_strategy().highest_trust();
        let settlement = self
            .start(key, Some(identity), ErrorReporting::Deferred)
            .await?
            .settled()
            .await;

        match settlement.path(trust) {
            Some(Delivery::Loaded) => Ok(()),
            Some(Delivery::Failed { reason }) => Err(SyncError::ReadFailed {
                key: key.to_string(),
                trust,
                reason: reason.clone(),
            }
            .into()),
            Some(Delivery::Suppressed) | None => Err(SyncError::ReadAborted {
                key: key.to_string(),
            }
            .into()),
        }
    }

    /// Start a read of `key`, resolving the identity unless one is given.
    async fn start(
        &self,
        key: &K,
        identity: Option<Identity>,
        reporting: ErrorReporting,
    ) -> CertusResult<ReadHandle> {
        let options = ReadOptions::new()
            .with_strategy(self.effective_strategy())
            .with_identity_kind(self.identity_kind)
            .with_label(format!("{} {}", self.resource, key))
            .with_logging(self.config.log_reads);

        let fetcher = Arc::clone(&self.fetcher);
        let fetch_key = key.clone();
        let fetch = move |request: ReadRequest| {
            let fetcher = Arc::clone(&fetcher);
            let key = fetch_key.clone();
            async move { fetcher.fetch(&key, request.trust, &request.identity).await }
        };

        let load_store = self.store.clone();
        let load_key = key.clone();
        let on_load = move |result: TrustTagged<T>| load_store.upsert(load_key.clone(), result);

        let on_error = FailurePolicy {
            resource: self.resource,
            key: key.clone(),
            store: self.store.clone(),
            notifier: Arc::clone(&self.notifier),
            reporting,
            soft_notice: self.config.soft_notice_on_uncertified_error,
        };
        let on_error = move |failure: ReadFailure<FetchError>| on_error.handle(failure);

        match identity {
            Some(identity) => Ok(race_read_as(identity, options, fetch, on_load, on_error).await),
            None => race_read(self.identities.as_ref(), options, fetch, on_load, on_error).await,
        }
    }
}

impl<K, T> Clone for EntitySync<K, T>
where
    K: ResourceKey,
    T: Reconcile,
{
    fn clone(&self) -> Self {
        Self {
            resource: self.resource,
            fetcher: Arc::clone(&self.fetcher),
            identities: Arc::clone(&self.identities),
            store: self.store.clone(),
            notifier: Arc::clone(&self.notifier),
            config: self.config.clone(),
            strategy: self.strategy,
            identity_kind: self.identity_kind,
        }
    }
}

/// What a failed read path does to the store and the user.
struct FailurePolicy<K, T>
where
    K: ResourceKey,
    T: Reconcile,
{
    resource: &'static str,
    key: K,
    store: ReconcilingStore<K, T>,
    notifier: Arc<dyn Notifier>,
    reporting: ErrorReporting,
    soft_notice: bool,
}

impl<K, T> FailurePolicy<K, T>
where
    K: ResourceKey,
    T: Reconcile,
{
    /// A certified failure removes the key's entry: the store can no longer
    /// vouch for it.
    fn handle(&self, failure: ReadFailure<FetchError>) {
        let ReadFailure { error: err, trust } = failure;

        if !trust.is_certified() {
            warn!(resource = self.resource, key = %self.key, error = %err, "uncertified read failed");
            if self.soft_notice && self.reporting == ErrorReporting::PerKey {
                self.notifier.notify(
                    Notice::warning(format!("Showing {} for {} may be delayed", self.resource, self.key))
                        .with_key(self.key.to_string()),
                );
            }
            return;
        }

        let purged = self.store.invalidate(&self.key);
        error!(
            resource = self.resource,
            key = %self.key,
            error = %err,
            purged,
            "certified read failed"
        );
        if self.reporting == ErrorReporting::PerKey {
            self.notifier.notify(
                Notice::error(format!("Could not load {} for {}: {}", self.resource, self.key, err))
                    .with_key(self.key.to_string()),
            );
        }
    }
}
