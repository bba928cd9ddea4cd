//! Keyed table of trust-tagged entries.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use certus_core::{ResourceKey, TrustLevel, TrustTagged};
use tokio::sync::watch;
use tracing::{debug, trace};

use super::reconcile::Reconcile;

/// A stored value and the trust level of the last write accepted for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilingEntry<T> {
    pub data: T,
    pub trust: TrustLevel,
}

impl<T> ReconcilingEntry<T> {
    pub fn is_certified(&self) -> bool {
        self.trust.is_certified()
    }
}

/// Full contents of a store at one point in time.
pub type StoreSnapshot<K, T> = HashMap<K, ReconcilingEntry<T>>;

/// In-memory table of trust-tagged entries keyed by resource.
///
/// The store records whatever trust tag it is given; keeping late
/// uncertified results out is the coordinator's job. Every mutation is
/// published to subscribers.
///
/// Cloning yields another handle to the same table.
pub struct ReconcilingStore<K, T>
where
    K: ResourceKey,
    T: Reconcile,
{
    name: &'static str,
    table: Arc<watch::Sender<StoreSnapshot<K, T>>>,
}

impl<K, T> ReconcilingStore<K, T>
where
    K: ResourceKey,
    T: Reconcile,
{
    pub fn new(name: &'static str) -> Self {
        let (table, _) = watch::channel(HashMap::new());
        Self {
            name,
            table: Arc::new(table),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Merge a trust-tagged value into the entry for `key`.
    ///
    /// The merge itself ignores trust: a new key stores the value as is, an
    /// existing key reconciles the value into its data. The entry's trust
    /// becomes `incoming.trust`.
    pub fn upsert(&self, key: K, incoming: TrustTagged<T>) {
        let TrustTagged { value, trust } = incoming;
        trace!(store = self.name, key = %key, %trust, "upsert");

        self.table.send_modify(move |table| match table.entry(key) {
            Entry::Occupied(mut slot) => {
                let entry = slot.get_mut();
                entry.data.reconcile(value);
                entry.trust = trust;
            }
            Entry::Vacant(slot) => {
                slot.insert(ReconcilingEntry { data: value, trust });
            }
        });
    }

    /// Remove the entry for `key`. Returns whether one existed.
    pub fn invalidate(&self, key: &K) -> bool {
        let removed = self
            .table
            .send_if_modified(|table| table.remove(key).is_some());
        if removed {
            debug!(store = self.name, key = %key, "entry invalidated");
        }
        removed
    }

    /// Drop every entry.
    pub fn reset_all(&self) {
        let cleared = self.table.send_if_modified(|table| {
            let had_entries = !table.is_empty();
            table.clear();
            had_entries
        });
        if cleared {
            debug!(store = self.name, "store reset");
        }
    }

    pub fn get(&self, key: &K) -> Option<ReconcilingEntry<T>> {
        self.table.borrow().get(key).cloned()
    }

    pub fn value(&self, key: &K) -> Option<T> {
        self.table.borrow().get(key).map(|entry| entry.data.clone())
    }

    pub fn trust(&self, key: &K) -> Option<TrustLevel> {
        self.table.borrow().get(key).map(|entry| entry.trust)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.table.borrow().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.table.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.borrow().is_empty()
    }

    pub fn snapshot(&self) -> StoreSnapshot<K, T> {
        self.table.borrow().clone()
    }

    /// Observe the store. `borrow()` on the receiver is the current
    /// snapshot; `changed()` resolves after every mutation.
    pub fn subscribe(&self) -> watch::Receiver<StoreSnapshot<K, T>> {
        self.table.subscribe()
    }
}

impl<K, T> Clone for ReconcilingStore<K, T>
where
    K: ResourceKey,
    T: Reconcile,
{
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            table: Arc::clone(&self.table),
        }
    }
}

impl<K, T> std::fmt::Debug for ReconcilingStore<K, T>
where
    K: ResourceKey,
    T: Reconcile,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconcilingStore")
            .field("name", &self.name)
            .field("entries", &self.len())
            .finish()
    }
}
