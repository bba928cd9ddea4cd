//! Reconciling stores.
//!
//! A store is a keyed table of trust-tagged entries. Writes come only from
//! read callbacks and carry the trust level of the read that produced them.
//! A certified failure for a key removes its entry so that nothing unproven
//! stays on screen looking as if it had been verified.
//!
//! # Merge policy
//!
//! Values implement [`Reconcile`]. Lists of [`certus_core::Identified`] items
//! merge by sub-identifier; scalars are replaced. Merging never looks at
//! trust, so the outcome of a read does not depend on which path landed first.

pub mod family;
pub mod reconcile;
pub mod table;

pub use family::{
    AccountsStore, BalancesStore, FeesStore, LedgerStores, NeuronsStore, TokensStore,
    TransactionsStore,
};
pub use reconcile::Reconcile;
pub use table::{ReconcilingEntry, ReconcilingStore, StoreSnapshot};
