//! CERTUS Sync - Dual-Read Reconciliation
//!
//! Every resource the client shows can be read two ways: a fast query read
//! answered by one replica, and a slow update read certified by consensus.
//! This crate races the two, decides which results reach the stores, and
//! keeps unproven data from being shown as if it had been verified.
//!
//! Data flow:
//!
//! ```text
//! caller -> FanOut (0..N keys) -> race_read (per key) -> ReconcilingStore -> caller
//! ```
//!
//! - [`coordinator`]: `race_read`, the per-invocation suppression gate.
//! - [`store`]: reconciling stores and the session store family.
//! - [`sync`]: the shared caller policy (upsert on load, invalidate on
//!   certified failure) bound to a transport.
//! - [`fanout`]: concurrent per-key synchronization with aggregated errors.

pub mod coordinator;
pub mod fanout;
pub mod notify;
pub mod store;
pub mod sync;

pub use coordinator::{
    race_read, race_read_as, Delivery, PathOutcome, ReadFailure, ReadHandle, ReadOptions, ReadRequest,
    Settlement,
};
pub use fanout::{settle_all, FanOut, FanOutReport};
pub use notify::{Notice, NoticeLevel, Notifier};
pub use store::{
    AccountsStore, BalancesStore, FeesStore, LedgerStores, NeuronsStore, Reconcile,
    ReconcilingEntry, ReconcilingStore, StoreSnapshot, TokensStore, TransactionsStore,
};
pub use sync::{EntitySync, ResourceFetcher};
