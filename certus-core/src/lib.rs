//! CERTUS Core - Entity Types
//!
//! Pure data structures shared by every other crate: trust levels, resource
//! keys, identities, ledger entities, errors and configuration. No I/O and no
//! synchronization logic lives here.

use chrono::{DateTime, Utc};

pub mod config;
pub mod entities;
pub mod error;
pub mod identity;
pub mod keys;
pub mod trust;

pub use config::{ReadStrategy, SyncConfig};
pub use entities::{
    Account, AccountKind, Identified, Neuron, NeuronState, TokenMetadata, Transaction,
    TransactionPage,
};
pub use error::{
    CertusError, CertusResult, ConfigError, FetchError, IdentityError, SyncError,
};
pub use identity::{Identity, IdentityKind, IdentityProvider};
pub use keys::{AccountIdentifier, AccountKey, LedgerId, Principal, ProjectId, ResourceKey};
pub use trust::{TrustLevel, TrustTagged};

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;
