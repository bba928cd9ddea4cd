//! Resource keys.
//!
//! A resource key names "what is being fetched". Stores are keyed by it, so
//! it must hash, compare, and render to a stable string.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;

/// Anything usable as a store key.
///
/// `Display` is the stable string form used in logs and notices.
pub trait ResourceKey: Clone + Eq + Hash + fmt::Display + fmt::Debug + Send + Sync + 'static {}

impl<K> ResourceKey for K where K: Clone + Eq + Hash + fmt::Display + fmt::Debug + Send + Sync + 'static {}

macro_rules! string_key {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_key!(
    /// Ledger canister the balances and transactions live on.
    LedgerId
);
string_key!(
    /// Governance project (one ledger, one governance canister).
    ProjectId
);
string_key!(
    /// Account identifier on a ledger.
    AccountIdentifier
);
string_key!(
    /// Principal a session acts for.
    Principal
);

/// One account on one ledger.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountKey {
    pub ledger: LedgerId,
    pub account: AccountIdentifier,
}

impl AccountKey {
    pub fn new(ledger: impl Into<LedgerId>, account: impl Into<AccountIdentifier>) -> Self {
        Self {
            ledger: ledger.into(),
            account: account.into(),
        }
    }
}

impl fmt::Display for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.ledger, self.account)
    }
}
