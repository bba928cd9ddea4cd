//! Trust levels and trust-tagged results.
//!
//! Every value that enters a store carries the trust level of the read that
//! produced it. A query read is answered by a single replica and may be stale
//! or forged; an update read is verified against a certificate produced by
//! network consensus.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How far a fetched value can be trusted.
///
/// The ordering is meaningful: `Uncertified < Certified`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustLevel {
    /// Fast, replica-local query read.
    Uncertified,
    /// Slow update read verified against consensus.
    Certified,
}

impl TrustLevel {
    /// Both levels, query first.
    pub const ALL: [TrustLevel; 2] = [TrustLevel::Uncertified, TrustLevel::Certified];

    pub fn is_certified(self) -> bool {
        matches!(self, Self::Certified)
    }

    pub fn from_certified(certified: bool) -> Self {
        if certified {
            Self::Certified
        } else {
            Self::Uncertified
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uncertified => "uncertified",
            Self::Certified => "certified",
        }
    }
}

impl fmt::Display for TrustLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value plus the trust level of the read that produced it.
///
/// This is the only shape in which data is handed to a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustTagged<T> {
    pub value: T,
    pub trust: TrustLevel,
}

impl<T> TrustTagged<T> {
    pub fn new(value: T, trust: TrustLevel) -> Self {
        Self { value, trust }
    }

    pub fn certified(value: T) -> Self {
        Self::new(value, TrustLevel::Certified)
    }

    pub fn uncertified(value: T) -> Self {
        Self::new(value, TrustLevel::Uncertified)
    }

    pub fn is_certified(&self) -> bool {
        self.trust.is_certified()
    }

    pub fn into_value(self) -> T {
        self.value
    }

    /// Map the inner value, keeping the trust tag.
    pub fn map<U, F>(self, f: F) -> TrustTagged<U>
    where
        F: FnOnce(T) -> U,
    {
        TrustTagged {
            value: f(self.value),
            trust: self.trust,
        }
    }
}
