//! Identity for whom a read is made.

use crate::{IdentityError, Principal};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The identity a read is issued under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub principal: Principal,
    pub anonymous: bool,
}

impl Identity {
    pub fn new(principal: impl Into<Principal>) -> Self {
        Self {
            principal: principal.into(),
            anonymous: false,
        }
    }

    /// The well-known anonymous principal.
    pub fn anonymous() -> Self {
        Self {
            principal: Principal::from("2vxsx-fae"),
            anonymous: true,
        }
    }
}

/// Which identity a read should run under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityKind {
    /// The signed-in session's identity. Fails when nobody is signed in.
    #[default]
    Current,
    /// Public data readable without a session.
    Anonymous,
}

/// Identity collaborator.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve the identity for a read.
    ///
    /// Must fail with [`IdentityError::NotAvailable`] for
    /// [`IdentityKind::Current`] when no session exists.
    async fn resolve(&self, kind: IdentityKind) -> Result<Identity, IdentityError>;
}
