//! Error types for CERTUS operations

use crate::TrustLevel;
use thiserror::Error;

/// Identity resolution errors. Fatal for the read that needed the identity.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("No identity available: no active session")]
    NotAvailable,

    #[error("Identity provider rejected the request: {reason}")]
    Rejected { reason: String },
}

/// Errors reported by the transport collaborator.
///
/// The core treats these as opaque; it only looks at the trust level of the
/// read that failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("Transport failure fetching {resource} ({trust}): {reason}")]
    Transport {
        resource: String,
        trust: TrustLevel,
        reason: String,
    },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("Request for {resource} rejected: {reason}")]
    Rejected { resource: String, reason: String },
}

impl FetchError {
    pub fn transport(resource: impl ToString, trust: TrustLevel, reason: impl Into<String>) -> Self {
        Self::Transport {
            resource: resource.to_string(),
            trust,
            reason: reason.into(),
        }
    }
}

/// Errors produced by the synchronization layer itself.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SyncError {
    #[error("Read of {key} failed at {trust} level: {reason}")]
    ReadFailed {
        key: String,
        trust: TrustLevel,
        reason: String,
    },

    #[error("Read of {key} ended without any path settling")]
    ReadAborted { key: String },

    #[error("{failed} of {total} keys failed to synchronize")]
    FanOutFailed { failed: usize, total: usize },
}

/// Configuration value errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Master error type for all CERTUS errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CertusError {
    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for CERTUS operations.
pub type CertusResult<T> = Result<T, CertusError>;
