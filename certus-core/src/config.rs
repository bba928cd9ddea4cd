//! Configuration types

use crate::{ConfigError, TrustLevel};
use serde::{Deserialize, Serialize};

/// Which read paths a dual read issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadStrategy {
    /// Race a query read against an update read.
    #[default]
    QueryAndUpdate,
    /// Only the fast uncertified read.
    Query,
    /// Only the certified read.
    Update,
}

impl ReadStrategy {
    /// Trust levels issued by this strategy, query first.
    pub fn trust_levels(self) -> &'static [TrustLevel] {
        match self {
            Self::QueryAndUpdate => &TrustLevel::ALL,
            Self::Query => &[TrustLevel::Uncertified],
            Self::Update => &[TrustLevel::Certified],
        }
    }

    /// Highest trust level this strategy can produce.
    pub fn highest_trust(self) -> TrustLevel {
        match self {
            Self::Query => TrustLevel::Uncertified,
            Self::QueryAndUpdate | Self::Update => TrustLevel::Certified,
        }
    }
}

/// Settings for the read/reconciliation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    /// Overrides the strategy of every read when set.
    pub force_strategy: Option<ReadStrategy>,
    /// Surface uncertified failures as non-blocking warnings.
    pub soft_notice_on_uncertified_error: bool,
    /// Emit a debug event for every settled read path.
    pub log_reads: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            force_strategy: None,
            soft_notice_on_uncertified_error: false,
            log_reads: true,
        }
    }
}

impl SyncConfig {
    /// Strategy to use for a read that asked for `requested`.
    pub fn effective_strategy(&self, requested: ReadStrategy) -> ReadStrategy {
        self.force_strategy.unwrap_or(requested)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.soft_notice_on_uncertified_error
            && self.force_strategy == Some(ReadStrategy::Update)
        {
            return Err(ConfigError::InvalidValue {
                field: "soft_notice_on_uncertified_error".to_string(),
                reason: "no uncertified reads are issued when force_strategy is update"
                    .to_string(),
            });
        }
        Ok(())
    }
}
