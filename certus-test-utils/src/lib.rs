//! CERTUS Test Utilities
//!
//! Centralized test infrastructure for the CERTUS workspace:
//! - Scripted transports with per-trust-level delays and outcomes
//! - Static identity providers
//! - A notifier that records what it was told
//! - Proptest generators for ledger entities

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

// Re-export core types for convenience
pub use certus_core::{
    Account, AccountIdentifier, AccountKey, AccountKind, FetchError, Identity, IdentityError,
    IdentityKind, IdentityProvider, LedgerId, Neuron, NeuronState, Principal, ProjectId,
    ResourceKey, Timestamp, TokenMetadata, Transaction, TransactionPage, TrustLevel,
};
pub use certus_sync::{Notice, NoticeLevel, Notifier, ResourceFetcher};

// ============================================================================
// SCRIPTED TRANSPORT
// ============================================================================

/// What a scripted read path answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply<T> {
    Value(T),
    Fail(String),
}

/// One scripted read path: wait `delay`, then reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script<T> {
    pub delay: Duration,
    pub reply: Reply<T>,
}

impl<T> Script<T> {
    pub fn ok(delay_ms: u64, value: T) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            reply: Reply::Value(value),
        }
    }

    pub fn fail(delay_ms: u64, reason: impl Into<String>) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            reply: Reply::Fail(reason.into()),
        }
    }
}

/// A recorded fetch call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchCall<K> {
    pub key: K,
    pub trust: TrustLevel,
    pub identity: Identity,
}

/// Transport whose answers are scripted per key and trust level.
///
/// Delays use `tokio::time`, so tests running with paused time get exact,
/// deterministic orderings. Unscripted reads fail with `NotFound`.
pub struct ScriptedFetcher<K, T> {
    scripts: Mutex<HashMap<(K, TrustLevel), Script<T>>>,
    calls: Mutex<Vec<FetchCall<K>>>,
}

impl<K, T> ScriptedFetcher<K, T>
where
    K: ResourceKey,
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Script one path of `key`.
    pub fn script(&self, key: K, trust: TrustLevel, script: Script<T>) -> &Self {
        self.scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((key, trust), script);
        self
    }

    /// Script both paths of `key`.
    pub fn respond(&self, key: K, query: Script<T>, update: Script<T>) -> &Self {
        self.script(key.clone(), TrustLevel::Uncertified, query);
        self.script(key, TrustLevel::Certified, update)
    }

    pub fn calls(&self) -> Vec<FetchCall<K>> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl<K, T> Default for ScriptedFetcher<K, T>
where
    K: ResourceKey,
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<K, T> ResourceFetcher<K, T> for ScriptedFetcher<K, T>
where
    K: ResourceKey,
    T: Clone + Send + Sync + 'static,
{
    async fn fetch(
        &self,
        key: &K,
        trust: TrustLevel,
        identity: &Identity,
    ) -> Result<T, FetchError> {
        let script = {
            self.calls
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(FetchCall {
                    key: key.clone(),
                    trust,
                    identity: identity.clone(),
                });
            self.scripts
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .get(&(key.clone(), trust))
                .cloned()
        };

        let Some(script) = script else {
            return Err(FetchError::NotFound {
                resource: key.to_string(),
            });
        };

        tokio::time::sleep(script.delay).await;
        match script.reply {
            Reply::Value(value) => Ok(value),
            Reply::Fail(reason) => Err(FetchError::transport(key, trust, reason)),
        }
    }
}

/// One scripted fetcher per resource type of a wallet session.
#[derive(Default)]
pub struct ScriptedLedger {
    pub accounts: ScriptedFetcher<LedgerId, Vec<Account>>,
    pub balances: ScriptedFetcher<AccountKey, u64>,
    pub tokens: ScriptedFetcher<LedgerId, TokenMetadata>,
    pub transactions: ScriptedFetcher<AccountKey, TransactionPage>,
    pub fees: ScriptedFetcher<ProjectId, u64>,
    pub neurons: ScriptedFetcher<Principal, Vec<Neuron>>,
}

impl ScriptedLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

macro_rules! delegate_fetch {
    ($field:ident: $key:ty => $value:ty) => {
        #[async_trait]
        impl ResourceFetcher<$key, $value> for ScriptedLedger {
            async fn fetch(
                &self,
                key: &$key,
                trust: TrustLevel,
                identity: &Identity,
            ) -> Result<$value, FetchError> {
                self.$field.fetch(key, trust, identity).await
            }
        }
    };
}

delegate_fetch!(accounts: LedgerId => Vec<Account>);
delegate_fetch!(balances: AccountKey => u64);
delegate_fetch!(tokens: LedgerId => TokenMetadata);
delegate_fetch!(transactions: AccountKey => TransactionPage);
delegate_fetch!(fees: ProjectId => u64);
delegate_fetch!(neurons: Principal => Vec<Neuron>);

// ============================================================================
// IDENTITY AND NOTICES
// ============================================================================

/// Identity provider with a fixed, switchable session.
pub struct StaticIdentity {
    session: Mutex<Option<Identity>>,
}

impl StaticIdentity {
    pub fn signed_in(principal: impl Into<Principal>) -> Self {
        Self {
            session: Mutex::new(Some(Identity::new(principal))),
        }
    }

    pub fn signed_out() -> Self {
        Self {
            session: Mutex::new(None),
        }
    }

    pub fn sign_out(&self) {
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn resolve(&self, kind: IdentityKind) -> Result<Identity, IdentityError> {
        match kind {
            IdentityKind::Anonymous => Ok(Identity::anonymous()),
            IdentityKind::Current => self
                .session
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
                .ok_or(IdentityError::NotAvailable),
        }
    }
}

/// Notifier that keeps every notice.
#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn errors(&self) -> Vec<Notice> {
        self.notices()
            .into_iter()
            .filter(|notice| notice.level == NoticeLevel::Error)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.notices.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice);
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

/// A transaction with deterministic fields derived from `id`.
pub fn transaction(id: u64) -> Transaction {
    Transaction {
        id,
        from: AccountIdentifier::from("sender"),
        to: AccountIdentifier::from("receiver"),
        amount_e8s: id * 1_000,
        fee_e8s: 10_000,
        memo: None,
        timestamp: Timestamp::from_timestamp(1_700_000_000 + id as i64, 0).unwrap_or_default(),
    }
}

pub fn icp_token() -> TokenMetadata {
    TokenMetadata {
        symbol: "ICP".to_string(),
        name: "Internet Computer".to_string(),
        decimals: 8,
        fee_e8s: 10_000,
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating CERTUS entity types.

    use super::*;
    use proptest::prelude::*;

    /// Generate a TrustLevel variant.
    pub fn arb_trust_level() -> impl Strategy<Value = TrustLevel> {
        prop_oneof![Just(TrustLevel::Uncertified), Just(TrustLevel::Certified)]
    }

    /// Generate a short hex account identifier.
    pub fn arb_account_identifier() -> impl Strategy<Value = AccountIdentifier> {
        "[a-f0-9]{4,8}".prop_map(AccountIdentifier::from)
    }

    /// Generate an AccountKind variant.
    pub fn arb_account_kind() -> impl Strategy<Value = AccountKind> {
        prop_oneof![
            Just(AccountKind::Main),
            Just(AccountKind::Subaccount),
            Just(AccountKind::HardwareWallet),
        ]
    }

    /// Generate an Account.
    pub fn arb_account() -> impl Strategy<Value = Account> {
        (
            arb_account_identifier(),
            proptest::option::of("[A-Za-z ]{1,12}"),
            any::<u64>(),
            arb_account_kind(),
        )
            .prop_map(|(identifier, name, balance_e8s, kind)| Account {
                identifier,
                name,
                balance_e8s,
                kind,
            })
    }

    /// Generate a list of accounts with distinct identifiers.
    pub fn arb_accounts(max: usize) -> impl Strategy<Value = Vec<Account>> {
        proptest::collection::vec(arb_account(), 0..=max).prop_map(|accounts| {
            let mut seen = std::collections::HashSet::new();
            accounts
                .into_iter()
                .filter(|account| seen.insert(account.identifier.clone()))
                .collect()
        })
    }

    /// Generate a Transaction with an id in `0..10_000`.
    pub fn arb_transaction() -> impl Strategy<Value = Transaction> {
        (0u64..10_000).prop_map(transaction)
    }

    /// Generate a NeuronState variant.
    pub fn arb_neuron_state() -> impl Strategy<Value = NeuronState> {
        prop_oneof![
            Just(NeuronState::Locked),
            Just(NeuronState::Dissolving),
            Just(NeuronState::Dissolved),
            Just(NeuronState::Spawning),
        ]
    }

    /// Generate a Neuron.
    pub fn arb_neuron() -> impl Strategy<Value = Neuron> {
        (any::<u64>(), any::<u64>(), 0u64..252_460_800, arb_neuron_state()).prop_map(
            |(neuron_id, stake_e8s, dissolve_delay_seconds, state)| Neuron {
                neuron_id,
                stake_e8s,
                dissolve_delay_seconds,
                state,
            },
        )
    }
}
