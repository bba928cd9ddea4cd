//! Wallet session: one transport, one identity provider and the store family
//! of a signed-in user, wired through entity syncs.

use std::collections::HashSet;
use std::sync::Arc;

use certus_core::{
    Account, AccountKey, IdentityKind, IdentityProvider, LedgerId, Neuron, Principal, ProjectId,
    SyncConfig, TokenMetadata, TransactionPage,
};
use certus_sync::{EntitySync, FanOut, FanOutReport, LedgerStores, ReadHandle, ResourceFetcher};
use tracing::info;

use crate::config::ClientConfig;
use crate::error::ClientResult;
use crate::notifications::Toasts;

/// Everything a wallet transport must be able to fetch.
pub trait LedgerTransport:
    ResourceFetcher<LedgerId, Vec<Account>>
    + ResourceFetcher<AccountKey, u64>
    + ResourceFetcher<LedgerId, TokenMetadata>
    + ResourceFetcher<AccountKey, TransactionPage>
    + ResourceFetcher<ProjectId, u64>
    + ResourceFetcher<Principal, Vec<Neuron>>
    + 'static
{
}

impl<X> LedgerTransport for X where
    X: ResourceFetcher<LedgerId, Vec<Account>>
        + ResourceFetcher<AccountKey, u64>
        + ResourceFetcher<LedgerId, TokenMetadata>
        + ResourceFetcher<AccountKey, TransactionPage>
        + ResourceFetcher<ProjectId, u64>
        + ResourceFetcher<Principal, Vec<Neuron>>
        + 'static
{
}

pub struct WalletSession {
    stores: LedgerStores,
    toasts: Arc<Toasts>,
    accounts: EntitySync<LedgerId, Vec<Account>>,
    balances: EntitySync<AccountKey, u64>,
    tokens: EntitySync<LedgerId, TokenMetadata>,
    transactions: EntitySync<AccountKey, TransactionPage>,
    fees: EntitySync<ProjectId, u64>,
    neurons: EntitySync<Principal, Vec<Neuron>>,
    balances_fan_out: FanOut,
    fees_fan_out: FanOut,
}

impl WalletSession {
    pub fn new<X: LedgerTransport>(
        transport: Arc<X>,
        identities: Arc<dyn IdentityProvider>,
        toasts: Arc<Toasts>,
        sync: SyncConfig,
    ) -> Self {
        let stores = LedgerStores::new();
        let notifier = toasts.clone();

        let accounts = EntitySync::new(
            "accounts",
            transport.clone() as Arc<dyn ResourceFetcher<LedgerId, Vec<Account>>>,
            identities.clone(),
            stores.accounts.clone(),
            notifier.clone(),
        );
        let balances = EntitySync::new(
            "balance",
            transport.clone() as Arc<dyn ResourceFetcher<AccountKey, u64>>,
            identities.clone(),
            stores.balances.clone(),
            notifier.clone(),
        );
        // Token metadata is public.
        let tokens = EntitySync::new(
            "token metadata",
            transport.clone() as Arc<dyn ResourceFetcher<LedgerId, TokenMetadata>>,
            identities.clone(),
            stores.tokens.clone(),
            notifier.clone(),
        )
        .with_identity_kind(IdentityKind::Anonymous);
        let transactions = EntitySync::new(
            "transactions",
            transport.clone() as Arc<dyn ResourceFetcher<AccountKey, TransactionPage>>,
            identities.clone(),
            stores.transactions.clone(),
            notifier.clone(),
        );
        let fees = EntitySync::new(
            "transaction fee",
            transport.clone() as Arc<dyn ResourceFetcher<ProjectId, u64>>,
            identities.clone(),
            stores.fees.clone(),
            notifier.clone(),
        )
        .with_identity_kind(IdentityKind::Anonymous);
        let neurons = EntitySync::new(
            "neurons",
            transport as Arc<dyn ResourceFetcher<Principal, Vec<Neuron>>>,
            identities,
            stores.neurons.clone(),
            notifier.clone(),
        );

        Self {
            balances_fan_out: FanOut::new(notifier.clone(), "Some balances could not be loaded"),
            fees_fan_out: FanOut::new(notifier, "Some transaction fees could not be loaded"),
            accounts: accounts.with_config(sync.clone()),
            balances: balances.with_config(sync.clone()),
            tokens: tokens.with_config(sync.clone()),
            transactions: transactions.with_config(sync.clone()),
            fees: fees.with_config(sync.clone()),
            neurons: neurons.with_config(sync),
            stores,
            toasts,
        }
    }

    /// Build a session from a loaded client configuration.
    pub fn from_config<X: LedgerTransport>(
        config: &ClientConfig,
        transport: Arc<X>,
        identities: Arc<dyn IdentityProvider>,
    ) -> Self {
        let toasts = Arc::new(Toasts::new(config.notifications.max_retained));
        Self::new(transport, identities, toasts, config.sync.clone())
    }

    pub fn stores(&self) -> &LedgerStores {
        &self.stores
    }

    pub fn toasts(&self) -> &Toasts {
        &self.toasts
    }

    pub async fn sync_accounts(&self, ledger: &LedgerId) -> ClientResult<ReadHandle> {
        Ok(self.accounts.load(ledger).await?)
    }

    pub async fn sync_token(&self, ledger: &LedgerId) -> ClientResult<ReadHandle> {
        Ok(self.tokens.load(ledger).await?)
    }

    pub async fn sync_transactions(&self, key: &AccountKey) -> ClientResult<ReadHandle> {
        Ok(self.transactions.load(key).await?)
    }

    pub async fn sync_neurons(&self, principal: &Principal) -> ClientResult<ReadHandle> {
        Ok(self.neurons.load(principal).await?)
    }

    /// Refresh the balance of every account not in `excluded`.
    ///
    /// Fails as a whole, without a toast, when no identity is available.
    pub async fn sync_balances(
        &self,
        keys: &[AccountKey],
        excluded: &HashSet<AccountKey>,
    ) -> ClientResult<FanOutReport<AccountKey>> {
        Ok(self
            .balances
            .load_all(&self.balances_fan_out, keys, excluded)
            .await?)
    }

    /// Refresh the transfer fee of every project not in `excluded`.
    pub async fn sync_fees(
        &self,
        projects: &[ProjectId],
        excluded: &HashSet<ProjectId>,
    ) -> ClientResult<FanOutReport<ProjectId>> {
        Ok(self.fees.load_all(&self.fees_fan_out, projects, excluded).await?)
    }

    /// Drop everything the session loaded.
    ///
    /// Reads still in flight are not cancelled and may repopulate a store;
    /// callers sign the identity provider out first so new reads fail.
    pub fn sign_out(&self) {
        self.stores.reset_all();
        self.toasts.clear();
        info!("session data cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use certus_core::TrustLevel;
    use certus_test_utils::{Script, ScriptedLedger, StaticIdentity};

    fn session(ledger: Arc<ScriptedLedger>) -> WalletSession {
        WalletSession::new(
            ledger,
            Arc::new(StaticIdentity::signed_out()),
            Arc::new(Toasts::new(5)),
            SyncConfig::default(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_token_metadata_reads_anonymously() {
        let ledger = Arc::new(ScriptedLedger::new());
        let icp = LedgerId::from("icp");
        ledger.tokens.respond(
            icp.clone(),
            Script::ok(1, certus_test_utils::icp_token()),
            Script::ok(2, certus_test_utils::icp_token()),
        );
        let session = session(ledger.clone());

        session.sync_token(&icp).await.unwrap().settled().await;

        assert_eq!(session.stores().tokens.trust(&icp), Some(TrustLevel::Certified));
        assert!(ledger.tokens.calls().iter().all(|call| call.identity.anonymous));
    }

    #[tokio::test(start_paused = true)]
    async fn test_private_reads_need_a_session() {
        let session = session(Arc::new(ScriptedLedger::new()));
        assert!(session.sync_accounts(&LedgerId::from("icp")).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_balance_fan_out_without_session_fails_once() {
        let ledger = Arc::new(ScriptedLedger::new());
        let session = session(ledger.clone());
        let keys = vec![
            AccountKey::new("icp", "main"),
            AccountKey::new("icp", "savings"),
            AccountKey::new("icp", "spare"),
        ];

        let result = session.sync_balances(&keys, &HashSet::new()).await;

        assert!(matches!(
            result,
            Err(crate::ClientError::Sync(certus_core::CertusError::Identity(
                certus_core::IdentityError::NotAvailable
            )))
        ));
        assert_eq!(ledger.balances.call_count(), 0);
        assert!(session.toasts().is_empty());
    }
}
