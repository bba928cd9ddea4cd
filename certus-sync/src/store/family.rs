//! The stores a wallet session keeps.

use certus_core::{
    Account, AccountKey, LedgerId, Neuron, Principal, ProjectId, TokenMetadata, TransactionPage,
};

use super::table::ReconcilingStore;

/// Accounts (main, subaccounts, hardware wallets) per ledger.
pub type AccountsStore = ReconcilingStore<LedgerId, Vec<Account>>;
/// Balance of one account on one ledger.
pub type BalancesStore = ReconcilingStore<AccountKey, u64>;
/// Token metadata per ledger.
pub type TokensStore = ReconcilingStore<LedgerId, TokenMetadata>;
/// Loaded transaction history per account.
pub type TransactionsStore = ReconcilingStore<AccountKey, TransactionPage>;
/// Proposal submission fee per governance project.
pub type FeesStore = ReconcilingStore<ProjectId, u64>;
/// Neurons per controlling principal.
pub type NeuronsStore = ReconcilingStore<Principal, Vec<Neuron>>;

/// Every store of a session, constructed together and reset together.
///
/// The stores are independent: no operation spans more than one of them
/// atomically.
#[derive(Debug, Clone)]
pub struct LedgerStores {
    pub accounts: AccountsStore,
    pub balances: BalancesStore,
    pub tokens: TokensStore,
    pub transactions: TransactionsStore,
    pub fees: FeesStore,
    pub neurons: NeuronsStore,
}

impl LedgerStores {
    pub fn new() -> Self {
        Self {
            accounts: ReconcilingStore::new("accounts"),
            balances: ReconcilingStore::new("balances"),
            tokens: ReconcilingStore::new("tokens"),
            transactions: ReconcilingStore::new("transactions"),
            fees: ReconcilingStore::new("fees"),
            neurons: ReconcilingStore::new("neurons"),
        }
    }

    /// Clear everything, e.g. on sign-out.
    pub fn reset_all(&self) {
        self.accounts.reset_all();
        self.balances.reset_all();
        self.tokens.reset_all();
        self.transactions.reset_all();
        self.fees.reset_all();
        self.neurons.reset_all();
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
            && self.balances.is_empty()
            && self.tokens.is_empty()
            && self.transactions.is_empty()
            && self.fees.is_empty()
            && self.neurons.is_empty()
    }
}

impl Default for LedgerStores {
    fn default() -> Self {
        Self::new()
    }
}
