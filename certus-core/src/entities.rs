//! Ledger and governance entities shown by the client.

use crate::{AccountIdentifier, Timestamp};
use serde::{Deserialize, Serialize};
use std::hash::Hash;

/// An item inside a list-shaped entity that has its own identity.
///
/// Stores merge lists by this sub-identifier.
pub trait Identified {
    type Id: Eq + Hash + Clone;

    fn sub_id(&self) -> Self::Id;
}

/// Kind of account shown in the wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    Main,
    Subaccount,
    HardwareWallet,
}

/// An account on a ledger with its last known balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub identifier: AccountIdentifier,
    pub name: Option<String>,
    pub balance_e8s: u64,
    pub kind: AccountKind,
}

impl Account {
    pub fn main(identifier: impl Into<AccountIdentifier>, balance_e8s: u64) -> Self {
        Self {
            identifier: identifier.into(),
            name: None,
            balance_e8s,
            kind: AccountKind::Main,
        }
    }

    pub fn subaccount(
        identifier: impl Into<AccountIdentifier>,
        name: impl Into<String>,
        balance_e8s: u64,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            name: Some(name.into()),
            balance_e8s,
            kind: AccountKind::Subaccount,
        }
    }
}

impl Identified for Account {
    type Id = AccountIdentifier;

    fn sub_id(&self) -> AccountIdentifier {
        self.identifier.clone()
    }
}

/// Token metadata published by a ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    pub fee_e8s: u64,
}

/// A ledger transaction as seen from one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: u64,
    pub from: AccountIdentifier,
    pub to: AccountIdentifier,
    pub amount_e8s: u64,
    pub fee_e8s: u64,
    pub memo: Option<u64>,
    pub timestamp: Timestamp,
}

impl Identified for Transaction {
    type Id = u64;

    fn sub_id(&self) -> u64 {
        self.id
    }
}

/// A window of an account's transaction history.
///
/// Transactions are kept newest first. `oldest_tx_id` is the lowest id
/// loaded so far and is the cursor for the next page; `completed` is set once
/// the ledger reports there is nothing older.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransactionPage {
    pub transactions: Vec<Transaction>,
    pub oldest_tx_id: Option<u64>,
    pub completed: bool,
}

impl TransactionPage {
    pub fn new(transactions: Vec<Transaction>, completed: bool) -> Self {
        let mut page = Self {
            transactions,
            oldest_tx_id: None,
            completed,
        };
        page.normalize();
        page
    }

    /// Cursor for the next (older) page, if there is one.
    pub fn next_cursor(&self) -> Option<u64> {
        if self.completed {
            None
        } else {
            self.oldest_tx_id
        }
    }

    /// Sort newest first and recompute the oldest loaded id.
    pub fn normalize(&mut self) {
        self.transactions.sort_by(|a, b| b.id.cmp(&a.id));
        self.oldest_tx_id = self.transactions.last().map(|tx| tx.id);
    }
}

/// Lifecycle state of a governance neuron.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeuronState {
    Locked,
    Dissolving,
    Dissolved,
    Spawning,
}

/// A governance neuron owned by the session principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Neuron {
    pub neuron_id: u64,
    pub stake_e8s: u64,
    pub dissolve_delay_seconds: u64,
    pub state: NeuronState,
}

impl Identified for Neuron {
    type Id = u64;

    fn sub_id(&self) -> u64 {
        self.neuron_id
    }
}
