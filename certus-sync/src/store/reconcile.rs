//! Merge policies for stored entities.

use certus_core::{Identified, TokenMetadata, TransactionPage};

/// How an incoming value is folded into the value already stored under the
/// same key.
pub trait Reconcile: Clone + Send + Sync + 'static {
    fn reconcile(&mut self, incoming: Self);
}

/// Lists merge by sub-identifier: a matching item is replaced in place, an
/// unknown item is appended, and items absent from `incoming` are kept.
impl<I> Reconcile for Vec<I>
where
    I: Identified + Clone + Send + Sync + 'static,
{
    fn reconcile(&mut self, incoming: Self) {
        for item in incoming {
            let id = item.sub_id();
            match self.iter().position(|existing| existing.sub_id() == id) {
                Some(index) => self[index] = item,
                None => self.push(item),
            }
        }
    }
}

macro_rules! replace_on_reconcile {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Reconcile for $ty {
                fn reconcile(&mut self, incoming: Self) {
                    *self = incoming;
                }
            }
        )*
    };
}

replace_on_reconcile!(u64, u128, i64, String, TokenMetadata);

impl Reconcile for TransactionPage {
    fn reconcile(&mut self, incoming: Self) {
        self.completed |= incoming.completed;
        self.transactions.reconcile(incoming.transactions);
        self.normalize();
    }
}
