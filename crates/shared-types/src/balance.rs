//! # Address Balances
//!
//! An absent balance row is equivalent to zero. The distinction is kept as
//! an explicit variant so indexing strategies can dispatch create-vs-update
//! without a second lookup.

use crate::{Address, Amount, Token};
use serde::{Deserialize, Serialize};

/// A persisted balance row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceRecord {
    pub address: Address,
    pub token: Token,
    pub balance: Amount,
}

/// Lookup result for an (address, token) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressBalance {
    /// No row exists; semantically zero.
    NoBalance { address: Address, token: Token },
    /// A row exists.
    Existing(BalanceRecord),
}

impl AddressBalance {
    /// The effective amount (zero when no row exists).
    #[must_use]
    pub fn amount(&self) -> Amount {
        match self {
            Self::NoBalance { .. } => Amount::ZERO,
            Self::Existing(rec) => rec.balance,
        }
    }

    /// Apply a credit, producing the row to upsert.
    #[must_use]
    pub fn credited(&self, amount: Amount) -> Option<BalanceRecord> {
        let (address, token, current) = self.parts();
        current.checked_add(amount).map(|balance| BalanceRecord {
            address,
            token,
            balance,
        })
    }

    /// Apply a debit; `None` when funds are insufficient.
    #[must_use]
    pub fn debited(&self, amount: Amount) -> Option<BalanceRecord> {
        let (address, token, current) = self.parts();
        current.checked_sub(amount).map(|balance| BalanceRecord {
            address,
            token,
            balance,
        })
    }

    fn parts(&self) -> (Address, Token, Amount) {
        match self {
            Self::NoBalance { address, token } => (*address, token.clone(), Amount::ZERO),
            Self::Existing(rec) => (rec.address, rec.token.clone(), rec.balance),
        }
    }
}
