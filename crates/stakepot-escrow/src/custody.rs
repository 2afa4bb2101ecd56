//! Value custody: the boundary to wallet infrastructure.
//!
//! The escrow core never holds value itself. It asks a [`ValueCustody`]
//! implementation to collect a caller's stake into escrow or to disburse a
//! withdrawal back out. A failed transfer changes nothing on the custody
//! side; the engine rolls back its own paired mutation.

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use stakepot_types::{Amount, Identity, Result, StakepotError};

/// Moves value between caller wallets and the escrow.
pub trait ValueCustody {
    /// Debit `amount` from `from` into escrow.
    ///
    /// # Errors
    /// Any error means no value moved.
    fn collect(&mut self, from: Identity, amount: Amount) -> Result<()>;

    /// Credit `amount` from escrow to `to`.
    ///
    /// # Errors
    /// Any error means no value moved.
    fn disburse(&mut self, to: Identity, amount: Amount) -> Result<()>;

    /// Value currently held in escrow.
    fn escrowed(&self) -> Amount;
}

/// In-memory wallets plus an escrow balance.
///
/// Recipients can be flagged to reject incoming value, which models a
/// receiving wallet whose receipt hook fails.
#[derive(Debug, Default)]
pub struct InMemoryCustody {
    wallets: HashMap<Identity, Amount>,
    escrowed: Amount,
    rejecting: HashSet<Identity>,
}

impl InMemoryCustody {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add value to a wallet from outside the system.
    pub fn fund(&mut self, identity: Identity, amount: Amount) {
        *self.wallets.entry(identity).or_insert(Decimal::ZERO) += amount;
    }

    /// Wallet balance (zero for unknown identities).
    #[must_use]
    pub fn wallet(&self, identity: Identity) -> Amount {
        self.wallets.get(&identity).copied().unwrap_or(Decimal::ZERO)
    }

    /// Make every disbursement to `identity` fail until cleared.
    pub fn reject_incoming(&mut self, identity: Identity) {
        self.rejecting.insert(identity);
    }

    pub fn accept_incoming(&mut self, identity: Identity) {
        self.rejecting.remove(&identity);
    }

    /// Total of wallets plus escrow.
    ///
    /// # Errors
    /// `ArithmeticOverflow` if the total does not fit an [`Amount`].
    pub fn total_supply(&self) -> Result<Amount> {
        self.wallets
            .values()
            .try_fold(self.escrowed, |acc, wallet| acc.checked_add(*wallet))
            .ok_or(StakepotError::ArithmeticOverflow)
    }
}

impl ValueCustody for InMemoryCustody {
    fn collect(&mut self, from: Identity, amount: Amount) -> Result<()> {
        let available = self.wallet(from);
        if available < amount {
            return Err(StakepotError::InsufficientFunds {
                needed: amount,
                available,
            });
        }
        let escrowed = self
            .escrowed
            .checked_add(amount)
            .ok_or(StakepotError::ArithmeticOverflow)?;
        self.wallets.insert(from, available - amount);
        self.escrowed = escrowed;
        Ok(())
    }

    fn disburse(&mut self, to: Identity, amount: Amount) -> Result<()> {
        if self.rejecting.contains(&to) {
            return Err(StakepotError::CustodyFailed {
                reason: format!("recipient {to} rejected transfer"),
            });
        }
        if self.escrowed < amount {
            return Err(StakepotError::CustodyFailed {
                reason: format!("escrow holds {}, asked for {amount}", self.escrowed),
            });
        }
        let wallet = self
            .wallet(to)
            .checked_add(amount)
            .ok_or(StakepotError::ArithmeticOverflow)?;
        self.escrowed -= amount;
        self.wallets.insert(to, wallet);
        Ok(())
    }

    fn escrowed(&self) -> Amount {
        self.escrowed
    }
}
