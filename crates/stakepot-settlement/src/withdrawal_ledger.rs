//! Withdrawal ledger: per-identity pull balances.
//!
//! Balances only grow through settlement credits and only shrink through a
//! full-balance withdrawal by their owner. Credits are additive: an identity
//! settled in several lobbies accumulates across all of them.

use std::collections::HashMap;

use rust_decimal::Decimal;
use stakepot_types::{Amount, Identity, Result, StakepotError};

/// New balances computed against the current ledger, ready to commit.
///
/// Produced by [`WithdrawalLedger::stage`]; committing it cannot fail.
#[derive(Debug)]
#[must_use]
pub struct StagedCredits {
    balances: HashMap<Identity, Amount>,
}

/// Identity → withdrawable balance.
#[derive(Debug, Default)]
pub struct WithdrawalLedger {
    balances: HashMap<Identity, Amount>,
}

impl WithdrawalLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Withdrawable balance (zero for unknown identities).
    #[must_use]
    pub fn balance_of(&self, identity: Identity) -> Amount {
        self.balances.get(&identity).copied().unwrap_or(Decimal::ZERO)
    }

    /// Compute the balances after applying `credits`, without mutating.
    ///
    /// The same identity may appear more than once; its credits add up.
    ///
    /// # Errors
    /// `ArithmeticOverflow` if any resulting balance overflows.
    pub fn stage(&self, credits: &[(Identity, Amount)]) -> Result<StagedCredits> {
        let mut balances: HashMap<Identity, Amount> = HashMap::with_capacity(credits.len());
        for &(identity, amount) in credits {
            if amount.is_zero() {
                continue;
            }
            let current = balances
                .get(&identity)
                .copied()
                .unwrap_or_else(|| self.balance_of(identity));
            let updated = current
                .checked_add(amount)
                .ok_or(StakepotError::ArithmeticOverflow)?;
            balances.insert(identity, updated);
        }
        Ok(StagedCredits { balances })
    }

    /// Write staged balances.
    pub fn commit(&mut self, staged: StagedCredits) {
        self.balances.extend(staged.balances);
    }

    /// Stage and commit in one step.
    pub fn credit_all(&mut self, credits: &[(Identity, Amount)]) -> Result<()> {
        let staged = self.stage(credits)?;
        self.commit(staged);
        Ok(())
    }

    /// Zero the entry and return what it held.
    ///
    /// # Errors
    /// `NothingToWithdraw` if the balance is zero.
    pub fn take(&mut self, identity: Identity) -> Result<Amount> {
        match self.balances.remove(&identity) {
            Some(amount) if !amount.is_zero() => Ok(amount),
            _ => Err(StakepotError::NothingToWithdraw),
        }
    }

    /// Put back an amount removed by [`take`](Self::take) whose transfer failed.
    pub fn restore(&mut self, identity: Identity, amount: Amount) {
        *self.balances.entry(identity).or_insert(Decimal::ZERO) += amount;
    }

    /// Sum of all withdrawable balances.
    ///
    /// # Errors
    /// `ArithmeticOverflow` if the sum does not fit an [`Amount`].
    pub fn total_outstanding(&self) -> Result<Amount> {
        self.balances
            .values()
            .try_fold(Decimal::ZERO, |acc, balance| acc.checked_add(*balance))
            .ok_or(StakepotError::ArithmeticOverflow)
    }

    /// Number of identities with a non-zero balance.
    #[must_use]
    pub fn len(&self) -> usize {
        self.balances.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }
}
