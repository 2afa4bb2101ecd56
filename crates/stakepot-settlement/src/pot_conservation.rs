//! Pot conservation invariant checker.
//!
//! Invariant checked on demand:
//! ```text
//! Σ(open lobby pots) + Σ(withdrawable balances) == Σ(collected) − Σ(disbursed)
//! ```
//!
//! Settlement only moves value from a pot into ledger balances, so it never
//! changes either side. If the two sides disagree, value was created or lost.
//!
//! Updates are computed with [`after_collect`](PotConservation::after_collect)
//! / [`after_disburse`](PotConservation::after_disburse) before any value
//! moves, so an overflowing lifetime total rejects the operation instead of
//! leaving it half applied.

use rust_decimal::Decimal;
use stakepot_types::{Amount, Result, StakepotError};

/// Running totals of value that entered and left custody.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[must_use]
pub struct PotConservation {
    collected: Amount,
    disbursed: Amount,
}

impl PotConservation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Totals after collecting `amount` into escrow (lobby creation or join).
    ///
    /// # Errors
    /// `ArithmeticOverflow` if the lifetime total would overflow.
    pub fn after_collect(self, amount: Amount) -> Result<Self> {
        let collected = self
            .collected
            .checked_add(amount)
            .ok_or(StakepotError::ArithmeticOverflow)?;
        Ok(Self { collected, ..self })
    }

    /// Totals after paying `amount` out of escrow (withdrawal).
    ///
    /// # Errors
    /// `ArithmeticOverflow` if the lifetime total would overflow.
    pub fn after_disburse(self, amount: Amount) -> Result<Self> {
        let disbursed = self
            .disbursed
            .checked_add(amount)
            .ok_or(StakepotError::ArithmeticOverflow)?;
        Ok(Self { disbursed, ..self })
    }

    /// Value that should still be held: collected − disbursed.
    #[must_use]
    pub fn expected_held(&self) -> Amount {
        self.collected - self.disbursed
    }

    #[must_use]
    pub fn total_collected(&self) -> Amount {
        self.collected
    }

    #[must_use]
    pub fn total_disbursed(&self) -> Amount {
        self.disbursed
    }

    /// # Errors
    /// [`StakepotError::ConservationViolation`] if `actual_held ≠ expected`.
    pub fn verify(&self, actual_held: Amount) -> Result<()> {
        let expected = self.expected_held();
        if actual_held != expected {
            return Err(StakepotError::ConservationViolation {
                reason: format!(
                    "held {actual_held} != expected {expected} \
                     (collected={}, disbursed={})",
                    self.collected, self.disbursed
                ),
            });
        }
        Ok(())
    }
}
