//! Platform fee registry.
//!
//! Holds one percentage (0–100) and the administrator allowed to change it.
//! Settlement reads the percentage at the moment a lobby ends, so a change
//! never affects lobbies that already ended.

use rust_decimal::Decimal;
use stakepot_types::{Amount, Identity, Result, StakepotError, constants};

#[derive(Debug, Clone)]
pub struct FeeRegistry {
    fee_percent: u8,
    administrator: Identity,
}

impl FeeRegistry {
    /// # Errors
    /// `InvalidFee` if `initial_percent > 100`.
    pub fn new(administrator: Identity, initial_percent: u8) -> Result<Self> {
        validate_fee(initial_percent)?;
        Ok(Self {
            fee_percent: initial_percent,
            administrator,
        })
    }

    #[must_use]
    pub fn fee(&self) -> u8 {
        self.fee_percent
    }

    #[must_use]
    pub fn administrator(&self) -> Identity {
        self.administrator
    }

    /// Replace the fee percentage.
    ///
    /// # Errors
    /// `Unauthorized` unless `requester` is the administrator, `InvalidFee`
    /// if `new_percent > 100`.
    pub fn set_fee(&mut self, requester: Identity, new_percent: u8) -> Result<()> {
        self.ensure_administrator(requester)?;
        validate_fee(new_percent)?;
        let old = std::mem::replace(&mut self.fee_percent, new_percent);
        tracing::info!(old, new = new_percent, "platform fee updated");
        Ok(())
    }

    /// Hand the administrator role to `new_administrator`.
    ///
    /// # Errors
    /// `Unauthorized` unless `requester` is the current administrator.
    pub fn transfer_administration(
        &mut self,
        requester: Identity,
        new_administrator: Identity,
    ) -> Result<()> {
        self.ensure_administrator(requester)?;
        self.administrator = new_administrator;
        tracing::info!(from = %requester, to = %new_administrator, "fee administrator changed");
        Ok(())
    }

    /// The percentage as a rate in `0..=1`.
    #[must_use]
    pub fn rate(&self) -> Decimal {
        Decimal::new(i64::from(self.fee_percent), 2)
    }

    /// `amount × fee% / 100`, never more than `amount`.
    ///
    /// # Errors
    /// `ArithmeticOverflow` if the multiplication overflows.
    pub fn fee_on(&self, amount: Amount) -> Result<Amount> {
        amount
            .checked_mul(self.rate())
            .ok_or(StakepotError::ArithmeticOverflow)
    }

    fn ensure_administrator(&self, requester: Identity) -> Result<()> {
        if requester == self.administrator {
            Ok(())
        } else {
            tracing::warn!(%requester, "fee registry change rejected");
            Err(StakepotError::Unauthorized)
        }
    }
}

fn validate_fee(percent: u8) -> Result<()> {
    if percent > constants::MAX_FEE_PERCENT {
        return Err(StakepotError::InvalidFee(percent));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> (FeeRegistry, Identity) {
        let admin = Identity::random();
        (FeeRegistry::new(admin, 5).unwrap(), admin)
    }

    #[test]
    fn initial_fee_is_reported() {
        let (registry, admin) = registry();
        assert_eq!(registry.fee(), 5);
        assert_eq!(registry.administrator(), admin);
    }

    #[test]
    fn initial_fee_above_hundred_rejected() {
        let err = FeeRegistry::new(Identity::random(), 101).unwrap_err();
        assert_eq!(err, StakepotError::InvalidFee(101));
    }

    #[test]
    fn administrator_updates_fee() {
        let (mut registry, admin) = registry();
        registry.set_fee(admin, 10).unwrap();
        assert_eq!(registry.fee(), 10);
        registry.set_fee(admin, 100).unwrap();
        assert_eq!(registry.fee(), 100);
        registry.set_fee(admin, 0).unwrap();
        assert_eq!(registry.fee(), 0);
    }

    #[test]
    fn non_administrator_cannot_update() {
        let (mut registry, _) = registry();
        let err = registry.set_fee(Identity::random(), 10).unwrap_err();
        assert_eq!(err, StakepotError::Unauthorized);
        assert_eq!(registry.fee(), 5, "fee must be unchanged");
    }

    #[test]
    fn fee_above_hundred_rejected_on_update() {
        let (mut registry, admin) = registry();
        assert_eq!(registry.set_fee(admin, 150), Err(StakepotError::InvalidFee(150)));
        assert_eq!(registry.fee(), 5);
    }

    #[test]
    fn administration_transfer() {
        let (mut registry, admin) = registry();
        let successor = Identity::random();

        assert_eq!(
            registry.transfer_administration(successor, successor),
            Err(StakepotError::Unauthorized)
        );
        registry.transfer_administration(admin, successor).unwrap();
        assert_eq!(registry.administrator(), successor);
        assert_eq!(registry.set_fee(admin, 1), Err(StakepotError::Unauthorized));
        registry.set_fee(successor, 1).unwrap();
        assert_eq!(registry.fee(), 1);
    }

    #[test]
    fn fee_on_amount() {
        let (registry, _) = registry();
        assert_eq!(registry.fee_on(Decimal::TWO).unwrap(), Decimal::new(1, 1));
        assert_eq!(
            registry.fee_on(Decimal::new(3, 0)).unwrap(),
            Decimal::new(15, 2)
        );
    }

    #[test]
    fn fee_on_near_max_amount() {
        let (mut registry, admin) = registry();
        for percent in [0u8, 1, 5, 50, 99, 100] {
            registry.set_fee(admin, percent).unwrap();
            let fee = registry.fee_on(Decimal::MAX).unwrap();
            assert!(fee <= Decimal::MAX);
            assert!(fee >= Decimal::ZERO);
        }
        assert_eq!(registry.fee_on(Decimal::MAX).unwrap(), Decimal::MAX);
    }
}
