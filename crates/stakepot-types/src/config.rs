//! Deployment-time configuration for a Stakepot engine.

use serde::{Deserialize, Serialize};

use crate::{Identity, Result, StakepotError, constants};

/// How the registry's fee percentage enters settlement accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeePolicy {
    /// The fee is reported but payouts may consume the whole pot.
    #[default]
    Informational,
    /// `pot × fee% / 100` is reserved; payouts may only consume the rest.
    DeductFromPot,
}

/// Construction-time parameters. Immutable after deployment except through
/// the fee registry's mutators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Arbiter whose signature settles lobbies.
    pub authority: Identity,
    /// Fee registry administrator; also receives settlement residuals.
    pub administrator: Identity,
    /// Fee percentage at deployment.
    #[serde(default = "default_fee_percent")]
    pub initial_fee_percent: u8,
    #[serde(default)]
    pub fee_policy: FeePolicy,
    /// Participants required before the creator may start the lobby.
    #[serde(default = "default_min_participants")]
    pub min_participants: usize,
    /// Bound on public capacity and private whitelist length.
    #[serde(default = "default_max_participants")]
    pub max_participants: usize,
}

fn default_fee_percent() -> u8 {
    constants::DEFAULT_FEE_PERCENT
}

fn default_min_participants() -> usize {
    constants::DEFAULT_MIN_PARTICIPANTS
}

fn default_max_participants() -> usize {
    constants::MAX_PARTICIPANTS
}

impl EngineConfig {
    /// Config with default fee, policy and participant bounds.
    #[must_use]
    pub fn new(authority: Identity, administrator: Identity) -> Self {
        Self {
            authority,
            administrator,
            initial_fee_percent: default_fee_percent(),
            fee_policy: FeePolicy::default(),
            min_participants: default_min_participants(),
            max_participants: default_max_participants(),
        }
    }

    #[must_use]
    pub fn with_fee_percent(mut self, percent: u8) -> Self {
        self.initial_fee_percent = percent;
        self
    }

    #[must_use]
    pub fn with_fee_policy(mut self, policy: FeePolicy) -> Self {
        self.fee_policy = policy;
        self
    }

    #[must_use]
    pub fn with_min_participants(mut self, min: usize) -> Self {
        self.min_participants = min;
        self
    }

    /// Parse and validate a JSON config document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    ///
    /// # Errors
    /// `InvalidFee` for a fee above 100, `Configuration` for bad bounds.
    pub fn validate(&self) -> Result<()> {
        if self.initial_fee_percent > constants::MAX_FEE_PERCENT {
            return Err(StakepotError::InvalidFee(self.initial_fee_percent));
        }
        if self.max_participants == 0 {
            return Err(StakepotError::Configuration(
                "max_participants must be at least 1".into(),
            ));
        }
        if self.min_participants == 0 || self.min_participants > self.max_participants {
            return Err(StakepotError::Configuration(format!(
                "min_participants must be in 1..={}, got {}",
                self.max_participants, self.min_participants
            )));
        }
        Ok(())
    }
}
