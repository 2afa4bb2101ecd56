//! Settlement engine: the orchestrator.
//!
//! Lobby operations are thin wrappers over the [`LobbyStore`] that pair each
//! membership change with a custody transfer. `end_game` is the core:
//! 1. Reject settled (`AlreadyEnded`) and unstarted (`LobbyNotLocked`) lobbies
//! 2. Check the payout vector lines up with the participants
//! 3. Verify the arbiter's signature over the exact `(lobby_id, payouts)`
//! 4. Check the payouts fit in the pot under the fee policy
//! 5. Mark the lobby ENDED
//! 6. Credit `payouts[i]` to `participants[i]`, residual to the administrator
//! 7. Emit the end-of-game event
//!
//! Steps 1–4 only read; everything they could reject is rejected before
//! step 5 mutates anything.

use rust_decimal::Decimal;
use stakepot_attest::{SignatureScheme, SignatureVerifier};
use stakepot_escrow::{FeeRegistry, LobbyStore, ValueCustody};
use stakepot_types::{
    Amount, EngineConfig, EventKind, EventLog, EventSink, FeePolicy, Identity, Lobby, LobbyEvent,
    LobbyId, Result, StakepotError, Visibility,
};

use crate::pot_conservation::PotConservation;
use crate::withdrawal_ledger::{StagedCredits, WithdrawalLedger};

/// Everything `end_game` computed before committing.
struct SettlementPlan {
    pot: Amount,
    fee: Amount,
    residual: Amount,
    staged: StagedCredits,
}

/// Stake-and-settle escrow engine.
///
/// Mutators take `&mut self`, so every operation is atomic and totally
/// ordered with respect to every other.
pub struct SettlementEngine<C, E = EventLog> {
    config: EngineConfig,
    lobbies: LobbyStore,
    fees: FeeRegistry,
    verifier: SignatureVerifier,
    ledger: WithdrawalLedger,
    conservation: PotConservation,
    custody: C,
    events: E,
}

impl<C: ValueCustody> SettlementEngine<C, EventLog> {
    /// Engine with the ed25519 scheme and an in-memory event log.
    ///
    /// # Errors
    /// Returns the config's validation error.
    pub fn new(config: EngineConfig, custody: C) -> Result<Self> {
        let verifier = SignatureVerifier::new(config.authority);
        Self::assemble(config, custody, EventLog::new(), verifier)
    }
}

impl<C: ValueCustody, E: EventSink> SettlementEngine<C, E> {
    /// Engine with a custom signature scheme and event sink.
    pub fn with_parts(
        config: EngineConfig,
        custody: C,
        events: E,
        scheme: Box<dyn SignatureScheme>,
    ) -> Result<Self> {
        let verifier = SignatureVerifier::with_scheme(config.authority, scheme);
        Self::assemble(config, custody, events, verifier)
    }

    fn assemble(
        config: EngineConfig,
        custody: C,
        events: E,
        verifier: SignatureVerifier,
    ) -> Result<Self> {
        config.validate()?;
        let fees = FeeRegistry::new(config.administrator, config.initial_fee_percent)?;
        tracing::info!(
            authority = %config.authority,
            administrator = %config.administrator,
            fee_percent = config.initial_fee_percent,
            fee_policy = ?config.fee_policy,
            "settlement engine initialized"
        );
        Ok(Self {
            lobbies: LobbyStore::new(config.max_participants),
            fees,
            verifier,
            ledger: WithdrawalLedger::new(),
            conservation: PotConservation::new(),
            custody,
            events,
            config,
        })
    }

    // ---------------------------------------------------------------
    // Lobby lifecycle
    // ---------------------------------------------------------------

    /// Create a public lobby; `conveyed` must equal `stake` and becomes the
    /// initial pot.
    pub fn create_public_lobby(
        &mut self,
        caller: Identity,
        stake: Amount,
        capacity: usize,
        conveyed: Amount,
    ) -> Result<LobbyId> {
        self.lobbies.validate_public(stake, capacity)?;
        ensure_conveyed(stake, conveyed)?;
        let tally = self.conservation.after_collect(conveyed)?;
        self.custody.collect(caller, conveyed)?;

        let id = match self.lobbies.create_public(caller, stake, capacity) {
            Ok(id) => id,
            Err(err) => return Err(self.refund(caller, conveyed, err)),
        };
        self.conservation = tally;
        self.emit(
            id,
            EventKind::Created {
                creator: caller,
                stake,
                visibility: Visibility::Public,
            },
        );
        Ok(id)
    }

    /// Create a private lobby restricted to `whitelist` plus the creator.
    pub fn create_private_lobby(
        &mut self,
        caller: Identity,
        stake: Amount,
        whitelist: Vec<Identity>,
        conveyed: Amount,
    ) -> Result<LobbyId> {
        self.lobbies.validate_private(stake, &whitelist)?;
        ensure_conveyed(stake, conveyed)?;
        let tally = self.conservation.after_collect(conveyed)?;
        self.custody.collect(caller, conveyed)?;

        let id = match self.lobbies.create_private(caller, stake, whitelist) {
            Ok(id) => id,
            Err(err) => return Err(self.refund(caller, conveyed, err)),
        };
        self.conservation = tally;
        self.emit(
            id,
            EventKind::Created {
                creator: caller,
                stake,
                visibility: Visibility::Private,
            },
        );
        Ok(id)
    }

    /// Deposit the stake and join an open lobby.
    pub fn join_game(&mut self, caller: Identity, lobby_id: LobbyId, conveyed: Amount) -> Result<()> {
        self.lobbies.validate_join(lobby_id, caller, conveyed)?;
        let tally = self.conservation.after_collect(conveyed)?;
        self.custody.collect(caller, conveyed)?;

        if let Err(err) = self.lobbies.join(lobby_id, caller, conveyed) {
            return Err(self.refund(caller, conveyed, err));
        }
        self.conservation = tally;
        self.emit(
            lobby_id,
            EventKind::Joined {
                participant: caller,
            },
        );
        Ok(())
    }

    /// Lock the lobby. Only its creator may call this.
    pub fn start_game(&mut self, caller: Identity, lobby_id: LobbyId) -> Result<()> {
        self.lobbies.validate_lock(lobby_id, caller)?;
        let actual = self.lobbies.participants(lobby_id)?.len();
        if actual < self.config.min_participants {
            return Err(StakepotError::NotEnoughParticipants {
                needed: self.config.min_participants,
                actual,
            });
        }
        self.lobbies.lock(lobby_id, caller)?;
        self.emit(lobby_id, EventKind::Locked);
        Ok(())
    }

    /// Settle a locked lobby with arbiter-signed payouts.
    ///
    /// Anyone may submit; the signature is what authorizes the split.
    pub fn end_game(
        &mut self,
        lobby_id: LobbyId,
        payouts: &[Amount],
        signature: &[u8],
    ) -> Result<()> {
        let plan = {
            let lobby = self.lobbies.get(lobby_id)?;
            if lobby.is_ended() {
                return Err(StakepotError::AlreadyEnded);
            }
            if !lobby.is_locked() {
                return Err(StakepotError::LobbyNotLocked);
            }
            if payouts.len() != lobby.participants.len() {
                return Err(StakepotError::LengthMismatch {
                    expected: lobby.participants.len(),
                    actual: payouts.len(),
                });
            }
            self.verifier.check(lobby_id, payouts, signature)?;
            self.plan_settlement(lobby, payouts)?
        };

        // Flag before credit.
        let pot = self.lobbies.end(lobby_id)?;
        debug_assert_eq!(pot, plan.pot);
        self.ledger.commit(plan.staged);

        tracing::info!(
            %lobby_id,
            %pot,
            fee = %plan.fee,
            residual = %plan.residual,
            "payouts credited"
        );
        self.emit(
            lobby_id,
            EventKind::Ended {
                payouts: payouts.to_vec(),
                fee: plan.fee,
                residual: plan.residual,
            },
        );
        Ok(())
    }

    fn plan_settlement(&self, lobby: &Lobby, payouts: &[Amount]) -> Result<SettlementPlan> {
        if let Some(index) = payouts.iter().position(|p| *p < Decimal::ZERO) {
            return Err(StakepotError::InvalidPayout { index });
        }
        let requested = payouts
            .iter()
            .try_fold(Decimal::ZERO, |acc, p| acc.checked_add(*p))
            .ok_or(StakepotError::ArithmeticOverflow)?;

        let pot = lobby.pot;
        let (fee, available) = match self.config.fee_policy {
            FeePolicy::Informational => {
                // Reported only; never blocks payouts.
                let fee = self.fees.fee_on(pot).unwrap_or_else(|err| {
                    tracing::warn!(lobby_id = %lobby.id, %pot, error = %err, "fee not computable");
                    Decimal::ZERO
                });
                (fee, pot)
            }
            FeePolicy::DeductFromPot => {
                let fee = self.fees.fee_on(pot)?;
                let available = pot
                    .checked_sub(fee)
                    .ok_or(StakepotError::ArithmeticOverflow)?;
                (fee, available)
            }
        };
        if requested > available {
            tracing::warn!(
                lobby_id = %lobby.id,
                %requested,
                %available,
                "signed payouts exceed pot"
            );
            return Err(StakepotError::PayoutExceedsPot {
                requested,
                available,
            });
        }

        let residual = pot - requested;
        let mut credits: Vec<(Identity, Amount)> = lobby
            .participants
            .iter()
            .copied()
            .zip(payouts.iter().copied())
            .collect();
        credits.push((self.fees.administrator(), residual));
        let staged = self.ledger.stage(&credits)?;

        Ok(SettlementPlan {
            pot,
            fee,
            residual,
            staged,
        })
    }

    // ---------------------------------------------------------------
    // Withdrawal
    // ---------------------------------------------------------------

    /// Pay the caller's whole ledger balance out of custody.
    ///
    /// The ledger entry is zeroed before the transfer; if custody rejects
    /// the transfer the balance is restored and the custody error returned.
    pub fn withdraw(&mut self, caller: Identity) -> Result<Amount> {
        let tally = self
            .conservation
            .after_disburse(self.ledger.balance_of(caller))?;
        let amount = self.ledger.take(caller)?;
        if let Err(err) = self.custody.disburse(caller, amount) {
            self.ledger.restore(caller, amount);
            tracing::warn!(%caller, %amount, error = %err, "withdrawal rolled back");
            return Err(err);
        }
        self.conservation = tally;
        tracing::info!(%caller, %amount, "withdrawal paid");
        Ok(amount)
    }

    // ---------------------------------------------------------------
    // Fees
    // ---------------------------------------------------------------

    #[must_use]
    pub fn fee(&self) -> u8 {
        self.fees.fee()
    }

    pub fn set_fee(&mut self, caller: Identity, percent: u8) -> Result<()> {
        self.fees.set_fee(caller, percent)
    }

    pub fn transfer_fee_administration(
        &mut self,
        caller: Identity,
        new_administrator: Identity,
    ) -> Result<()> {
        self.fees.transfer_administration(caller, new_administrator)
    }

    #[must_use]
    pub fn fee_registry(&self) -> &FeeRegistry {
        &self.fees
    }

    // ---------------------------------------------------------------
    // Read accessors
    // ---------------------------------------------------------------

    #[must_use]
    pub fn lobbies(&self) -> &LobbyStore {
        &self.lobbies
    }

    pub fn lobby(&self, lobby_id: LobbyId) -> Result<&Lobby> {
        self.lobbies.get(lobby_id)
    }

    /// Withdrawable balance of `identity`.
    #[must_use]
    pub fn balance_of(&self, identity: Identity) -> Amount {
        self.ledger.balance_of(identity)
    }

    #[must_use]
    pub fn ledger(&self) -> &WithdrawalLedger {
        &self.ledger
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn custody(&self) -> &C {
        &self.custody
    }

    /// Host access to wallets (funding, recipient flags).
    pub fn custody_mut(&mut self) -> &mut C {
        &mut self.custody
    }

    #[must_use]
    pub fn events(&self) -> &E {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut E {
        &mut self.events
    }

    /// Check that pots plus withdrawable balances equal what custody holds
    /// on the engine's behalf.
    ///
    /// # Errors
    /// [`StakepotError::ConservationViolation`] on mismatch,
    /// `ArithmeticOverflow` if the held totals do not fit an [`Amount`].
    pub fn verify_conservation(&self) -> Result<()> {
        let accounted = self
            .lobbies
            .total_pot()?
            .checked_add(self.ledger.total_outstanding()?)
            .ok_or(StakepotError::ArithmeticOverflow)?;
        self.conservation.verify(accounted)?;
        self.conservation.verify(self.custody.escrowed())
    }

    // ---------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------

    fn emit(&mut self, lobby_id: LobbyId, kind: EventKind) {
        tracing::debug!(%lobby_id, kind = kind.label(), "event emitted");
        self.events.emit(LobbyEvent::new(lobby_id, kind));
    }

    /// Return collected value after a failed commit; returns `err` unchanged.
    fn refund(&mut self, caller: Identity, amount: Amount, err: StakepotError) -> StakepotError {
        if let Err(refund_err) = self.custody.disburse(caller, amount) {
            tracing::error!(%caller, %amount, error = %refund_err, "refund after failed commit failed");
        }
        err
    }
}

fn ensure_conveyed(stake: Amount, conveyed: Amount) -> Result<()> {
    if conveyed != stake {
        return Err(StakepotError::WrongStake {
            expected: stake,
            actual: conveyed,
        });
    }
    Ok(())
}
