//! Lobby store: the single source of truth for membership and lifecycle.
//!
//! Owns every [`Lobby`] record and the id counter. Validation and mutation
//! are split (`validate_join` / `join`, …) so a caller can check all
//! preconditions, perform an external value transfer, and only then commit.
//! Each mutator re-runs its validation, so calling it directly is also safe.

use std::collections::{BTreeMap, HashSet};

use chrono::Utc;
use rust_decimal::Decimal;
use stakepot_types::{
    Admission, Amount, Identity, Lobby, LobbyId, LobbyPhase, Result, StakepotError, Visibility,
    constants,
};

/// Owns all lobbies, keyed by sequential id.
#[derive(Debug)]
pub struct LobbyStore {
    lobbies: BTreeMap<LobbyId, Lobby>,
    /// Id handed to the next created lobby.
    next_id: LobbyId,
    /// Bound on public capacity and private whitelist length.
    max_participants: usize,
}

impl LobbyStore {
    #[must_use]
    pub fn new(max_participants: usize) -> Self {
        Self {
            lobbies: BTreeMap::new(),
            next_id: LobbyId(constants::FIRST_LOBBY_ID),
            max_participants,
        }
    }

    // ---------------------------------------------------------------
    // Creation
    // ---------------------------------------------------------------

    /// # Errors
    /// `InvalidStake` if `stake ≤ 0`, `InvalidCapacity` if `capacity` is 0 or
    /// above the configured bound.
    pub fn validate_public(&self, stake: Amount, capacity: usize) -> Result<()> {
        validate_stake(stake)?;
        if capacity == 0 || capacity > self.max_participants {
            return Err(StakepotError::InvalidCapacity(capacity));
        }
        Ok(())
    }

    /// # Errors
    /// `InvalidStake` if `stake ≤ 0`, `InvalidWhitelist` if the whitelist is
    /// empty, oversized or contains duplicates.
    pub fn validate_private(&self, stake: Amount, whitelist: &[Identity]) -> Result<()> {
        validate_stake(stake)?;
        if whitelist.is_empty() {
            return Err(StakepotError::InvalidWhitelist {
                reason: "whitelist is empty".into(),
            });
        }
        if whitelist.len() > self.max_participants {
            return Err(StakepotError::InvalidWhitelist {
                reason: format!(
                    "{} entries exceeds limit of {}",
                    whitelist.len(),
                    self.max_participants
                ),
            });
        }
        let mut seen = HashSet::with_capacity(whitelist.len());
        for identity in whitelist {
            if !seen.insert(identity) {
                return Err(StakepotError::InvalidWhitelist {
                    reason: format!("duplicate entry {identity}"),
                });
            }
        }
        Ok(())
    }

    /// Create a public lobby. The creator becomes participant 0 with its
    /// stake recorded as deposited.
    pub fn create_public(
        &mut self,
        creator: Identity,
        stake: Amount,
        capacity: usize,
    ) -> Result<LobbyId> {
        self.validate_public(stake, capacity)?;
        Ok(self.insert(creator, stake, Admission::Public { capacity }))
    }

    /// Create a private lobby restricted to `whitelist` (plus the creator).
    pub fn create_private(
        &mut self,
        creator: Identity,
        stake: Amount,
        whitelist: Vec<Identity>,
    ) -> Result<LobbyId> {
        self.validate_private(stake, &whitelist)?;
        Ok(self.insert(creator, stake, Admission::Private { whitelist }))
    }

    fn insert(&mut self, creator: Identity, stake: Amount, admission: Admission) -> LobbyId {
        let id = self.next_id;
        self.next_id = id.next();

        let visibility = match admission {
            Admission::Public { .. } => Visibility::Public,
            Admission::Private { .. } => Visibility::Private,
        };
        self.lobbies.insert(
            id,
            Lobby {
                id,
                creator,
                stake,
                admission,
                participants: vec![creator],
                phase: LobbyPhase::Open,
                pot: stake,
                created_at: Utc::now(),
            },
        );
        tracing::info!(lobby_id = %id, %creator, %stake, %visibility, "lobby created");
        id
    }

    // ---------------------------------------------------------------
    // Membership
    // ---------------------------------------------------------------

    /// Check whether `identity` may join by conveying `deposited`.
    ///
    /// Checks run in a fixed order: locked, full, not admitted, wrong stake,
    /// already joined.
    pub fn validate_join(&self, id: LobbyId, identity: Identity, deposited: Amount) -> Result<()> {
        let lobby = self.get(id)?;
        if lobby.is_locked() {
            return Err(StakepotError::LobbyLocked);
        }
        if lobby.is_full() {
            return Err(StakepotError::LobbyFull);
        }
        if !lobby.admits(&identity) {
            return Err(StakepotError::Unauthorized);
        }
        if deposited != lobby.stake {
            return Err(StakepotError::WrongStake {
                expected: lobby.stake,
                actual: deposited,
            });
        }
        if lobby.is_participant(&identity) {
            return Err(StakepotError::AlreadyJoined);
        }
        lobby
            .pot
            .checked_add(deposited)
            .ok_or(StakepotError::ArithmeticOverflow)?;
        Ok(())
    }

    /// Append `identity` to the participants and add its stake to the pot.
    pub fn join(&mut self, id: LobbyId, identity: Identity, deposited: Amount) -> Result<()> {
        self.validate_join(id, identity, deposited)?;
        let lobby = self.get_mut(id)?;
        lobby.pot = lobby
            .pot
            .checked_add(deposited)
            .ok_or(StakepotError::ArithmeticOverflow)?;
        lobby.participants.push(identity);
        tracing::debug!(
            lobby_id = %id,
            participant = %identity,
            count = lobby.participants.len(),
            "participant joined"
        );
        Ok(())
    }

    // ---------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------

    /// # Errors
    /// `Unauthorized` unless `requester` is the creator, `AlreadyLocked` if
    /// the lobby was started before.
    pub fn validate_lock(&self, id: LobbyId, requester: Identity) -> Result<()> {
        let lobby = self.get(id)?;
        if requester != lobby.creator {
            return Err(StakepotError::Unauthorized);
        }
        if lobby.is_locked() {
            return Err(StakepotError::AlreadyLocked);
        }
        Ok(())
    }

    /// Start the lobby; no further joins are accepted.
    pub fn lock(&mut self, id: LobbyId, requester: Identity) -> Result<()> {
        self.validate_lock(id, requester)?;
        let lobby = self.get_mut(id)?;
        lobby.mark_locked()?;
        tracing::info!(lobby_id = %id, participants = lobby.participants.len(), "lobby locked");
        Ok(())
    }

    /// Mark a locked lobby ENDED and release its pot for distribution.
    ///
    /// Returns the pot that was held. This is the idempotency guard: a
    /// second call fails with `AlreadyEnded`.
    pub fn end(&mut self, id: LobbyId) -> Result<Amount> {
        let lobby = self.get_mut(id)?;
        lobby.mark_ended()?;
        let pot = std::mem::replace(&mut lobby.pot, Decimal::ZERO);
        tracing::info!(lobby_id = %id, %pot, "lobby ended");
        Ok(pot)
    }

    // ---------------------------------------------------------------
    // Read accessors
    // ---------------------------------------------------------------

    /// # Errors
    /// `LobbyNotFound` for an unknown id.
    pub fn get(&self, id: LobbyId) -> Result<&Lobby> {
        self.lobbies.get(&id).ok_or(StakepotError::LobbyNotFound(id))
    }

    fn get_mut(&mut self, id: LobbyId) -> Result<&mut Lobby> {
        self.lobbies
            .get_mut(&id)
            .ok_or(StakepotError::LobbyNotFound(id))
    }

    pub fn creator(&self, id: LobbyId) -> Result<Identity> {
        Ok(self.get(id)?.creator)
    }

    pub fn stake(&self, id: LobbyId) -> Result<Amount> {
        Ok(self.get(id)?.stake)
    }

    /// `None` for private lobbies.
    pub fn capacity(&self, id: LobbyId) -> Result<Option<usize>> {
        Ok(self.get(id)?.capacity())
    }

    pub fn visibility(&self, id: LobbyId) -> Result<Visibility> {
        Ok(self.get(id)?.visibility())
    }

    pub fn whitelist(&self, id: LobbyId) -> Result<&[Identity]> {
        Ok(self.get(id)?.whitelist())
    }

    pub fn whitelist_entry(&self, id: LobbyId, index: usize) -> Result<Option<Identity>> {
        Ok(self.get(id)?.whitelist_entry(index))
    }

    pub fn participants(&self, id: LobbyId) -> Result<&[Identity]> {
        Ok(&self.get(id)?.participants)
    }

    pub fn participant(&self, id: LobbyId, index: usize) -> Result<Option<Identity>> {
        Ok(self.get(id)?.participant(index))
    }

    pub fn is_locked(&self, id: LobbyId) -> Result<bool> {
        Ok(self.get(id)?.is_locked())
    }

    pub fn is_ended(&self, id: LobbyId) -> Result<bool> {
        Ok(self.get(id)?.is_ended())
    }

    pub fn pot(&self, id: LobbyId) -> Result<Amount> {
        Ok(self.get(id)?.pot)
    }

    /// Value held across all lobbies that have not ended.
    ///
    /// # Errors
    /// `ArithmeticOverflow` if the sum does not fit an [`Amount`].
    pub fn total_pot(&self) -> Result<Amount> {
        self.lobbies
            .values()
            .try_fold(Decimal::ZERO, |acc, lobby| acc.checked_add(lobby.pot))
            .ok_or(StakepotError::ArithmeticOverflow)
    }

    /// Number of lobbies ever created.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lobbies.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lobbies.is_empty()
    }
}

impl Default for LobbyStore {
    fn default() -> Self {
        Self::new(constants::MAX_PARTICIPANTS)
    }
}

fn validate_stake(stake: Amount) -> Result<()> {
    if stake <= Decimal::ZERO {
        return Err(StakepotError::InvalidStake(stake));
    }
    Ok(())
}
