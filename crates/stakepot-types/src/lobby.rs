//! # Lobby: one escrow session
//!
//! A lobby holds a fixed per-participant stake, a membership rule and the
//! pot of conveyed value until an arbiter-signed settlement distributes it.
//!
//! ## State Machine
//!
//! ```text
//!   ┌──────┐  start (creator)  ┌────────┐  end (signed payouts)  ┌───────┐
//!   │ OPEN ├──────────────────▶│ LOCKED ├───────────────────────▶│ ENDED │
//!   └──────┘                   └────────┘                        └───────┘
//! ```
//!
//! Joins are only accepted while OPEN. ENDED is terminal and implies the
//! lobby was LOCKED first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Amount, Identity, LobbyId, Result, StakepotError};

/// Public or private admission, as reported by read accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Visibility {
    Public,
    Private,
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Public => write!(f, "PUBLIC"),
            Self::Private => write!(f, "PRIVATE"),
        }
    }
}

/// Membership rule fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Admission {
    /// Anyone may join until `capacity` participants are present.
    Public { capacity: usize },
    /// Only whitelisted identities (and the creator) may participate.
    Private { whitelist: Vec<Identity> },
}

/// Lifecycle phase. Transitions are monotonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LobbyPhase {
    /// Accepting joins.
    Open,
    /// Started by the creator; awaiting settlement.
    Locked,
    /// Settled. **Irreversible.**
    Ended,
}

impl LobbyPhase {
    /// Can this phase transition to the given target phase?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Open, Self::Locked) | (Self::Locked, Self::Ended)
        )
    }
}

impl std::fmt::Display for LobbyPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "OPEN"),
            Self::Locked => write!(f, "LOCKED"),
            Self::Ended => write!(f, "ENDED"),
        }
    }
}

/// A single lobby record, owned by the lobby store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lobby {
    /// Sequential lobby identifier.
    pub id: LobbyId,
    /// Identity that created the lobby; the only one allowed to start it.
    pub creator: Identity,
    /// Required per-participant deposit. Immutable.
    pub stake: Amount,
    /// Public capacity or private whitelist.
    pub admission: Admission,
    /// Depositors in join order. `participants[0]` is the creator.
    pub participants: Vec<Identity>,
    /// Current lifecycle phase.
    pub phase: LobbyPhase,
    /// Value held for this lobby. Zero once ended.
    pub pot: Amount,
    /// When the lobby was created.
    pub created_at: DateTime<Utc>,
}

impl Lobby {
    #[must_use]
    pub fn visibility(&self) -> Visibility {
        match self.admission {
            Admission::Public { .. } => Visibility::Public,
            Admission::Private { .. } => Visibility::Private,
        }
    }

    /// Capacity of a public lobby; `None` for private lobbies.
    #[must_use]
    pub fn capacity(&self) -> Option<usize> {
        match self.admission {
            Admission::Public { capacity } => Some(capacity),
            Admission::Private { .. } => None,
        }
    }

    /// Whitelist of a private lobby; empty for public lobbies.
    #[must_use]
    pub fn whitelist(&self) -> &[Identity] {
        match &self.admission {
            Admission::Public { .. } => &[],
            Admission::Private { whitelist } => whitelist,
        }
    }

    #[must_use]
    pub fn whitelist_entry(&self, index: usize) -> Option<Identity> {
        self.whitelist().get(index).copied()
    }

    #[must_use]
    pub fn participant(&self, index: usize) -> Option<Identity> {
        self.participants.get(index).copied()
    }

    #[must_use]
    pub fn is_participant(&self, identity: &Identity) -> bool {
        self.participants.contains(identity)
    }

    /// Locked or ended.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        matches!(self.phase, LobbyPhase::Locked | LobbyPhase::Ended)
    }

    #[must_use]
    pub fn is_ended(&self) -> bool {
        self.phase == LobbyPhase::Ended
    }

    /// Whether a public lobby has reached capacity. Private lobbies never fill.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.capacity()
            .is_some_and(|capacity| self.participants.len() >= capacity)
    }

    /// Whether the membership rule lets `identity` participate.
    #[must_use]
    pub fn admits(&self, identity: &Identity) -> bool {
        match &self.admission {
            Admission::Public { .. } => true,
            Admission::Private { whitelist } => {
                *identity == self.creator || whitelist.contains(identity)
            }
        }
    }

    /// Transition OPEN → LOCKED.
    ///
    /// # Errors
    /// Returns `AlreadyLocked` if the lobby was started before.
    pub fn mark_locked(&mut self) -> Result<()> {
        if !self.phase.can_transition_to(LobbyPhase::Locked) {
            return Err(StakepotError::AlreadyLocked);
        }
        self.phase = LobbyPhase::Locked;
        Ok(())
    }

    /// Transition LOCKED → ENDED.
    ///
    /// # Errors
    /// Returns `AlreadyEnded` if settled before, `LobbyNotLocked` if still open.
    pub fn mark_ended(&mut self) -> Result<()> {
        match self.phase {
            LobbyPhase::Ended => Err(StakepotError::AlreadyEnded),
            LobbyPhase::Open => Err(StakepotError::LobbyNotLocked),
            LobbyPhase::Locked => {
                self.phase = LobbyPhase::Ended;
                Ok(())
            }
        }
    }
}
