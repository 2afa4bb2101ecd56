//! Observable lobby records for external indexers.
//!
//! Creation, join, lock and settlement each emit a [`LobbyEvent`]
//! `{lobby_id, kind, payload}`. Emission is one-way: the core never reads
//! events back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Amount, EventId, Identity, LobbyId, Visibility};

/// What happened to the lobby, with its payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// A lobby was created and the creator's stake collected.
    Created {
        creator: Identity,
        stake: Amount,
        visibility: Visibility,
    },
    /// A participant deposited the stake.
    Joined { participant: Identity },
    /// The creator started the lobby.
    Locked,
    /// The arbiter's payouts were recorded.
    Ended {
        payouts: Vec<Amount>,
        /// Fee computed from the registry percentage at settlement time.
        fee: Amount,
        /// `pot − Σ payouts`, credited to the administrator.
        residual: Amount,
    },
}

impl EventKind {
    /// Short label for logs.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Created { .. } => "LOBBY_CREATED",
            Self::Joined { .. } => "LOBBY_JOINED",
            Self::Locked => "LOBBY_LOCKED",
            Self::Ended { .. } => "LOBBY_ENDED",
        }
    }
}

/// One emitted record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LobbyEvent {
    pub id: EventId,
    pub lobby_id: LobbyId,
    pub kind: EventKind,
    pub emitted_at: DateTime<Utc>,
}

impl LobbyEvent {
    #[must_use]
    pub fn new(lobby_id: LobbyId, kind: EventKind) -> Self {
        Self {
            id: EventId::new(),
            lobby_id,
            kind,
            emitted_at: Utc::now(),
        }
    }
}

/// Destination for emitted lobby events.
pub trait EventSink {
    fn emit(&mut self, event: LobbyEvent);
}

/// In-memory append-only event sink.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<LobbyEvent>,
}

impl EventLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> &[LobbyEvent] {
        &self.events
    }

    /// Events of one lobby, in emission order.
    pub fn for_lobby(&self, lobby_id: LobbyId) -> impl Iterator<Item = &LobbyEvent> {
        self.events.iter().filter(move |e| e.lobby_id == lobby_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl EventSink for EventLog {
    fn emit(&mut self, event: LobbyEvent) {
        self.events.push(event);
    }
}
