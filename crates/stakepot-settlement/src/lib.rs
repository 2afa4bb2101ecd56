//! # stakepot-settlement
//!
//! **Settlement Engine**: lobby orchestration, arbiter-signed payout
//! commitment, and pull-based withdrawal.
//!
//! ## Architecture
//!
//! The engine owns the lobby store, fee registry, signature verifier and
//! withdrawal ledger, and calls out to a [`ValueCustody`] collaborator for
//! every value transfer. Each public operation:
//! 1. Validates every precondition (no state touched on failure)
//! 2. Performs the custody transfer, if any
//! 3. Commits store / ledger changes
//! 4. Emits a [`LobbyEvent`](stakepot_types::LobbyEvent)
//!
//! `withdraw` inverts steps 2 and 3: the ledger entry is zeroed before value
//! leaves custody, and restored if the transfer fails.
//!
//! [`ValueCustody`]: stakepot_escrow::ValueCustody

pub mod engine;
pub mod pot_conservation;
pub mod withdrawal_ledger;

pub use engine::SettlementEngine;
pub use pot_conservation::PotConservation;
pub use withdrawal_ledger::{StagedCredits, WithdrawalLedger};
