//! # stakepot-types
//!
//! Shared types, errors, and configuration for the **Stakepot** lobby escrow.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`LobbyId`], [`Identity`], [`EventId`]
//! - **Amounts**: [`Amount`] (exact decimal value units)
//! - **Lobby model**: [`Lobby`], [`Admission`], [`Visibility`], [`LobbyPhase`]
//! - **Events**: [`LobbyEvent`], [`EventKind`], [`EventSink`], [`EventLog`]
//! - **Configuration**: [`EngineConfig`], [`FeePolicy`]
//! - **Errors**: [`StakepotError`] with `SP_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod ids;
pub mod lobby;

pub use config::*;
pub use error::*;
pub use event::*;
pub use ids::*;
pub use lobby::*;

/// Value units moved through the escrow. Exact decimal, never negative once
/// accepted by the core.
pub type Amount = rust_decimal::Decimal;

// Constants are accessed via `stakepot_types::constants::FOO`
// (not re-exported to avoid name collisions).
