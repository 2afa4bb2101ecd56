//! # stakepot-escrow
//!
//! State holders behind the settlement engine:
//!
//! 1. **LobbyStore**: per-lobby records, membership and lifecycle rules
//! 2. **FeeRegistry**: platform fee percentage with an administrator
//! 3. **ValueCustody**: the collaborator that moves value in and out of escrow
//!
//! Every mutator has a matching `validate_*` check so the engine can confirm
//! all preconditions before touching custody or state.

pub mod custody;
pub mod fee_registry;
pub mod lobby_store;

pub use custody::{InMemoryCustody, ValueCustody};
pub use fee_registry::FeeRegistry;
pub use lobby_store::LobbyStore;
