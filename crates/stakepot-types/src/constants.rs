//! System-wide constants for the Stakepot escrow.

/// First identifier handed out by a fresh lobby store.
pub const FIRST_LOBBY_ID: u64 = 1;

/// Upper bound on public capacity and private whitelist length.
pub const MAX_PARTICIPANTS: usize = 256;

/// Default minimum participant count before a lobby may be started.
pub const DEFAULT_MIN_PARTICIPANTS: usize = 1;

/// Platform fee applied by a freshly deployed registry, in percent.
pub const DEFAULT_FEE_PERCENT: u8 = 5;

/// Largest accepted fee percentage.
pub const MAX_FEE_PERCENT: u8 = 100;

/// Domain separation tag prefixed to every payout attestation message.
pub const PAYOUT_DOMAIN_TAG: &[u8] = b"stakepot:payout:v1:";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
