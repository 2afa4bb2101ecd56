//! Canonical payout message.
//!
//! Format:
//! `"stakepot:payout:v1:" || lobby_id (u64 LE) || count (u64 LE) || payout_0 || … || payout_n`
//!
//! Each payout is the 16-byte `rust_decimal` serialization of its
//! normalized value, so `1.0` and `1` commit to the same bytes and no entry
//! boundary can be confused with another.

use sha2::{Digest, Sha256};
use stakepot_types::{Amount, LobbyId, constants};

/// The exact pair an arbiter attests to.
#[derive(Debug, Clone, Copy)]
pub struct PayoutMessage<'a> {
    pub lobby_id: LobbyId,
    pub payouts: &'a [Amount],
}

impl<'a> PayoutMessage<'a> {
    #[must_use]
    pub fn new(lobby_id: LobbyId, payouts: &'a [Amount]) -> Self {
        Self { lobby_id, payouts }
    }

    /// Deterministic byte encoding.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out =
            Vec::with_capacity(constants::PAYOUT_DOMAIN_TAG.len() + 16 + 16 * self.payouts.len());
        out.extend_from_slice(constants::PAYOUT_DOMAIN_TAG);
        out.extend_from_slice(&self.lobby_id.to_le_bytes());
        out.extend_from_slice(&(self.payouts.len() as u64).to_le_bytes());
        for payout in self.payouts {
            out.extend_from_slice(&payout.normalize().serialize());
        }
        out
    }

    /// SHA-256 over [`encode`](Self::encode). This is what gets signed.
    #[must_use]
    pub fn digest(&self) -> [u8; 32] {
        Sha256::digest(self.encode()).into()
    }

    /// Hex digest for logs.
    #[must_use]
    pub fn digest_hex(&self) -> String {
        hex::encode(self.digest())
    }
}
