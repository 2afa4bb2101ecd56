//! Pluggable signature schemes.
//!
//! A scheme turns `(digest, signature)` into the identity that produced the
//! signature, or `None` when the signature is malformed or invalid.
//! Recovery never panics on attacker-supplied bytes.
//!
//! ## Ed25519 attestation format
//!
//! ed25519 has no public-key recovery, so the attestation carries the
//! signer's key: `verifying_key (32 bytes) || signature (64 bytes)`. The
//! key is only returned as the signer after the signature verifies under it
//! (strict verification, rejecting small-order keys and malleable
//! signatures).

use std::fmt;

use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use stakepot_types::{Amount, Identity, LobbyId};

use crate::message::PayoutMessage;

/// Length of an ed25519 attestation: public key plus signature.
pub const ED25519_ATTESTATION_LEN: usize = 32 + 64;

/// Recovers the signing identity from a signature over a 32-byte digest.
pub trait SignatureScheme: Send + Sync {
    /// Scheme name for logs.
    fn name(&self) -> &'static str;

    /// Identity that signed `digest`, or `None` if `signature` does not
    /// verify.
    fn recover_signer(&self, digest: &[u8; 32], signature: &[u8]) -> Option<Identity>;
}

/// Default scheme: ed25519 with the signer key embedded in the attestation.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Scheme;

impl SignatureScheme for Ed25519Scheme {
    fn name(&self) -> &'static str {
        "ed25519"
    }

    fn recover_signer(&self, digest: &[u8; 32], signature: &[u8]) -> Option<Identity> {
        if signature.len() != ED25519_ATTESTATION_LEN {
            return None;
        }
        let (key_bytes, sig_bytes) = signature.split_at(32);
        let key_bytes: [u8; 32] = key_bytes.try_into().ok()?;
        let sig_bytes: [u8; 64] = sig_bytes.try_into().ok()?;

        let key = VerifyingKey::from_bytes(&key_bytes).ok()?;
        let sig = Signature::from_bytes(&sig_bytes);
        key.verify_strict(digest, &sig).ok()?;
        Some(Identity::from_pubkey(key_bytes))
    }
}

/// Arbiter-side signer producing attestations [`Ed25519Scheme`] accepts.
///
/// Key custody is the caller's concern; this type only holds the key in
/// memory for the duration of its use.
pub struct Ed25519Attester {
    signing_key: SigningKey,
}

impl Ed25519Attester {
    #[must_use]
    pub fn from_secret(secret: [u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&secret),
        }
    }

    /// The identity to configure as the engine's authority.
    #[must_use]
    pub fn identity(&self) -> Identity {
        Identity::from_pubkey(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign a raw digest, returning `verifying_key || signature`.
    #[must_use]
    pub fn sign_digest(&self, digest: &[u8; 32]) -> Vec<u8> {
        let signature = self.signing_key.sign(digest);
        let mut out = Vec::with_capacity(ED25519_ATTESTATION_LEN);
        out.extend_from_slice(self.signing_key.verifying_key().as_bytes());
        out.extend_from_slice(&signature.to_bytes());
        out
    }

    /// Attest to the payout split of a lobby.
    #[must_use]
    pub fn attest(&self, lobby_id: LobbyId, payouts: &[Amount]) -> Vec<u8> {
        self.sign_digest(&PayoutMessage::new(lobby_id, payouts).digest())
    }
}

impl fmt::Debug for Ed25519Attester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ed25519Attester")
            .field("identity", &self.identity())
            .finish_non_exhaustive()
    }
}

/// Random attester for tests. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl Ed25519Attester {
    #[must_use]
    pub fn random() -> Self {
        Self::from_secret(rand::random::<[u8; 32]>())
    }
}
