//! Authority check for payout attestations.

use stakepot_types::{Amount, Identity, LobbyId, Result, StakepotError};

use crate::message::PayoutMessage;
use crate::scheme::{Ed25519Scheme, SignatureScheme};

/// Verifies that a payout split was signed by the configured authority.
///
/// Holds no mutable state: the same inputs always produce the same answer.
pub struct SignatureVerifier {
    authority: Identity,
    scheme: Box<dyn SignatureScheme>,
}

impl SignatureVerifier {
    /// Verifier using the default ed25519 scheme.
    #[must_use]
    pub fn new(authority: Identity) -> Self {
        Self::with_scheme(authority, Box::new(Ed25519Scheme))
    }

    #[must_use]
    pub fn with_scheme(authority: Identity, scheme: Box<dyn SignatureScheme>) -> Self {
        Self { authority, scheme }
    }

    #[must_use]
    pub fn authority(&self) -> Identity {
        self.authority
    }

    /// `true` iff `signature` over `(lobby_id, payouts)` recovers to the
    /// authority. Malformed signatures are simply "not verified".
    #[must_use]
    pub fn verify(&self, lobby_id: LobbyId, payouts: &[Amount], signature: &[u8]) -> bool {
        let message = PayoutMessage::new(lobby_id, payouts);
        match self.scheme.recover_signer(&message.digest(), signature) {
            Some(signer) if signer == self.authority => {
                tracing::debug!(
                    %lobby_id,
                    scheme = self.scheme.name(),
                    digest = %message.digest_hex(),
                    "payout attestation verified"
                );
                true
            }
            Some(signer) => {
                tracing::warn!(
                    %lobby_id,
                    %signer,
                    authority = %self.authority,
                    "payout attestation signed by non-authority"
                );
                false
            }
            None => {
                tracing::warn!(
                    %lobby_id,
                    scheme = self.scheme.name(),
                    "payout attestation did not verify"
                );
                false
            }
        }
    }

    /// [`verify`](Self::verify) as a `Result`.
    ///
    /// # Errors
    /// Returns [`StakepotError::BadSignature`] if verification fails.
    pub fn check(&self, lobby_id: LobbyId, payouts: &[Amount], signature: &[u8]) -> Result<()> {
        if self.verify(lobby_id, payouts, signature) {
            Ok(())
        } else {
            Err(StakepotError::BadSignature)
        }
    }
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("authority", &self.authority)
            .field("scheme", &self.scheme.name())
            .finish()
    }
}
