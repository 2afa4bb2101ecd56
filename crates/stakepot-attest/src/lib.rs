//! # stakepot-attest
//!
//! **Signature Verifier**: settlement amounts depend on an off-line game
//! outcome, so the escrow never recomputes them. It checks that one
//! authenticated message `(lobby_id, payouts)` was signed by the configured
//! arbiter.
//!
//! ## Flow
//!
//! ```text
//! (lobby_id, payouts) → PayoutMessage::encode() → SHA-256 digest
//!     → SignatureScheme::recover_signer(digest, signature) → Identity == authority?
//! ```
//!
//! The scheme is a trait so the algorithm can be swapped without touching
//! settlement logic. [`Ed25519Scheme`] is the default; [`Ed25519Attester`]
//! is the arbiter-side counterpart that produces signatures.

pub mod message;
pub mod scheme;
pub mod verifier;

pub use message::PayoutMessage;
pub use scheme::{Ed25519Attester, Ed25519Scheme, SignatureScheme};
pub use verifier::SignatureVerifier;
