//! Core cryptographic primitives for the Chaum-Pedersen protocol.
//!
//! - **crypto**: modular arithmetic, primality testing, and secure randomness
//! - **parameters**: validated group parameters, presets, and generation
//! - **gadgets**: secret, public key, nonce, commitment, response, session token

/// Arithmetic and randomness primitives.
pub mod crypto;
/// Protocol gadgets (secret, keys, commitments, tokens).
pub mod gadgets;
/// Group parameters `(p, q, g, h)`.
pub mod parameters;

pub use crypto::SecureRng;
pub use gadgets::{create_response, AuthSessionToken, Commitment, Nonce, PublicKey, Secret};
pub use parameters::GroupParameters;
