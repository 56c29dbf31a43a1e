//! Password authentication over an untrusted channel using the Chaum-Pedersen
//! zero-knowledge proof of discrete-logarithm equality.
//!
//! The prover derives a secret `x` from a password and registers
//! `y1 = g^x mod p`, `y2 = h^x mod p`. To log in it commits to a random `k`,
//! receives a challenge `c`, and answers with `s = (k - c * x) mod q`. The
//! verifier accepts iff `g^s * y1^c = r1` and `h^s * y2^c = r2` (mod p).
//!
//! # Example
//!
//! ```rust
//! use chaum_pedersen_auth::{AuthenticationService, GroupParameters, Prover, SecureRng};
//!
//! let params = GroupParameters::safe_prime_256().unwrap();
//! let service = AuthenticationService::new(params.clone());
//! let prover = Prover::from_password(params, b"correct horse battery staple");
//!
//! service.register("alice", prover.public_key().clone()).unwrap();
//!
//! let mut rng = SecureRng::new();
//! let (commitment, nonce) = prover.commit(&mut rng).unwrap();
//! let challenge = service.create_challenge("alice", commitment).unwrap();
//! let s = prover.respond(&nonce, &challenge.c);
//!
//! let token = service.verify(&challenge.auth_id, &s).unwrap();
//! assert_eq!(token.as_str().len(), 64);
//! ```

#![forbid(unsafe_code)]

/// Error types.
pub mod error;
/// Request and reply shapes at the service boundary.
pub mod messages;
/// Cryptographic primitives and protocol values.
pub mod primitives;
/// Prover (client) side of the protocol.
pub mod prover;
/// Verifier (server) side of the protocol.
pub mod verifier;

/// Generated protobuf and gRPC code.
#[cfg(feature = "grpc")]
pub mod proto {
    tonic::include_proto!("zkp_auth");
}

pub use error::{Error, ErrorKind, LocalizedMessage, Result};
pub use primitives::{
    create_response, AuthSessionToken, Commitment, GroupParameters, Nonce, PublicKey, Secret,
    SecureRng,
};
pub use prover::Prover;
pub use verifier::{
    AuthenticationService, Challenge, ChallengeSession, CredentialStore, SessionStore, Verifier,
};
