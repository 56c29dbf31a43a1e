//! Verifier (server) implementation for the Chaum-Pedersen protocol.
//!
//! This module contains the verifier's checks, the credential and challenge
//! stores, the authentication state machine, and (behind features) the
//! server configuration and gRPC service.

use num_bigint::BigUint;
use rand_core::CryptoRngCore;

use crate::primitives::crypto::{ct_eq, mul_mod, random_nonzero_below};
use crate::{Commitment, GroupParameters, PublicKey, Result};

/// Authentication state machine.
pub mod authenticator;

#[cfg(feature = "server")]
/// Server configuration.
pub mod config;

#[cfg(feature = "grpc")]
/// gRPC service implementation.
pub mod service;

/// Credential and challenge-session stores.
pub mod state;

pub use authenticator::{AuthenticationService, Challenge};
#[cfg(feature = "server")]
pub use config::ServerConfig;
#[cfg(feature = "grpc")]
pub use service::AuthServiceImpl;
pub use state::{ChallengeSession, CredentialStore, SessionStore};

/// Verifier for the Chaum-Pedersen zero-knowledge protocol.
///
/// Issues challenges and checks responses without learning the secret `x`.
#[derive(Clone, Debug)]
pub struct Verifier {
    params: GroupParameters,
}

impl Verifier {
    /// Creates a new verifier over the given parameters.
    pub fn new(params: GroupParameters) -> Self {
        Self { params }
    }

    /// Returns the group parameters.
    pub fn params(&self) -> &GroupParameters {
        &self.params
    }

    /// Interactive protocol: draws the challenge `c` uniformly from `[1, q)`.
    pub fn issue_challenge<R: CryptoRngCore>(&self, rng: &mut R) -> Result<BigUint> {
        random_nonzero_below(rng, self.params.q())
    }

    /// Interactive protocol: verifies the response (third message).
    ///
    /// Accepts iff `g^s * y1^c = r1` and `h^s * y2^c = r2` (mod p). Both
    /// equations are always evaluated. `s` and `c` are reduced mod `q` first;
    /// every element involved has order `q`, so the outcome is unchanged.
    pub fn verify_response(
        &self,
        key: &PublicKey,
        commitment: &Commitment,
        challenge: &BigUint,
        response: &BigUint,
    ) -> bool {
        let p = self.params.p();
        let q = self.params.q();
        let response = response % q;
        let challenge = challenge % q;
        let (gs, hs) = self.params.exp_pair(&response);

        let lhs1 = mul_mod(&gs, &key.y1().modpow(&challenge, p), p);
        let lhs2 = mul_mod(&hs, &key.y2().modpow(&challenge, p), p);

        let check1 = ct_eq(&lhs1, commitment.r1());
        let check2 = ct_eq(&lhs2, commitment.r2());

        check1 & check2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Prover, SecureRng};

    #[test]
    fn verifier_accepts_valid_response() {
        let mut rng = SecureRng::new();
        let params = GroupParameters::rfc5114().unwrap();
        let prover = Prover::from_password(params.clone(), b"hunter2");
        let verifier = Verifier::new(params);

        let (commitment, nonce) = prover.commit(&mut rng).unwrap();
        let c = verifier.issue_challenge(&mut rng).unwrap();
        let s = prover.respond(&nonce, &c);

        assert!(verifier.verify_response(prover.public_key(), &commitment, &c, &s));
    }

    #[test]
    fn verifier_rejects_wrong_secret() {
        let mut rng = SecureRng::new();
        let params = GroupParameters::safe_prime_256().unwrap();
        let honest = Prover::from_password(params.clone(), b"right");
        let impostor = Prover::from_password(params.clone(), b"wrong");
        let verifier = Verifier::new(params);

        let (commitment, nonce) = impostor.commit(&mut rng).unwrap();
        let c = verifier.issue_challenge(&mut rng).unwrap();
        let s = impostor.respond(&nonce, &c);

        assert!(!verifier.verify_response(honest.public_key(), &commitment, &c, &s));
    }

    #[test]
    fn verifier_rejects_mismatched_exponents() {
        // y1 = 4^6 = 2 but y2 = 9^7 = 4: no single x underlies both.
        let params =
            GroupParameters::new(23u32.into(), 11u32.into(), 4u32.into(), 9u32.into()).unwrap();
        let verifier = Verifier::new(params.clone());
        let key = PublicKey::new(2u32.into(), params.h().modpow(&7u32.into(), params.p()));

        let k = BigUint::from(3u32);
        let (r1, r2) = params.exp_pair(&k);
        let commitment = Commitment::new(r1, r2);

        for c in 1u32..11 {
            let c = BigUint::from(c);
            for s in 0u32..11 {
                assert!(!verifier.verify_response(&key, &commitment, &c, &s.into()));
            }
        }
    }

    #[test]
    fn response_is_checked_modulo_q() {
        let params =
            GroupParameters::new(23u32.into(), 11u32.into(), 4u32.into(), 9u32.into()).unwrap();
        let verifier = Verifier::new(params);
        let key = PublicKey::new(2u32.into(), 3u32.into());
        let commitment = Commitment::new(18u32.into(), 16u32.into());
        let c = BigUint::from(4u32);

        for s in [1u32, 12, 23, 1 + 11 * 1000] {
            assert!(verifier.verify_response(&key, &commitment, &c, &s.into()));
        }
        for s in [2u32, 13, 2 + 11 * 1000] {
            assert!(!verifier.verify_response(&key, &commitment, &c, &s.into()));
        }
    }

    #[test]
    fn challenges_are_nonzero_and_below_q() {
        let mut rng = SecureRng::new();
        let params =
            GroupParameters::new(23u32.into(), 11u32.into(), 4u32.into(), 9u32.into()).unwrap();
        let verifier = Verifier::new(params);

        for _ in 0..100 {
            let c = verifier.issue_challenge(&mut rng).unwrap();
            assert!(c > BigUint::from(0u32) && c < BigUint::from(11u32));
        }
    }
}
