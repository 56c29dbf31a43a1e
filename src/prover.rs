//! Prover (client) side of the Chaum-Pedersen protocol.

use num_bigint::BigUint;
use rand_core::CryptoRngCore;

use crate::primitives::crypto::random_nonzero_below;
use crate::{create_response, Commitment, GroupParameters, Nonce, PublicKey, Result, Secret};

/// Prover for the Chaum-Pedersen authentication protocol.
///
/// Holds the password-derived secret `x` and proves knowledge of it, without
/// revealing it, against the public key `y1 = g^x`, `y2 = h^x`.
///
/// # Security
///
/// - Always use [`SecureRng`](crate::SecureRng) for randomness generation
/// - Use each [`Nonce`] for exactly one challenge; reuse leaks `x`
/// - The secret is zeroized when the prover is dropped
pub struct Prover {
    params: GroupParameters,
    secret: Secret,
    public_key: PublicKey,
}

impl Prover {
    /// Creates a new prover; the public key is computed from the secret.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chaum_pedersen_auth::{GroupParameters, Prover, Secret};
    ///
    /// let params = GroupParameters::safe_prime_256().unwrap();
    /// let prover = Prover::new(params, Secret::from_password(b"correct horse"));
    /// ```
    pub fn new(params: GroupParameters, secret: Secret) -> Self {
        let public_key = PublicKey::from_secret(&params, &secret);
        Self {
            params,
            secret,
            public_key,
        }
    }

    /// Creates a prover whose secret is derived from `password`.
    pub fn from_password(params: GroupParameters, password: &[u8]) -> Self {
        Self::new(params, Secret::from_password(password))
    }

    /// Returns the group parameters.
    pub fn params(&self) -> &GroupParameters {
        &self.params
    }

    /// Returns the public key to register.
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Generates the commitment (first message).
    ///
    /// Draws `k` uniformly from `[1, q)` and returns `(r1, r2)` together with
    /// the nonce, which must be kept secret and passed to [`Prover::respond`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::RandomnessFailure`](crate::Error::RandomnessFailure)
    /// if the random source fails.
    pub fn commit<R: CryptoRngCore>(&self, rng: &mut R) -> Result<(Commitment, Nonce)> {
        let k = random_nonzero_below(rng, self.params.q())?;
        Ok(self.commit_with(&k))
    }

    pub(crate) fn commit_with(&self, k: &BigUint) -> (Commitment, Nonce) {
        let (r1, r2) = self.params.exp_pair(k);
        (Commitment::new(r1, r2), Nonce::new(k))
    }

    /// Generates the response (third message): `s = (k - c * x) mod q`.
    pub fn respond(&self, nonce: &Nonce, challenge: &BigUint) -> BigUint {
        create_response(
            &nonce.k(),
            challenge,
            &self.secret.exponent(),
            self.params.q(),
        )
    }
}
