//! Protocol gadgets for Chaum-Pedersen authentication.
//!
//! This module contains the values exchanged or held during one protocol run:
//! the password-derived secret, the public key, the prover's nonce and
//! commitment, the response, and the token minted after a successful login.

use num_bigint::BigUint;
use rand_core::CryptoRngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::crypto::rng::fill_random;
use super::crypto::{mul_mod, sub_mod};
use super::GroupParameters;
use crate::Result;

/// Number of random bytes in an [`AuthSessionToken`].
pub const SESSION_TOKEN_BYTES: usize = 32;

/// Secret exponent `x` derived from a password.
///
/// The password bytes are read as a big-endian base-256 number, so the same
/// password always yields the same secret. Only the bytes are kept, and they
/// are wiped on drop.
///
/// # Security
///
/// - Never transmit or log the secret
/// - The derivation performs no salting or stretching
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Secret {
    bytes: Vec<u8>,
}

impl Secret {
    /// Derives the secret from raw password bytes.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chaum_pedersen_auth::Secret;
    ///
    /// let a = Secret::from_password(b"hunter2");
    /// let b = Secret::from_password(b"hunter2");
    /// assert_eq!(a.exponent(), b.exponent());
    /// ```
    pub fn from_password(password: &[u8]) -> Self {
        Self {
            bytes: password.to_vec(),
        }
    }

    /// Returns `x` as an integer. The caller owns the returned copy.
    pub fn exponent(&self) -> BigUint {
        BigUint::from_bytes_be(&self.bytes)
    }
}

impl core::fmt::Debug for Secret {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

/// Registered public key material `y1 = g^x mod p`, `y2 = h^x mod p`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicKey {
    y1: BigUint,
    y2: BigUint,
}

impl PublicKey {
    /// Wraps already-computed public values.
    pub fn new(y1: BigUint, y2: BigUint) -> Self {
        Self { y1, y2 }
    }

    /// Computes the public key of `secret` under `params`.
    pub fn from_secret(params: &GroupParameters, secret: &Secret) -> Self {
        let (y1, y2) = params.exp_pair(&secret.exponent());
        Self { y1, y2 }
    }

    /// Returns `y1 = g^x mod p`.
    pub fn y1(&self) -> &BigUint {
        &self.y1
    }

    /// Returns `y2 = h^x mod p`.
    pub fn y2(&self) -> &BigUint {
        &self.y2
    }

    /// Checks that both values are elements of the order-`q` subgroup.
    pub fn validate(&self, params: &GroupParameters) -> Result<()> {
        params.validate_element("y1", &self.y1)?;
        params.validate_element("y2", &self.y2)
    }
}

/// Secret nonce `k` used in the commitment phase.
///
/// Must be used for exactly one challenge. Automatically zeroized when dropped.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Nonce {
    bytes: Vec<u8>,
}

impl Nonce {
    pub(crate) fn new(k: &BigUint) -> Self {
        Self {
            bytes: k.to_bytes_be(),
        }
    }

    /// Returns `k` as an integer.
    pub fn k(&self) -> BigUint {
        BigUint::from_bytes_be(&self.bytes)
    }
}

impl core::fmt::Debug for Nonce {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("Nonce(<redacted>)")
    }
}

/// Commitment values: first message from prover, `r1 = g^k`, `r2 = h^k`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Commitment {
    r1: BigUint,
    r2: BigUint,
}

impl Commitment {
    /// Creates a new commitment from the commitment values.
    pub fn new(r1: BigUint, r2: BigUint) -> Self {
        Self { r1, r2 }
    }

    /// Returns `r1 = g^k mod p`.
    pub fn r1(&self) -> &BigUint {
        &self.r1
    }

    /// Returns `r2 = h^k mod p`.
    pub fn r2(&self) -> &BigUint {
        &self.r2
    }

    /// Checks that both values are elements of the order-`q` subgroup.
    pub fn validate(&self, params: &GroupParameters) -> Result<()> {
        params.validate_element("r1", &self.r1)?;
        params.validate_element("r2", &self.r2)
    }
}

/// Computes the response `s = (k - c * x) mod q`, normalized into `[0, q)`.
///
/// Pure function of its inputs.
pub fn create_response(k: &BigUint, c: &BigUint, x: &BigUint, q: &BigUint) -> BigUint {
    let cx = mul_mod(c, x, q);
    sub_mod(k, &cx, q)
}

/// Opaque, high-entropy token returned after a successful verification.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AuthSessionToken(String);

impl AuthSessionToken {
    /// Mints a fresh token from [`SESSION_TOKEN_BYTES`] random bytes.
    pub fn generate<R: CryptoRngCore>(rng: &mut R) -> Result<Self> {
        let mut bytes = [0u8; SESSION_TOKEN_BYTES];
        fill_random(rng, &mut bytes)?;
        Ok(Self(hex::encode(bytes)))
    }

    /// Returns the hex-encoded token.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the token, returning its hex encoding.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl core::fmt::Display for AuthSessionToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::crypto::SecureRng;

    fn toy() -> GroupParameters {
        GroupParameters::new(23u32.into(), 11u32.into(), 4u32.into(), 9u32.into()).unwrap()
    }

    #[test]
    fn secret_reads_password_as_base256() {
        let secret = Secret::from_password(&[0x01, 0x02]);
        assert_eq!(secret.exponent(), BigUint::from(258u32));
        assert_eq!(Secret::from_password(b"").exponent(), BigUint::from(0u32));
    }

    #[test]
    fn secret_debug_is_redacted() {
        let secret = Secret::from_password(b"password");
        assert_eq!(format!("{secret:?}"), "Secret(<redacted>)");
    }

    #[test]
    fn public_key_from_secret() {
        let key = PublicKey::from_secret(&toy(), &Secret::from_password(&[6]));
        assert_eq!(key.y1(), &BigUint::from(2u32));
        assert_eq!(key.y2(), &BigUint::from(3u32));
        assert!(key.validate(&toy()).is_ok());
    }

    #[test]
    fn response_is_normalized() {
        let q = BigUint::from(11u32);
        let s = create_response(&3u32.into(), &4u32.into(), &6u32.into(), &q);
        assert_eq!(s, BigUint::from(1u32));

        let s = create_response(&10u32.into(), &1u32.into(), &2u32.into(), &q);
        assert_eq!(s, BigUint::from(8u32));
    }

    #[test]
    fn response_is_deterministic() {
        let q = BigUint::from(11u32);
        let a = create_response(&7u32.into(), &5u32.into(), &9u32.into(), &q);
        let b = create_response(&7u32.into(), &5u32.into(), &9u32.into(), &q);
        assert_eq!(a, b);
    }

    #[test]
    fn session_tokens_are_unique_hex() {
        let mut rng = SecureRng::new();
        let a = AuthSessionToken::generate(&mut rng).unwrap();
        let b = AuthSessionToken::generate(&mut rng).unwrap();

        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), SESSION_TOKEN_BYTES * 2);
        assert!(hex::decode(a.as_str()).is_ok());
    }
}
