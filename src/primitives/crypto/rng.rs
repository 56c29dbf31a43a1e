//! Cryptographically secure randomness and bounded rejection sampling.

use num_bigint::BigUint;
use num_traits::Zero;
use rand_core::{CryptoRng, CryptoRngCore, OsRng, RngCore};

use super::field::is_probable_prime;
use crate::{Error, Result};

/// Upper bound on draws for a single nonzero sample below a bound.
///
/// Each draw is accepted with probability above 1/4, so exhausting this
/// ceiling means the entropy source is broken rather than unlucky.
pub const MAX_SAMPLING_ATTEMPTS: usize = 256;

/// Cryptographically secure random number generator.
///
/// This is a thin wrapper around `OsRng` that provides a consistent interface
/// for cryptographic randomness throughout the library.
pub struct SecureRng(OsRng);

impl SecureRng {
    /// Creates a new cryptographically secure random number generator.
    pub fn new() -> Self {
        Self(OsRng)
    }
}

impl Default for SecureRng {
    fn default() -> Self {
        Self::new()
    }
}

impl RngCore for SecureRng {
    fn next_u32(&mut self) -> u32 {
        self.0.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.0.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.0.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> core::result::Result<(), rand_core::Error> {
        self.0.try_fill_bytes(dest)
    }
}

impl CryptoRng for SecureRng {}

/// Fills `dest` from `rng`, surfacing entropy-source errors.
pub fn fill_random<R: CryptoRngCore>(rng: &mut R, dest: &mut [u8]) -> Result<()> {
    rng.try_fill_bytes(dest)
        .map_err(|e| Error::RandomnessFailure(e.to_string()))
}

/// Draws a uniform integer in `[0, 2^bits)`.
pub fn random_bits<R: CryptoRngCore>(rng: &mut R, bits: u64) -> Result<BigUint> {
    if bits == 0 {
        return Ok(BigUint::zero());
    }

    let len = bits.div_ceil(8) as usize;
    let mut buf = vec![0u8; len];
    fill_random(rng, &mut buf)?;

    let excess = (len as u64 * 8 - bits) as u32;
    if excess > 0 {
        buf[0] &= 0xFF >> excess;
    }

    Ok(BigUint::from_bytes_be(&buf))
}

/// Draws a uniform integer in `[1, bound)` by rejection sampling.
///
/// Zero is resampled, as are draws at or above `bound`. Fails with
/// [`Error::RandomnessFailure`] once [`MAX_SAMPLING_ATTEMPTS`] draws were
/// rejected.
pub fn random_nonzero_below<R: CryptoRngCore>(rng: &mut R, bound: &BigUint) -> Result<BigUint> {
    if *bound <= BigUint::from(1u32) {
        return Err(Error::RandomnessFailure(format!(
            "cannot sample a nonzero value below {bound}"
        )));
    }

    let bits = bound.bits();
    for _ in 0..MAX_SAMPLING_ATTEMPTS {
        let candidate = random_bits(rng, bits)?;
        if !candidate.is_zero() && candidate < *bound {
            return Ok(candidate);
        }
    }

    Err(Error::RandomnessFailure(format!(
        "rejection sampling exhausted after {MAX_SAMPLING_ATTEMPTS} draws"
    )))
}

/// Draws an odd `bits`-bit integer with the top bit set and tests it for
/// primality, up to `max_candidates` times.
///
/// Returns `Ok(None)` when every candidate was composite.
pub fn random_prime<R: CryptoRngCore>(
    rng: &mut R,
    bits: u64,
    max_candidates: usize,
) -> Result<Option<BigUint>> {
    if bits < 2 {
        return Ok(None);
    }

    for _ in 0..max_candidates {
        let mut candidate = random_bits(rng, bits)?;
        candidate.set_bit(bits - 1, true);
        candidate.set_bit(0, true);

        if is_probable_prime(&candidate) {
            return Ok(Some(candidate));
        }
    }

    Ok(None)
}
