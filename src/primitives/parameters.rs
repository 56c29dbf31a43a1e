//! Public group parameters `(p, q, g, h)` for the Chaum-Pedersen protocol.

use num_bigint::BigUint;
use num_traits::{One, Zero};
use rand_core::CryptoRngCore;
use tracing::{debug, warn};

use super::crypto::rng::random_prime;
use super::crypto::{is_probable_prime, parse_decimal};
use crate::{Error, Result};

/// Default ceiling on candidate moduli tried by [`GroupParameters::generate`].
pub const DEFAULT_GENERATION_ATTEMPTS: usize = 512;

/// Smallest modulus width accepted for generated parameters.
pub const MIN_GENERATED_BITS: u64 = 16;

/// Random half-width primes tried as `q` for each modulus.
const RANDOM_Q_CANDIDATES: usize = 2;

/// Small primes stripped from `p - 1` when looking for a large prime factor.
const SMOOTH_FACTORS: [u32; 25] = [
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97,
];

/// RFC 5114 §2.3 modulus (2048 bits).
const RFC5114_P: &str = "87A8E61DB4B6663CFFBBD19C651959998CEEF608660DD0F25D2CEED4435E3B00E00DF8F1D61957D4FAF7DF4561B2AA3016C3D91134096FAA3BF4296D830E9A7C209E0C6497517ABD5A8A9D306BCF67ED91F9E6725B4758C022E0B1EF4275BF7B6C5BFC11D45F9088B941F54EB1E59BB8BC39A0BF12307F5C4FDB70C581B23F76B63ACAE1CAA6B7902D52526735488A0EF13C6D9A51BFA4AB3AD8347796524D8EF6A167B5A41825D967E144E5140564251CCACB83E6B486F6B3CA3F7971506026C0B857F689962856DED4010ABD0BE621C3A3960A54E710C375F26375D7014103A4B54330C198AF126116D2276E11715F693877FAD7EF09CADB094AE91E1A1597";

/// RFC 5114 §2.3 subgroup order (256 bits).
const RFC5114_Q: &str = "8CF83642A709A097B447997640129DA299B1A47D1EB3750BA308B0FE64F5FBD3";

/// RFC 5114 §2.3 generator of the order-q subgroup.
const RFC5114_G: &str = "3FB32C9B73134D0B2E77506660EDBD484CA7B18F21EF205407F4793A1A0BA12510DBC15077BE463FFF4FED4AAC0BB555BE3A6C1B0C6B47B1BC3773BF7E8C6F62901228F8C28CBB18A55AE31341000A650196F931C77A57F2DDF463E5E9EC144B777DE62AAAB8A8628AC376D282D6ED3864E67982428EBC831D14348F6F2F9193B5045AF2767164E1DFC967C1FB3F2E55A4BD1BFFE83B9C80D052B985D182EA0ADB2A3B7313D3FE14C8484B1E052588B9B7D2BBD2DF016199ECD06E1557CD0915B3353BBB64E0EC377FD028370DF92B52C7891428CDC67EB6184B523D1DB246C32F63078490F00EF8D647D148D47954515E2327CFEF98C582664B4C0F6CC41659";

/// 255-bit safe prime; the subgroup order is `(p - 1) / 2`.
const SAFE_PRIME_256_P: &str =
    "42765216643065397982265462252423826320512529931694366715111734768493812630447";
const SAFE_PRIME_256_Q: &str =
    "21382608321532698991132731126211913160256264965847183357555867384246906315223";

/// Public parameters for the Chaum-Pedersen protocol.
///
/// `g` and `h` both generate the subgroup of prime order `q` in the
/// multiplicative group modulo the prime `p`. Every constructor checks:
///
/// - `p`, `q`, `g`, `h` are all greater than one
/// - `p` and `q` are (probable) primes
/// - `q` divides `p - 1`
/// - `g, h < p`, `g != h`, and `g^q = h^q = 1 (mod p)`
///
/// Parameters are immutable once built and safe to share across threads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupParameters {
    p: BigUint,
    q: BigUint,
    g: BigUint,
    h: BigUint,
}

impl GroupParameters {
    /// Validates and wraps the given constants.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidGroupParameters`] naming the first violated invariant.
    pub fn new(p: BigUint, q: BigUint, g: BigUint, h: BigUint) -> Result<Self> {
        let params = Self { p, q, g, h };
        params.validate()?;
        Ok(params)
    }

    /// Parses base-10 constants, then validates them.
    pub fn from_decimal(p: &str, q: &str, g: &str, h: &str) -> Result<Self> {
        Self::new(
            parse_decimal("p", p)?,
            parse_decimal("q", q)?,
            parse_decimal("g", g)?,
            parse_decimal("h", h)?,
        )
    }

    /// The RFC 5114 2048-bit MODP group with a 256-bit prime-order subgroup.
    ///
    /// `h` is derived as `g^2 mod p`, which keeps it in the same subgroup.
    pub fn rfc5114() -> Result<Self> {
        let p = parse_hex("p", RFC5114_P)?;
        let q = parse_hex("q", RFC5114_Q)?;
        let g = parse_hex("g", RFC5114_G)?;
        let h = g.modpow(&BigUint::from(2u32), &p);

        debug!(bits = p.bits(), "Loaded RFC 5114 group parameters");
        Self::new(p, q, g, h)
    }

    /// A 255-bit safe-prime group with `g = 4` and `h = 9`.
    ///
    /// Both generators are quadratic residues, so they lie in the subgroup of
    /// order `q = (p - 1) / 2`.
    pub fn safe_prime_256() -> Result<Self> {
        debug!("Loaded 256-bit safe-prime group parameters");
        Self::from_decimal(SAFE_PRIME_256_P, SAFE_PRIME_256_Q, "4", "9")
    }

    /// Generates fresh parameters with a `bits`-bit modulus.
    ///
    /// Uses [`DEFAULT_GENERATION_ATTEMPTS`] as the retry ceiling.
    pub fn generate<R: CryptoRngCore>(bits: u64, rng: &mut R) -> Result<Self> {
        Self::generate_bounded(bits, DEFAULT_GENERATION_ATTEMPTS, rng)
    }

    /// Generates fresh parameters, trying at most `max_attempts` moduli.
    ///
    /// For each prime `p`, the candidates for `q` are the large cofactor of
    /// `p - 1` left after removing small prime factors, then a few random
    /// primes of half the width. The first candidate dividing `p - 1` yields
    /// `g = 2^((p - 1) / q) mod p` and `h = g^2 mod p`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidGroupParameters`] if `bits` is below [`MIN_GENERATED_BITS`]
    /// - [`Error::ParameterGenerationFailure`] once the ceiling is reached
    /// - [`Error::RandomnessFailure`] if the random source fails
    pub fn generate_bounded<R: CryptoRngCore>(
        bits: u64,
        max_attempts: usize,
        rng: &mut R,
    ) -> Result<Self> {
        if bits < MIN_GENERATED_BITS {
            return Err(Error::InvalidGroupParameters(format!(
                "modulus must have at least {MIN_GENERATED_BITS} bits, got {bits}"
            )));
        }

        let prime_candidates = (bits as usize).saturating_mul(4);
        let two = BigUint::from(2u32);

        for attempt in 1..=max_attempts {
            let Some(p) = random_prime(rng, bits, prime_candidates)? else {
                continue;
            };
            let p_minus_one = &p - 1u32;

            let mut candidates = Vec::with_capacity(RANDOM_Q_CANDIDATES + 1);
            candidates.extend(large_cofactor(&p_minus_one, bits / 2));
            for _ in 0..RANDOM_Q_CANDIDATES {
                candidates.extend(random_prime(rng, bits / 2, prime_candidates)?);
            }

            for q in candidates {
                if !(&p_minus_one % &q).is_zero() {
                    continue;
                }

                let g = two.modpow(&(&p_minus_one / &q), &p);
                if g.is_one() {
                    continue;
                }
                let h = g.modpow(&two, &p);

                if let Ok(params) = Self::new(p.clone(), q, g, h) {
                    debug!(bits, attempt, "Generated group parameters");
                    return Ok(params);
                }
            }
        }

        warn!(bits, max_attempts, "Group parameter generation exhausted");
        Err(Error::ParameterGenerationFailure {
            attempts: max_attempts,
        })
    }

    /// Returns the modulus `p`.
    pub fn p(&self) -> &BigUint {
        &self.p
    }

    /// Returns the subgroup order `q`.
    pub fn q(&self) -> &BigUint {
        &self.q
    }

    /// Returns the first generator `g`.
    pub fn g(&self) -> &BigUint {
        &self.g
    }

    /// Returns the second generator `h`.
    pub fn h(&self) -> &BigUint {
        &self.h
    }

    /// Computes `(g^e mod p, h^e mod p)`.
    pub fn exp_pair(&self, e: &BigUint) -> (BigUint, BigUint) {
        (self.g.modpow(e, &self.p), self.h.modpow(e, &self.p))
    }

    /// Checks that `value` lies in `[1, p)` and in the order-`q` subgroup.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidGroupElement`] naming `field`.
    pub fn validate_element(&self, field: &'static str, value: &BigUint) -> Result<()> {
        if value.is_zero() || *value >= self.p {
            return Err(Error::InvalidGroupElement { field });
        }

        if !value.modpow(&self.q, &self.p).is_one() {
            return Err(Error::InvalidGroupElement { field });
        }

        Ok(())
    }

    /// Re-checks every group-order invariant.
    pub fn validate(&self) -> Result<()> {
        let one = BigUint::one();

        for (name, value) in [("p", &self.p), ("q", &self.q), ("g", &self.g), ("h", &self.h)] {
            if *value <= one {
                return Err(Error::InvalidGroupParameters(format!(
                    "{name} must be greater than 1"
                )));
            }
        }

        if !is_probable_prime(&self.p) {
            return Err(Error::InvalidGroupParameters("p is not prime".to_string()));
        }

        if !is_probable_prime(&self.q) {
            return Err(Error::InvalidGroupParameters("q is not prime".to_string()));
        }

        if !((&self.p - 1u32) % &self.q).is_zero() {
            return Err(Error::InvalidGroupParameters(
                "q does not divide p - 1".to_string(),
            ));
        }

        if self.g >= self.p || self.h >= self.p {
            return Err(Error::InvalidGroupParameters(
                "generators must be less than p".to_string(),
            ));
        }

        if self.g == self.h {
            return Err(Error::InvalidGroupParameters(
                "generators g and h must be different".to_string(),
            ));
        }

        if !self.g.modpow(&self.q, &self.p).is_one() {
            return Err(Error::InvalidGroupParameters(
                "g^q mod p is not 1".to_string(),
            ));
        }

        if !self.h.modpow(&self.q, &self.p).is_one() {
            return Err(Error::InvalidGroupParameters(
                "h^q mod p is not 1".to_string(),
            ));
        }

        Ok(())
    }
}

/// Strips small prime factors from `n` and returns the remainder if it is a
/// prime of at least `min_bits` bits.
fn large_cofactor(n: &BigUint, min_bits: u64) -> Option<BigUint> {
    let mut rest = n.clone();
    for &f in SMOOTH_FACTORS.iter() {
        while !rest.is_zero() && (&rest % f).is_zero() {
            rest /= f;
        }
    }

    (rest.bits() >= min_bits && is_probable_prime(&rest)).then_some(rest)
}

fn parse_hex(name: &str, hex: &str) -> Result<BigUint> {
    BigUint::parse_bytes(hex.as_bytes(), 16)
        .ok_or_else(|| Error::InvalidGroupParameters(format!("constant {name} is not valid hex")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::crypto::SecureRng;

    fn toy() -> GroupParameters {
        GroupParameters::new(23u32.into(), 11u32.into(), 4u32.into(), 9u32.into()).unwrap()
    }

    #[test]
    fn toy_parameters_are_valid() {
        let params = toy();
        assert_eq!(params.p(), &BigUint::from(23u32));
        assert_eq!(params.q(), &BigUint::from(11u32));
    }

    #[test]
    fn presets_are_valid() {
        let rfc = GroupParameters::rfc5114().unwrap();
        assert_eq!(rfc.p().bits(), 2048);
        assert_eq!(rfc.q().bits(), 256);

        let safe = GroupParameters::safe_prime_256().unwrap();
        assert_eq!(safe.q() * 2u32 + 1u32, *safe.p());
    }

    #[test]
    fn rejects_q_not_dividing_p_minus_one() {
        let result = GroupParameters::new(23u32.into(), 7u32.into(), 4u32.into(), 9u32.into());
        assert!(matches!(result, Err(Error::InvalidGroupParameters(_))));
    }

    #[test]
    fn rejects_composite_modulus() {
        // 21 = 3 * 7, and 5 divides 20, but 21 is not prime.
        let result = GroupParameters::new(21u32.into(), 5u32.into(), 4u32.into(), 16u32.into());
        assert!(matches!(result, Err(Error::InvalidGroupParameters(_))));
    }

    #[test]
    fn rejects_generator_outside_subgroup() {
        // 5 has order 22 modulo 23.
        let result = GroupParameters::new(23u32.into(), 11u32.into(), 5u32.into(), 9u32.into());
        assert!(matches!(result, Err(Error::InvalidGroupParameters(_))));
    }

    #[test]
    fn rejects_trivial_and_equal_generators() {
        let one = GroupParameters::new(23u32.into(), 11u32.into(), 1u32.into(), 9u32.into());
        assert!(matches!(one, Err(Error::InvalidGroupParameters(_))));

        let equal = GroupParameters::new(23u32.into(), 11u32.into(), 4u32.into(), 4u32.into());
        assert!(matches!(equal, Err(Error::InvalidGroupParameters(_))));
    }

    #[test]
    fn from_decimal_names_malformed_field() {
        let result = GroupParameters::from_decimal("23", "11", "four", "9");
        assert!(matches!(result, Err(Error::MalformedInteger { field: "g" })));
    }

    #[test]
    fn exp_pair_matches_worked_example() {
        let params = toy();
        let (y1, y2) = params.exp_pair(&BigUint::from(6u32));
        assert_eq!(y1, BigUint::from(2u32));
        assert_eq!(y2, BigUint::from(3u32));
    }

    #[test]
    fn generated_parameters_satisfy_invariants() {
        let mut rng = SecureRng::new();
        let params = GroupParameters::generate(64, &mut rng).unwrap();

        assert_eq!(params.p().bits(), 64);
        assert!(params.validate().is_ok());
        assert_eq!(params.h(), &params.g().modpow(&BigUint::from(2u32), params.p()));
    }

    #[test]
    fn generation_rejects_tiny_modulus() {
        let result = GroupParameters::generate(8, &mut SecureRng::new());
        assert!(matches!(result, Err(Error::InvalidGroupParameters(_))));
    }

    #[test]
    fn generation_reports_exhaustion() {
        let result = GroupParameters::generate_bounded(64, 0, &mut SecureRng::new());
        assert!(matches!(
            result,
            Err(Error::ParameterGenerationFailure { attempts: 0 })
        ));
    }

    #[test]
    fn large_cofactor_strips_small_primes() {
        // 2424 = 2^3 * 3 * 101
        assert_eq!(large_cofactor(&BigUint::from(2424u32), 4), Some(BigUint::from(101u32)));
        // 101 is too narrow for an 8-bit floor
        assert_eq!(large_cofactor(&BigUint::from(2424u32), 8), None);
        // 2^10 has no large prime factor
        assert_eq!(large_cofactor(&BigUint::from(1024u32), 2), None);
    }

    #[test]
    fn validate_element_checks_range_and_subgroup() {
        let params = toy();
        assert!(params.validate_element("y1", &BigUint::from(18u32)).is_ok());
        assert!(params.validate_element("y1", &BigUint::one()).is_ok());

        for bad in [0u32, 5, 22, 23, 41] {
            assert!(matches!(
                params.validate_element("y1", &BigUint::from(bad)),
                Err(Error::InvalidGroupElement { field: "y1" })
            ));
        }
    }
}
