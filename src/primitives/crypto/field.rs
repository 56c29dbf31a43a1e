//! Modular arithmetic over arbitrary-precision integers.

use num_bigint::BigUint;
use num_traits::{One, Zero};
use subtle::ConstantTimeEq;

use crate::{Error, Result};

/// Primes used for trial division before Miller-Rabin.
const SMALL_PRIMES: [u32; 25] = [
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97,
];

/// Fixed Miller-Rabin witnesses. Deterministic below 3.3 * 10^24.
const MILLER_RABIN_BASES: [u32; 20] = [
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71,
];

/// Parses a base-10 ASCII string into a non-negative integer.
///
/// Only the digits `0-9` are accepted: no sign, whitespace, or separators.
/// Failures name the offending field.
pub fn parse_decimal(field: &'static str, value: &str) -> Result<BigUint> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::MalformedInteger { field });
    }

    BigUint::parse_bytes(value.as_bytes(), 10).ok_or(Error::MalformedInteger { field })
}

/// [`parse_decimal`] that also rejects strings longer than `max_digits`.
///
/// The length is checked before any conversion.
pub fn parse_decimal_bounded(
    field: &'static str,
    value: &str,
    max_digits: usize,
) -> Result<BigUint> {
    if value.len() > max_digits {
        return Err(Error::MalformedInteger { field });
    }

    parse_decimal(field, value)
}

/// Computes `(a * b) mod m`.
pub fn mul_mod(a: &BigUint, b: &BigUint, m: &BigUint) -> BigUint {
    (a * b) % m
}

/// Computes `(a - b) mod m`, normalized into `[0, m)`.
pub fn sub_mod(a: &BigUint, b: &BigUint, m: &BigUint) -> BigUint {
    let a = a % m;
    let b = b % m;

    if a >= b {
        a - b
    } else {
        m - (b - a)
    }
}

/// Compares two integers through their big-endian encodings in constant time.
pub fn ct_eq(a: &BigUint, b: &BigUint) -> bool {
    let a = a.to_bytes_be();
    let b = b.to_bytes_be();
    let len = a.len().max(b.len());

    bool::from(left_pad(&a, len).ct_eq(&left_pad(&b, len)))
}

fn left_pad(bytes: &[u8], len: usize) -> Vec<u8> {
    let mut padded = vec![0u8; len - bytes.len()];
    padded.extend_from_slice(bytes);
    padded
}

/// Miller-Rabin primality test with fixed witnesses.
///
/// Exact for every input below 3.3 * 10^24. Above that bound the error rate
/// is negligible for randomly drawn candidates, which is the only way this
/// crate produces large inputs besides audited constants.
pub fn is_probable_prime(n: &BigUint) -> bool {
    let two = BigUint::from(2u32);
    if *n < two {
        return false;
    }

    for &p in SMALL_PRIMES.iter() {
        if *n == BigUint::from(p) {
            return true;
        }
        if (n % p).is_zero() {
            return false;
        }
    }

    let n_minus_one = n - 1u32;
    let s = n_minus_one.trailing_zeros().unwrap_or(0);
    let d = &n_minus_one >> s;

    'witness: for &base in MILLER_RABIN_BASES.iter() {
        let mut x = BigUint::from(base).modpow(&d, n);
        if x.is_one() || x == n_minus_one {
            continue;
        }

        for _ in 1..s {
            x = mul_mod(&x, &x, n);
            if x == n_minus_one {
                continue 'witness;
            }
        }

        return false;
    }

    true
}
