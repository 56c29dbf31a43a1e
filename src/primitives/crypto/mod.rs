/// Modular arithmetic primitives.
pub mod field;
/// Cryptographically secure random number generation.
pub mod rng;

pub use field::{
    ct_eq, is_probable_prime, mul_mod, parse_decimal, parse_decimal_bounded, sub_mod,
};
pub use rng::{random_nonzero_below, SecureRng, MAX_SAMPLING_ATTEMPTS};
