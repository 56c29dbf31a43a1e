//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use chaum_pedersen_auth::GroupParameters;

/// Initialize test tracing (call once at the beginning of tests).
///
/// Only logs from this crate are shown, filtering out HTTP/2 and tower noise.
/// Subsequent calls are safe and will be ignored.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::new("chaum_pedersen_auth=debug");

    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(filter)
        .try_init();
}

/// The textbook group `p = 23, q = 11, g = 4, h = 9`.
pub fn toy_params() -> GroupParameters {
    GroupParameters::from_decimal("23", "11", "4", "9").expect("toy parameters are valid")
}

/// The fixed 255-bit safe-prime group.
pub fn safe_prime_params() -> GroupParameters {
    GroupParameters::safe_prime_256().expect("safe-prime parameters are valid")
}
