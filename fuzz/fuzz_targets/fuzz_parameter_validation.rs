#![no_main]

use chaum_pedersen_auth::GroupParameters;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let parts: Vec<&str> = text.splitn(4, ',').collect();
    let [p, q, g, h] = parts.as_slice() else {
        return;
    };

    // Keep Miller-Rabin cheap.
    if [p, q, g, h].iter().any(|v| v.len() > 40) {
        return;
    }

    if let Ok(params) = GroupParameters::from_decimal(p, q, g, h) {
        assert!(params.validate().is_ok());
        assert!(params.g() != params.h());
    }
});
