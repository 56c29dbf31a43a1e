#![no_main]

use chaum_pedersen_auth::messages::{ChallengeRequest, RegisterRequest, VerificationRequest};
use chaum_pedersen_auth::{AuthenticationService, GroupParameters};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let mut fields = text.split('|').map(str::to_string);
    let mut next = || fields.next().unwrap_or_default();

    let Ok(params) = GroupParameters::from_decimal("23", "11", "4", "9") else {
        return;
    };
    let service = AuthenticationService::new(params);

    let user = next();
    let _ = service.handle_register(&RegisterRequest {
        user: user.clone(),
        y1: next(),
        y2: next(),
    });

    let challenge = service.handle_challenge(&ChallengeRequest {
        user,
        r1: next(),
        r2: next(),
    });

    let auth_id = match challenge {
        Ok(reply) => reply.auth_id,
        Err(_) => next(),
    };
    let _ = service.handle_verification(&VerificationRequest { auth_id, s: next() });
});
