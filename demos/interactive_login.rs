//! Runs one registration and login against an in-process verifier.
//!
//! ```text
//! RUST_LOG=chaum_pedersen_auth=debug cargo run --example interactive_login -- alice hunter2
//! ```

use chaum_pedersen_auth::{AuthenticationService, GroupParameters, Prover, SecureRng};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let user = args.next().unwrap_or_else(|| "alice".to_string());
    let password = args.next().unwrap_or_else(|| "correct horse".to_string());

    let params = GroupParameters::rfc5114()?;
    info!(
        p_bits = params.p().bits(),
        q_bits = params.q().bits(),
        "Using RFC 5114 group"
    );

    let service = AuthenticationService::new(params.clone());
    let prover = Prover::from_password(params, password.as_bytes());

    service.register(&user, prover.public_key().clone())?;
    info!(y1 = %prover.public_key().y1(), "Public key registered");

    let mut rng = SecureRng::new();
    let (commitment, nonce) = prover.commit(&mut rng)?;
    info!(r1 = %commitment.r1(), r2 = %commitment.r2(), "Commitment sent");

    let challenge = service.create_challenge(&user, commitment)?;
    info!(auth_id = %challenge.auth_id, c = %challenge.c, "Challenge received");

    let s = prover.respond(&nonce, &challenge.c);
    info!(%s, "Response computed");

    let token = service.verify(&challenge.auth_id, &s)?;
    println!("Login succeeded for {user}; session id {token}");

    Ok(())
}
