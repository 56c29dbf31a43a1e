mod common;

use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

use chaum_pedersen_auth::messages::{ChallengeRequest, VerificationRequest};
use chaum_pedersen_auth::{
    AuthenticationService, Commitment, CredentialStore, Error, GroupParameters, Prover, PublicKey,
    SecureRng, SessionStore,
};
use num_bigint::BigUint;

use common::{safe_prime_params, toy_params};

#[test]
fn verification_cannot_be_replayed() {
    let mut rng = SecureRng::new();
    let params = safe_prime_params();
    let service = AuthenticationService::new(params.clone());
    let prover = Prover::from_password(params, b"password");
    service.register("alice", prover.public_key().clone()).unwrap();

    let (commitment, nonce) = prover.commit(&mut rng).unwrap();
    let challenge = service.create_challenge("alice", commitment).unwrap();
    let s = prover.respond(&nonce, &challenge.c);

    assert!(service.verify(&challenge.auth_id, &s).is_ok());
    assert!(
        matches!(
            service.verify(&challenge.auth_id, &s),
            Err(Error::UnknownAuthId(_))
        ),
        "Second use of the same auth id must fail"
    );
}

#[test]
fn response_is_bound_to_its_challenge() {
    let mut rng = SecureRng::new();
    let params = safe_prime_params();
    let service = AuthenticationService::new(params.clone());
    let prover = Prover::from_password(params, b"password");
    service.register("alice", prover.public_key().clone()).unwrap();

    let (commitment, nonce) = prover.commit(&mut rng).unwrap();
    let first = service.create_challenge("alice", commitment.clone()).unwrap();
    let second = service.create_challenge("alice", commitment).unwrap();
    assert_ne!(first.auth_id, second.auth_id);

    // Answering the first challenge against the second session fails
    // unless the two challenges happen to coincide.
    let s = prover.respond(&nonce, &first.c);
    if first.c != second.c {
        assert!(matches!(
            service.verify(&second.auth_id, &s),
            Err(Error::InvalidProof { .. })
        ));
    }
}

#[test]
fn duplicate_registration_keeps_original_key() {
    let params = safe_prime_params();
    let service = AuthenticationService::new(params.clone());
    let original = Prover::from_password(params.clone(), b"first");
    let attacker = Prover::from_password(params, b"second");

    service.register("alice", original.public_key().clone()).unwrap();
    assert!(matches!(
        service.register("alice", attacker.public_key().clone()),
        Err(Error::AlreadyRegistered(_))
    ));

    assert_eq!(
        &service.credentials().lookup("alice").unwrap(),
        original.public_key()
    );
}

#[test]
fn concurrent_registration_has_one_winner() {
    let store = CredentialStore::new();
    let threads = 16;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|i| {
            let store = store.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                store.register("alice", PublicKey::new((i as u32 + 2).into(), 3u32.into()))
            })
        })
        .collect();

    let successes = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(Result::is_ok)
        .count();

    assert_eq!(successes, 1);
    assert_eq!(store.len(), 1);
}

#[test]
fn concurrent_consume_has_one_winner() {
    let mut rng = SecureRng::new();
    let params = safe_prime_params();
    let service = AuthenticationService::new(params.clone());
    let prover = Prover::from_password(params, b"password");
    service.register("alice", prover.public_key().clone()).unwrap();

    let (commitment, nonce) = prover.commit(&mut rng).unwrap();
    let challenge = service.create_challenge("alice", commitment).unwrap();
    let s = prover.respond(&nonce, &challenge.c);

    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let service = service.clone();
            let barrier = Arc::clone(&barrier);
            let auth_id = challenge.auth_id.clone();
            let s = s.clone();
            thread::spawn(move || {
                barrier.wait();
                service.verify(&auth_id, &s)
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, Error::UnknownAuthId(_))));
}

#[test]
fn concurrent_logins_for_many_users() {
    let params = safe_prime_params();
    let service = AuthenticationService::new(params.clone());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let service = service.clone();
            let params = params.clone();
            thread::spawn(move || {
                let mut rng = SecureRng::new();
                let user = format!("user-{i}");
                let prover = Prover::from_password(params, user.as_bytes());
                service.register(&user, prover.public_key().clone())?;

                let (commitment, nonce) = prover.commit(&mut rng)?;
                let challenge = service.create_challenge(&user, commitment)?;
                let s = prover.respond(&nonce, &challenge.c);
                service.verify(&challenge.auth_id, &s)
            })
        })
        .collect();

    let tokens: HashSet<_> = handles
        .into_iter()
        .map(|h| h.join().unwrap().unwrap().into_string())
        .collect();
    assert_eq!(tokens.len(), 8);
    assert_eq!(service.credentials().len(), 8);
    assert!(service.sessions().is_empty());
}

#[test]
fn expired_challenge_cannot_be_answered() {
    let mut rng = SecureRng::new();
    let params = safe_prime_params();
    let service = AuthenticationService::with_stores(
        params.clone(),
        CredentialStore::new(),
        SessionStore::new(Duration::from_millis(20)),
    );
    let prover = Prover::from_password(params, b"password");
    service.register("alice", prover.public_key().clone()).unwrap();

    let (commitment, nonce) = prover.commit(&mut rng).unwrap();
    let challenge = service.create_challenge("alice", commitment).unwrap();
    let s = prover.respond(&nonce, &challenge.c);

    thread::sleep(Duration::from_millis(50));

    assert!(matches!(
        service.verify(&challenge.auth_id, &s),
        Err(Error::UnknownAuthId(_))
    ));
}

#[test]
fn challenges_are_never_zero() {
    let service = AuthenticationService::new(toy_params());
    service
        .register("alice", PublicKey::new(2u32.into(), 3u32.into()))
        .unwrap();

    for _ in 0..200 {
        let challenge = service
            .create_challenge("alice", Commitment::new(18u32.into(), 16u32.into()))
            .unwrap();
        assert!(challenge.c > BigUint::from(0u32) && challenge.c < BigUint::from(11u32));
    }
    assert_eq!(service.sessions().len(), 200);
    assert_eq!(service.sessions().purge_expired(), 0);
}

#[test]
fn secrets_are_not_printed() {
    let prover = Prover::from_password(safe_prime_params(), b"hunter2");
    let (_, nonce) = prover.commit(&mut SecureRng::new()).unwrap();
    let rendered = format!("{nonce:?}");
    assert!(!rendered.contains(&nonce.k().to_string()));
}

#[test]
fn response_is_interpreted_modulo_q() {
    let mut rng = SecureRng::new();
    let params = safe_prime_params();
    let service = AuthenticationService::new(params.clone());
    let prover = Prover::from_password(params.clone(), b"hunter2");
    service.register("alice", prover.public_key().clone()).unwrap();

    let (commitment, nonce) = prover.commit(&mut rng).unwrap();
    let challenge = service.create_challenge("alice", commitment).unwrap();
    let s = prover.respond(&nonce, &challenge.c);
    let shifted = &s + params.q();

    assert!(service.verify(&challenge.auth_id, &shifted).is_ok());

    let (commitment, nonce) = prover.commit(&mut rng).unwrap();
    let challenge = service.create_challenge("alice", commitment).unwrap();
    let wrong = prover.respond(&nonce, &challenge.c) + 1u32 + params.q();
    assert!(matches!(
        service.verify(&challenge.auth_id, &wrong),
        Err(Error::InvalidProof { .. })
    ));
}

#[test]
fn oversized_response_fails_before_verification() {
    let params = GroupParameters::rfc5114().unwrap();
    let service = AuthenticationService::new(params.clone());
    let prover = Prover::from_password(params, b"hunter2");
    service.register("alice", prover.public_key().clone()).unwrap();

    let (commitment, _) = prover.commit(&mut SecureRng::new()).unwrap();
    let reply = service
        .handle_challenge(&ChallengeRequest {
            user: "alice".into(),
            r1: commitment.r1().to_string(),
            r2: commitment.r2().to_string(),
        })
        .unwrap();

    let start = Instant::now();
    let result = service.handle_verification(&VerificationRequest {
        auth_id: reply.auth_id.clone(),
        s: "9".repeat(1_000_000),
    });
    let elapsed = start.elapsed();

    assert!(matches!(result, Err(Error::MalformedInteger { field: "s" })));
    assert!(elapsed < Duration::from_millis(500), "took {elapsed:?}");

    // The challenge was not consumed by the rejected request.
    assert_eq!(service.sessions().len(), 1);
}

#[test]
fn oversized_commitment_is_rejected_by_field() {
    let service = AuthenticationService::new(safe_prime_params());
    let prover = Prover::from_password(safe_prime_params(), b"hunter2");
    service.register("alice", prover.public_key().clone()).unwrap();

    let result = service.handle_challenge(&ChallengeRequest {
        user: "alice".into(),
        r1: "1".into(),
        r2: "1".repeat(service.max_field_digits() + 1),
    });

    assert!(matches!(result, Err(Error::MalformedInteger { field: "r2" })));
    assert!(service.sessions().is_empty());
}

#[test]
fn pending_challenges_are_capped() {
    let service = AuthenticationService::with_stores(
        toy_params(),
        CredentialStore::new(),
        SessionStore::with_capacity(Duration::from_secs(60), 3),
    );
    service
        .register("alice", PublicKey::new(2u32.into(), 3u32.into()))
        .unwrap();

    for _ in 0..3 {
        service
            .create_challenge("alice", Commitment::new(18u32.into(), 16u32.into()))
            .unwrap();
    }

    let result = service.create_challenge("alice", Commitment::new(18u32.into(), 16u32.into()));
    assert!(matches!(result, Err(Error::CapacityExceeded { limit: 3 })));
    assert_eq!(service.sessions().len(), 3);
}
