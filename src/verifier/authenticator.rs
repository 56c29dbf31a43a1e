use num_bigint::BigUint;
use rand_core::CryptoRngCore;
use tracing::{debug, error, info, warn};

use super::{CredentialStore, SessionStore, Verifier};
use crate::messages::{
    ChallengeReply, ChallengeRequest, ParametersReply, RegisterRequest, VerificationReply,
    VerificationRequest,
};
use crate::primitives::crypto::parse_decimal_bounded;
use crate::{AuthSessionToken, Commitment, Error, GroupParameters, PublicKey, Result, SecureRng};

/// Longest accepted user identifier, in bytes.
pub const MAX_USER_ID_LEN: usize = 256;

/// Extra digits tolerated beyond the width of `p`, for leading zeros.
const DIGIT_MARGIN: usize = 8;

/// Challenge handed back to the prover.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Challenge {
    /// Identifier that the response must quote.
    pub auth_id: String,
    /// Challenge `c` in `[1, q)`.
    pub c: BigUint,
}

/// Server-side authentication state machine.
///
/// Sequences `register`, `create_challenge`, and `verify` over a shared
/// [`CredentialStore`] and [`SessionStore`]. Every login attempt moves from
/// no challenge, to challenge issued, to either verified or rejected; the
/// session is consumed in both terminal cases.
///
/// Clones share the same stores.
#[derive(Clone, Debug)]
pub struct AuthenticationService {
    verifier: Verifier,
    credentials: CredentialStore,
    sessions: SessionStore,
    max_digits: usize,
}

impl AuthenticationService {
    /// Creates a service with empty stores and the default session lifetime.
    pub fn new(params: GroupParameters) -> Self {
        Self::with_stores(params, CredentialStore::new(), SessionStore::default())
    }

    /// Creates a service over existing store handles.
    pub fn with_stores(
        params: GroupParameters,
        credentials: CredentialStore,
        sessions: SessionStore,
    ) -> Self {
        let max_digits = params.p().to_str_radix(10).len() + DIGIT_MARGIN;
        Self {
            verifier: Verifier::new(params),
            credentials,
            sessions,
            max_digits,
        }
    }

    /// Returns the group parameters.
    pub fn params(&self) -> &GroupParameters {
        self.verifier.params()
    }

    /// Returns the credential store handle.
    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    /// Returns the session store handle.
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Registers `key` for `user`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidGroupElement`] if `y1` or `y2` is outside the subgroup
    /// - [`Error::AlreadyRegistered`] if the user already has a key
    pub fn register(&self, user: &str, key: PublicKey) -> Result<()> {
        key.validate(self.params())?;

        if let Err(e) = self.credentials.register(user, key) {
            warn!(user, "Registration rejected: user already exists");
            return Err(e);
        }

        info!(user, "User registered");
        Ok(())
    }

    /// Issues a challenge for `user` against the prover's `commitment`.
    ///
    /// The commitment is stored as submitted; the server never recomputes it.
    pub fn create_challenge(&self, user: &str, commitment: Commitment) -> Result<Challenge> {
        self.create_challenge_with(&mut SecureRng::new(), user, commitment)
    }

    /// [`AuthenticationService::create_challenge`] with an explicit random source.
    pub fn create_challenge_with<R: CryptoRngCore>(
        &self,
        rng: &mut R,
        user: &str,
        commitment: Commitment,
    ) -> Result<Challenge> {
        if let Err(e) = self.credentials.lookup(user) {
            warn!(user, "Challenge requested for unknown user");
            return Err(e);
        }

        commitment.validate(self.params())?;

        let c = self.verifier.issue_challenge(rng)?;
        let auth_id = match self.sessions.create(user, c.clone(), commitment) {
            Ok(auth_id) => auth_id,
            Err(e) => {
                warn!(user, "Challenge rejected: pending challenge store is full");
                return Err(e);
            }
        };

        debug!(user, %auth_id, "Challenge issued");
        Ok(Challenge { auth_id, c })
    }

    /// Checks the response `s` for the challenge identified by `auth_id`.
    ///
    /// The session is consumed before verification, so each `auth_id` can be
    /// answered at most once.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownAuthId`] if the id was never issued, was used, or expired
    /// - [`Error::UnknownUser`] if the session names a user with no key
    /// - [`Error::InvalidProof`] if either verification equation fails
    pub fn verify(&self, auth_id: &str, response: &BigUint) -> Result<AuthSessionToken> {
        self.verify_with(&mut SecureRng::new(), auth_id, response)
    }

    /// [`AuthenticationService::verify`] with an explicit random source.
    pub fn verify_with<R: CryptoRngCore>(
        &self,
        rng: &mut R,
        auth_id: &str,
        response: &BigUint,
    ) -> Result<AuthSessionToken> {
        let session = match self.sessions.consume(auth_id) {
            Ok(session) => session,
            Err(e) => {
                warn!(auth_id, "Verification for unknown or expired auth id");
                return Err(e);
            }
        };

        let key = match self.credentials.lookup(&session.user) {
            Ok(key) => key,
            Err(e) => {
                error!(
                    auth_id,
                    user = %session.user,
                    "Challenge session references a user with no registered key"
                );
                return Err(e);
            }
        };

        if !self.verifier.verify_response(
            &key,
            &session.commitment,
            &session.challenge,
            response,
        ) {
            warn!(auth_id, user = %session.user, "Proof rejected");
            return Err(Error::InvalidProof {
                response: response.to_str_radix(10),
            });
        }

        let token = AuthSessionToken::generate(rng)?;
        info!(auth_id, user = %session.user, "User authenticated");
        Ok(token)
    }

    /// Longest decimal string accepted for any integer field.
    pub fn max_field_digits(&self) -> usize {
        self.max_digits
    }

    fn check_user(user: &str) -> Result<()> {
        if user.is_empty() {
            return Err(Error::InvalidUserId("user id cannot be empty".to_string()));
        }

        if user.len() > MAX_USER_ID_LEN {
            return Err(Error::InvalidUserId(format!(
                "user id exceeds {MAX_USER_ID_LEN} bytes"
            )));
        }

        Ok(())
    }

    fn parse(&self, field: &'static str, value: &str) -> Result<BigUint> {
        parse_decimal_bounded(field, value, self.max_digits)
    }

    /// Parses and handles a registration request.
    ///
    /// The user id and every integer field are bounded before any arithmetic.
    pub fn handle_register(&self, request: &RegisterRequest) -> Result<()> {
        Self::check_user(&request.user)?;
        let y1 = self.parse("y1", &request.y1)?;
        let y2 = self.parse("y2", &request.y2)?;
        self.register(&request.user, PublicKey::new(y1, y2))
    }

    /// Parses and handles a challenge request.
    pub fn handle_challenge(&self, request: &ChallengeRequest) -> Result<ChallengeReply> {
        Self::check_user(&request.user)?;
        let r1 = self.parse("r1", &request.r1)?;
        let r2 = self.parse("r2", &request.r2)?;
        let challenge = self.create_challenge(&request.user, Commitment::new(r1, r2))?;

        Ok(ChallengeReply {
            auth_id: challenge.auth_id,
            c: challenge.c.to_str_radix(10),
        })
    }

    /// Parses and handles a verification request.
    pub fn handle_verification(&self, request: &VerificationRequest) -> Result<VerificationReply> {
        let s = self.parse("s", &request.s)?;
        let token = self.verify(&request.auth_id, &s)?;

        Ok(VerificationReply {
            session_id: token.into_string(),
        })
    }

    /// Returns the public parameters in boundary form.
    pub fn parameters(&self) -> ParametersReply {
        ParametersReply::from(self.params())
    }
}
