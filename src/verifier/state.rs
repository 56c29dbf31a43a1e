use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};

use num_bigint::BigUint;
use uuid::Uuid;

use crate::{Commitment, Error, PublicKey, Result};

/// Default lifetime of an issued challenge.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(300);

/// Default ceiling on challenges awaiting a response.
pub const DEFAULT_MAX_PENDING_CHALLENGES: usize = 50_000;

/// In-flight challenge awaiting its response.
#[derive(Clone, Debug)]
pub struct ChallengeSession {
    /// Identifier returned to the prover.
    pub auth_id: String,
    /// User the challenge was issued to.
    pub user: String,
    /// Challenge `c`.
    pub challenge: BigUint,
    /// Prover-supplied commitment `(r1, r2)`.
    pub commitment: Commitment,
    created_at: Instant,
}

impl ChallengeSession {
    /// Checks whether the session is older than `ttl`.
    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() >= ttl
    }
}

/// Registered public keys, keyed by user identifier.
///
/// Clones share the same underlying map.
#[derive(Clone, Debug, Default)]
pub struct CredentialStore {
    users: Arc<RwLock<HashMap<String, PublicKey>>>,
}

impl CredentialStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `key` for `user` if the user is absent.
    ///
    /// The existence check and the insert happen under one write lock.
    pub fn register(&self, user: &str, key: PublicKey) -> Result<()> {
        let mut users = self.users.write().unwrap_or_else(PoisonError::into_inner);

        if users.contains_key(user) {
            return Err(Error::AlreadyRegistered(user.to_string()));
        }

        users.insert(user.to_string(), key);
        Ok(())
    }

    /// Returns the public key registered for `user`.
    pub fn lookup(&self, user: &str) -> Result<PublicKey> {
        let users = self.users.read().unwrap_or_else(PoisonError::into_inner);
        users
            .get(user)
            .cloned()
            .ok_or_else(|| Error::UnknownUser(user.to_string()))
    }

    /// Returns the number of registered users.
    pub fn len(&self) -> usize {
        self.users.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns `true` if no user is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Issued challenges, keyed by authentication id. Each entry is single-use.
///
/// Clones share the same underlying map.
#[derive(Clone, Debug)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<String, ChallengeSession>>>,
    ttl: Duration,
    max_pending: usize,
}

impl SessionStore {
    /// Creates an empty store whose entries expire after `ttl`, holding at
    /// most [`DEFAULT_MAX_PENDING_CHALLENGES`] entries.
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, DEFAULT_MAX_PENDING_CHALLENGES)
    }

    /// Creates an empty store holding at most `max_pending` entries.
    pub fn with_capacity(ttl: Duration, max_pending: usize) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            ttl,
            max_pending,
        }
    }

    /// Returns the configured lifetime of a challenge.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the maximum number of pending challenges.
    pub fn max_pending(&self) -> usize {
        self.max_pending
    }

    /// Stores a new challenge and returns its fresh random (v4 UUID) id.
    ///
    /// When the store is full, expired entries are dropped first; if it is
    /// still full the call fails with [`Error::CapacityExceeded`].
    pub fn create(
        &self,
        user: &str,
        challenge: BigUint,
        commitment: Commitment,
    ) -> Result<String> {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);

        if sessions.len() >= self.max_pending {
            sessions.retain(|_, session| !session.is_expired(self.ttl));
            if sessions.len() >= self.max_pending {
                return Err(Error::CapacityExceeded {
                    limit: self.max_pending,
                });
            }
        }

        let mut auth_id = Uuid::new_v4().to_string();
        while sessions.contains_key(&auth_id) {
            auth_id = Uuid::new_v4().to_string();
        }

        sessions.insert(
            auth_id.clone(),
            ChallengeSession {
                auth_id: auth_id.clone(),
                user: user.to_string(),
                challenge,
                commitment,
                created_at: Instant::now(),
            },
        );

        Ok(auth_id)
    }

    /// Atomically removes and returns the session for `auth_id`.
    ///
    /// A second call with the same id fails with [`Error::UnknownAuthId`], as
    /// does a call for an expired session (which is removed as well).
    pub fn consume(&self, auth_id: &str) -> Result<ChallengeSession> {
        let session = self
            .sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(auth_id)
            .ok_or_else(|| Error::UnknownAuthId(auth_id.to_string()))?;

        if session.is_expired(self.ttl) {
            return Err(Error::UnknownAuthId(auth_id.to_string()));
        }

        Ok(session)
    }

    /// Removes every expired session and returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired(self.ttl));
        before - sessions.len()
    }

    /// Returns the number of pending challenges.
    pub fn len(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if no challenge is pending.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TTL)
    }
}
