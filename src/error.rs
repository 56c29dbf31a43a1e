//! Error types for Chaum-Pedersen authentication.

use serde::Serialize;

/// Locale of every message produced by [`Error::localized_message`].
pub const DEFAULT_LOCALE: &str = "en-US";

/// Main error types for the library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Group parameters violate one of the group-order invariants.
    #[error("Invalid group parameters: {0}")]
    InvalidGroupParameters(String),

    /// On-demand parameter generation ran past its retry ceiling.
    #[error("Failed to generate group parameters after {attempts} attempts")]
    ParameterGenerationFailure {
        /// Number of candidate moduli that were tried.
        attempts: usize,
    },

    /// A boundary value is not a base-10 non-negative integer.
    #[error("Malformed integer in field '{field}'")]
    MalformedInteger {
        /// Name of the offending field.
        field: &'static str,
    },

    /// A value is outside `[1, p)` or not in the order-`q` subgroup.
    #[error("Value of '{field}' is not an element of the order-q subgroup")]
    InvalidGroupElement {
        /// Name of the offending field.
        field: &'static str,
    },

    /// The user identifier is empty or longer than the accepted maximum.
    #[error("Invalid user identifier: {0}")]
    InvalidUserId(String),

    /// The user identifier already has registered key material.
    #[error("User '{0}' is already registered")]
    AlreadyRegistered(String),

    /// No key material is registered for the user identifier.
    #[error("User '{0}' is not registered")]
    UnknownUser(String),

    /// The authentication id was never issued, was already consumed, or expired.
    #[error("Invalid authentication id '{0}'")]
    UnknownAuthId(String),

    /// The pending-challenge store is full.
    #[error("Too many pending challenges (limit {limit})")]
    CapacityExceeded {
        /// Configured maximum number of pending challenges.
        limit: usize,
    },

    /// The secure random source failed or rejection sampling was exhausted.
    #[error("Secure random source failure: {0}")]
    RandomnessFailure(String),

    /// The response does not satisfy both verification equations.
    #[error("Authentication error: {response} is an invalid response to the provided challenge")]
    InvalidProof {
        /// The rejected response `s`, in decimal.
        response: String,
    },
}

/// Machine-distinguishable error category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidGroupParameters,
    ParameterGenerationFailure,
    MalformedInteger,
    InvalidGroupElement,
    InvalidUserId,
    AlreadyRegistered,
    UnknownUser,
    UnknownAuthId,
    CapacityExceeded,
    RandomnessFailure,
    InvalidProof,
}

impl ErrorKind {
    /// Stable snake_case name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidGroupParameters => "invalid_group_parameters",
            ErrorKind::ParameterGenerationFailure => "parameter_generation_failure",
            ErrorKind::MalformedInteger => "malformed_integer",
            ErrorKind::InvalidGroupElement => "invalid_group_element",
            ErrorKind::InvalidUserId => "invalid_user_id",
            ErrorKind::AlreadyRegistered => "already_registered",
            ErrorKind::UnknownUser => "unknown_user",
            ErrorKind::UnknownAuthId => "unknown_auth_id",
            ErrorKind::CapacityExceeded => "capacity_exceeded",
            ErrorKind::RandomnessFailure => "randomness_failure",
            ErrorKind::InvalidProof => "invalid_proof",
        }
    }
}

/// Human-readable message paired with its locale.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LocalizedMessage {
    pub locale: &'static str,
    pub message: String,
}

impl Error {
    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidGroupParameters(_) => ErrorKind::InvalidGroupParameters,
            Error::ParameterGenerationFailure { .. } => ErrorKind::ParameterGenerationFailure,
            Error::MalformedInteger { .. } => ErrorKind::MalformedInteger,
            Error::InvalidGroupElement { .. } => ErrorKind::InvalidGroupElement,
            Error::InvalidUserId(_) => ErrorKind::InvalidUserId,
            Error::AlreadyRegistered(_) => ErrorKind::AlreadyRegistered,
            Error::UnknownUser(_) => ErrorKind::UnknownUser,
            Error::UnknownAuthId(_) => ErrorKind::UnknownAuthId,
            Error::CapacityExceeded { .. } => ErrorKind::CapacityExceeded,
            Error::RandomnessFailure(_) => ErrorKind::RandomnessFailure,
            Error::InvalidProof { .. } => ErrorKind::InvalidProof,
        }
    }

    /// Returns a caller-facing message.
    ///
    /// Proof rejections get a prover-oriented explanation; every other kind
    /// reuses the `Display` text.
    pub fn localized_message(&self) -> LocalizedMessage {
        let message = match self {
            Error::InvalidProof { response } => format!(
                "Invalid challenge response provided by the prover (client): {response}"
            ),
            Error::MalformedInteger { field } => {
                format!("Field '{field}' must be a base-10 non-negative integer")
            }
            other => other.to_string(),
        };

        LocalizedMessage {
            locale: DEFAULT_LOCALE,
            message,
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;
