//! Request and reply shapes at the service boundary.
//!
//! Every large integer crosses the boundary as a base-10 ASCII string.

use serde::{Deserialize, Serialize};

use crate::GroupParameters;

/// `Register(user, y1, y2)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub user: String,
    pub y1: String,
    pub y2: String,
}

/// `CreateAuthenticationChallenge(user, r1, r2)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeRequest {
    pub user: String,
    pub r1: String,
    pub r2: String,
}

/// Reply to a challenge request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeReply {
    pub auth_id: String,
    pub c: String,
}

/// `VerifyAuthentication(auth_id, s)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRequest {
    pub auth_id: String,
    pub s: String,
}

/// Reply to a successful verification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReply {
    pub session_id: String,
}

/// The server's public group parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParametersReply {
    pub p: String,
    pub q: String,
    pub g: String,
    pub h: String,
}

impl From<&GroupParameters> for ParametersReply {
    fn from(params: &GroupParameters) -> Self {
        Self {
            p: params.p().to_str_radix(10),
            q: params.q().to_str_radix(10),
            g: params.g().to_str_radix(10),
            h: params.h().to_str_radix(10),
        }
    }
}

impl ParametersReply {
    /// Parses and validates the advertised parameters.
    pub fn to_parameters(&self) -> crate::Result<GroupParameters> {
        GroupParameters::from_decimal(&self.p, &self.q, &self.g, &self.h)
    }
}
