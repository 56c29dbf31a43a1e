use std::time::Instant;

use metrics::{counter, histogram};
use tonic::metadata::MetadataValue;
use tonic::{Code, Request, Response, Status};

use super::AuthenticationService;
use crate::messages::{ChallengeRequest, RegisterRequest, VerificationRequest};
use crate::proto::auth_server::Auth;
use crate::proto::{
    AuthenticationAnswerRequest, AuthenticationAnswerResponse, AuthenticationChallengeRequest,
    AuthenticationChallengeResponse, GroupParametersRequest, GroupParametersResponse,
    RegisterRequest as ProtoRegisterRequest, RegisterResponse,
};
use crate::{Error, ErrorKind};

/// gRPC status code and HTTP-equivalent status for each error kind.
pub fn status_codes(kind: ErrorKind) -> (Code, u16) {
    match kind {
        ErrorKind::AlreadyRegistered => (Code::AlreadyExists, 409),
        ErrorKind::InvalidProof => (Code::Unauthenticated, 401),
        ErrorKind::UnknownUser | ErrorKind::UnknownAuthId => (Code::NotFound, 404),
        ErrorKind::MalformedInteger
        | ErrorKind::InvalidGroupElement
        | ErrorKind::InvalidUserId => (Code::InvalidArgument, 400),
        ErrorKind::CapacityExceeded => (Code::ResourceExhausted, 429),
        ErrorKind::RandomnessFailure => (Code::Unavailable, 503),
        ErrorKind::InvalidGroupParameters | ErrorKind::ParameterGenerationFailure => {
            (Code::Internal, 500)
        }
    }
}

/// Converts an engine error into a status carrying the localized message.
///
/// The kind, locale and HTTP-equivalent status travel as `x-error-kind`,
/// `x-error-locale` and `x-http-status` metadata.
pub fn error_to_status(err: &Error) -> Status {
    let kind = err.kind();
    let (code, http) = status_codes(kind);
    let localized = err.localized_message();

    let mut status = Status::new(code, localized.message);
    let metadata = status.metadata_mut();
    metadata.insert("x-error-kind", MetadataValue::from_static(kind.as_str()));
    metadata.insert("x-error-locale", MetadataValue::from_static(localized.locale));
    if let Ok(value) = http.to_string().parse() {
        metadata.insert("x-http-status", value);
    }

    status
}

/// gRPC service implementation for Chaum-Pedersen authentication.
#[derive(Clone)]
pub struct AuthServiceImpl {
    service: AuthenticationService,
}

impl AuthServiceImpl {
    /// Creates a new gRPC service over the given authentication service.
    pub fn new(service: AuthenticationService) -> Self {
        Self { service }
    }

    /// Returns the wrapped authentication service.
    pub fn inner(&self) -> &AuthenticationService {
        &self.service
    }

    fn record<T>(operation: &'static str, start: Instant, result: &Result<T, Error>) {
        histogram!("auth.duration", "operation" => operation)
            .record(start.elapsed().as_secs_f64());

        match result {
            Ok(_) => counter!("auth.success", "operation" => operation).increment(1),
            Err(e) => counter!(
                "auth.failure",
                "operation" => operation,
                "kind" => e.kind().as_str()
            )
            .increment(1),
        }
    }
}

#[tonic::async_trait]
impl Auth for AuthServiceImpl {
    async fn register(
        &self,
        request: Request<ProtoRegisterRequest>,
    ) -> Result<Response<RegisterResponse>, Status> {
        let start = Instant::now();
        counter!("auth.requests", "operation" => "register").increment(1);

        let req = request.into_inner();
        let result = self.service.handle_register(&RegisterRequest {
            user: req.user,
            y1: req.y1,
            y2: req.y2,
        });

        Self::record("register", start, &result);
        result.map_err(|e| error_to_status(&e))?;

        Ok(Response::new(RegisterResponse {}))
    }

    async fn create_authentication_challenge(
        &self,
        request: Request<AuthenticationChallengeRequest>,
    ) -> Result<Response<AuthenticationChallengeResponse>, Status> {
        let start = Instant::now();
        counter!("auth.requests", "operation" => "challenge").increment(1);

        let req = request.into_inner();
        let result = self.service.handle_challenge(&ChallengeRequest {
            user: req.user,
            r1: req.r1,
            r2: req.r2,
        });

        Self::record("challenge", start, &result);
        let reply = result.map_err(|e| error_to_status(&e))?;

        Ok(Response::new(AuthenticationChallengeResponse {
            auth_id: reply.auth_id,
            c: reply.c,
        }))
    }

    async fn verify_authentication(
        &self,
        request: Request<AuthenticationAnswerRequest>,
    ) -> Result<Response<AuthenticationAnswerResponse>, Status> {
        let start = Instant::now();
        counter!("auth.requests", "operation" => "verify").increment(1);

        let req = request.into_inner();
        let result = self.service.handle_verification(&VerificationRequest {
            auth_id: req.auth_id,
            s: req.s,
        });

        Self::record("verify", start, &result);
        let reply = result.map_err(|e| error_to_status(&e))?;

        Ok(Response::new(AuthenticationAnswerResponse {
            session_id: reply.session_id,
        }))
    }

    async fn get_group_parameters(
        &self,
        _request: Request<GroupParametersRequest>,
    ) -> Result<Response<GroupParametersResponse>, Status> {
        counter!("auth.requests", "operation" => "parameters").increment(1);

        let reply = self.service.parameters();
        Ok(Response::new(GroupParametersResponse {
            p: reply.p,
            q: reply.q,
            g: reply.g,
            h: reply.h,
        }))
    }
}
