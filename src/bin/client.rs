use std::time::Instant;

use chaum_pedersen_auth::messages::ParametersReply;
use chaum_pedersen_auth::proto::auth_client::AuthClient;
use chaum_pedersen_auth::proto::{
    AuthenticationAnswerRequest, AuthenticationChallengeRequest, GroupParametersRequest,
    RegisterRequest,
};
use chaum_pedersen_auth::{GroupParameters, Prover, SecureRng};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tonic::transport::Channel;
use tonic::{Request, Status};
use zeroize::Zeroizing;

#[derive(Parser)]
#[command(name = "client")]
#[command(about = "Chaum-Pedersen password authentication client", long_about = None)]
struct Cli {
    #[arg(short, long, env = "AUTH_SERVER", default_value = "http://127.0.0.1:50051")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register the public key derived from a password
    Register {
        #[arg(short, long)]
        user: String,

        #[arg(short, long, env = "AUTH_PASSWORD")]
        password: String,
    },

    /// Prove knowledge of the password and obtain a session id
    Login {
        #[arg(short, long)]
        user: String,

        #[arg(short, long, env = "AUTH_PASSWORD")]
        password: String,
    },
}

#[derive(Serialize)]
struct Outcome {
    operation: &'static str,
    user: String,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorReport>,
    elapsed_ms: u128,
}

#[derive(Serialize)]
struct ErrorReport {
    code: String,
    kind: Option<String>,
    http_status: Option<String>,
    message: String,
}

impl From<Status> for ErrorReport {
    fn from(status: Status) -> Self {
        let metadata = |key: &str| {
            status
                .metadata()
                .get(key)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };

        Self {
            code: format!("{:?}", status.code()),
            kind: metadata("x-error-kind"),
            http_status: metadata("x-http-status"),
            message: status.message().to_string(),
        }
    }
}

async fn fetch_parameters(
    client: &mut AuthClient<Channel>,
) -> Result<GroupParameters, Box<dyn std::error::Error>> {
    let reply = client
        .get_group_parameters(Request::new(GroupParametersRequest {}))
        .await?
        .into_inner();

    let params = ParametersReply {
        p: reply.p,
        q: reply.q,
        g: reply.g,
        h: reply.h,
    }
    .to_parameters()?;

    Ok(params)
}

async fn register(
    client: &mut AuthClient<Channel>,
    prover: &Prover,
    user: &str,
) -> Result<(), Status> {
    let key = prover.public_key();
    client
        .register(Request::new(RegisterRequest {
            user: user.to_string(),
            y1: key.y1().to_str_radix(10),
            y2: key.y2().to_str_radix(10),
        }))
        .await?;

    Ok(())
}

async fn login(
    client: &mut AuthClient<Channel>,
    prover: &Prover,
    user: &str,
) -> Result<String, Status> {
    let mut rng = SecureRng::new();
    let (commitment, nonce) = prover
        .commit(&mut rng)
        .map_err(|e| Status::unavailable(e.to_string()))?;

    let challenge = client
        .create_authentication_challenge(Request::new(AuthenticationChallengeRequest {
            user: user.to_string(),
            r1: commitment.r1().to_str_radix(10),
            r2: commitment.r2().to_str_radix(10),
        }))
        .await?
        .into_inner();

    let c = challenge
        .c
        .parse()
        .map_err(|_| Status::invalid_argument("server sent a malformed challenge"))?;
    let s = prover.respond(&nonce, &c);

    let answer = client
        .verify_authentication(Request::new(AuthenticationAnswerRequest {
            auth_id: challenge.auth_id,
            s: s.to_str_radix(10),
        }))
        .await?
        .into_inner();

    Ok(answer.session_id)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut client = AuthClient::connect(cli.server.clone()).await?;
    let params = fetch_parameters(&mut client).await?;

    let start = Instant::now();
    let outcome = match cli.command {
        Commands::Register { user, password } => {
            let password = Zeroizing::new(password);
            let prover = Prover::from_password(params, password.as_bytes());
            let result = register(&mut client, &prover, &user).await;

            Outcome {
                operation: "register",
                user,
                success: result.is_ok(),
                session_id: None,
                error: result.err().map(ErrorReport::from),
                elapsed_ms: start.elapsed().as_millis(),
            }
        }

        Commands::Login { user, password } => {
            let password = Zeroizing::new(password);
            let prover = Prover::from_password(params, password.as_bytes());
            let result = login(&mut client, &prover, &user).await;

            let (session_id, error) = match result {
                Ok(session_id) => (Some(session_id), None),
                Err(status) => (None, Some(ErrorReport::from(status))),
            };

            Outcome {
                operation: "login",
                user,
                success: session_id.is_some(),
                session_id,
                error,
                elapsed_ms: start.elapsed().as_millis(),
            }
        }
    };

    println!("{}", serde_json::to_string_pretty(&outcome)?);

    if !outcome.success {
        std::process::exit(1);
    }

    Ok(())
}
