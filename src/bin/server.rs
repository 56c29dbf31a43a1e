use std::time::Duration;

use chaum_pedersen_auth::proto::auth_server::AuthServer;
use chaum_pedersen_auth::verifier::config::GroupPreset;
use chaum_pedersen_auth::verifier::{AuthServiceImpl, ServerConfig};
use chaum_pedersen_auth::{AuthenticationService, CredentialStore, SessionStore};
use clap::Parser;
use tokio::{signal, time};
use tonic::transport::Server;
use tonic_health::server::{health_reporter, HealthReporter};
use tracing::{debug, error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser, Debug)]
#[command(name = "server")]
#[command(about = "Chaum-Pedersen password authentication server", long_about = None)]
#[command(version)]
struct Args {
    /// Host to bind to (overrides configuration)
    #[arg(short = 'H', long, env = "SERVER_HOST")]
    host: Option<String>,

    /// Port to listen on (overrides configuration)
    #[arg(short, long, env = "SERVER_PORT")]
    port: Option<u16>,

    /// Group parameters: rfc5114, safe-prime-256, generate, or custom
    #[arg(short, long, value_parser = parse_preset)]
    group: Option<GroupPreset>,

    /// Modulus width when generating parameters
    #[arg(long)]
    bits: Option<u64>,

    /// Enable the Prometheus metrics endpoint
    #[arg(long)]
    metrics: bool,
}

fn parse_preset(value: &str) -> Result<GroupPreset, String> {
    match value {
        "rfc5114" => Ok(GroupPreset::Rfc5114),
        "safe-prime-256" => Ok(GroupPreset::SafePrime256),
        "generate" => Ok(GroupPreset::Generate),
        "custom" => Ok(GroupPreset::Custom),
        other => Err(format!("unknown group preset '{other}'")),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = ServerConfig::from_env().unwrap_or_else(|e| {
        error!("Failed to load configuration: {e}");
        info!("Using default configuration");
        ServerConfig::default()
    });

    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(preset) = args.group {
        config.group.preset = preset;
    }
    if let Some(bits) = args.bits {
        config.group.bits = bits;
    }
    config.metrics.enabled |= args.metrics;

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {e}");
        return Err(format!("Invalid configuration: {e}").into());
    }

    let params = config.group.build_parameters().map_err(|e| {
        error!("Failed to initialize group parameters: {e}");
        e
    })?;
    info!(
        preset = ?config.group.preset,
        p_bits = params.p().bits(),
        q_bits = params.q().bits(),
        "Group parameters ready"
    );

    let credentials = CredentialStore::new();
    let sessions =
        SessionStore::with_capacity(config.sessions.ttl(), config.sessions.max_pending);
    let auth = AuthenticationService::with_stores(params, credentials.clone(), sessions.clone());
    let service = AuthServiceImpl::new(auth);

    let cleanup_interval = config.sessions.cleanup_interval();
    tokio::spawn(async move {
        let mut interval = time::interval(cleanup_interval);
        loop {
            interval.tick().await;
            let purged = sessions.purge_expired();
            if purged > 0 {
                debug!(purged, "Removed expired challenge sessions");
            }
            debug!(
                users = credentials.len(),
                pending = sessions.len(),
                "State summary"
            );
        }
    });

    if config.metrics.enabled {
        let metrics_addr = config.metrics.addr()?;
        match metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(metrics_addr)
            .install()
        {
            Ok(()) => info!("Metrics server started on {metrics_addr}"),
            Err(e) => error!("Failed to start metrics server: {e}"),
        }
    }

    let (mut health_reporter, health_service) = health_reporter();
    health_reporter
        .set_serving::<AuthServer<AuthServiceImpl>>()
        .await;

    let addr = config.addr()?;
    info!(
        %addr,
        session_ttl_secs = config.sessions.ttl_secs,
        max_pending = config.sessions.max_pending,
        metrics = config.metrics.enabled,
        "Server starting"
    );

    Server::builder()
        .add_service(health_service)
        .add_service(AuthServer::new(service))
        .serve_with_shutdown(addr, shutdown_signal(health_reporter))
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal(mut health_reporter: HealthReporter) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }

    health_reporter
        .set_not_serving::<AuthServer<AuthServiceImpl>>()
        .await;

    info!("Initiating graceful shutdown (allowing in-flight requests to complete)");

    tokio::time::sleep(Duration::from_secs(2)).await;
}
