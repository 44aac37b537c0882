use std::sync::Arc;
use std::time::Duration;

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, Method};
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clinic_dialog::adapters::{
    dialog_router, DialogAppState, FileRulesProvider, HttpBookingClient, HttpBookingConfig,
    OpenAiInterpreter, OpenAiInterpreterConfig, RedisSessionStore, TracingModeratorNotifier,
};
use clinic_dialog::application::DialogOrchestrator;
use clinic_dialog::config::AppConfig;
use clinic_dialog::domain::scenes::SceneServices;
use clinic_dialog::ports::StepInterpreter;

#[tokio::main]
async fn main() {
    let config = AppConfig::load().expect("Failed to load configuration");
    config.validate().expect("Invalid configuration");

    init_tracing(&config);
    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        "Loaded configuration"
    );

    // --- Redis ---
    let redis_client =
        redis::Client::open(config.redis.url.as_str()).expect("Invalid Redis URL");
    let redis_connection = redis_client
        .get_multiplexed_tokio_connection()
        .await
        .expect("Failed to connect to Redis");
    tracing::info!("Redis connection established");

    let sessions = Arc::new(RedisSessionStore::new(
        redis_connection,
        Duration::from_secs(config.redis.session_ttl_secs),
    ));

    // --- Booking CRM ---
    let booking = Arc::new(HttpBookingClient::new(HttpBookingConfig::from_config(
        &config.crm,
    )));

    // --- Clinic rules ---
    let rules = Arc::new(FileRulesProvider::new(config.rules.path.clone()));
    if config.rules.is_configured() {
        tracing::info!(path = ?config.rules.path, "Clinic rules file configured");
    } else {
        tracing::info!("No clinic rules file, slot engine runs in fallback mode");
    }

    // --- Step interpreter (optional) ---
    let mut services = SceneServices::new(booking, rules);
    if let Some(interpreter_config) = OpenAiInterpreterConfig::from_config(&config.interpreter) {
        let interpreter: Arc<dyn StepInterpreter> =
            Arc::new(OpenAiInterpreter::new(interpreter_config));
        services = services.with_interpreter(interpreter);
        tracing::info!(model = %config.interpreter.model, "Step interpreter enabled");
    } else {
        tracing::info!("Step interpreter disabled, raw replies are taken verbatim");
    }

    let orchestrator = Arc::new(DialogOrchestrator::new(
        sessions,
        services,
        Arc::new(TracingModeratorNotifier::new()),
    ));

    // --- Router ---
    let request_id_header = HeaderName::from_static("x-request-id");
    let app = dialog_router()
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(build_cors_layer(&config))
        .with_state(DialogAppState { orchestrator });

    // --- Serve ---
    let addr = config.server.socket_addr();
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.server.log_level.clone().into());

    if config.is_production() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn build_cors_layer(config: &AppConfig) -> CorsLayer {
    let origins = config.server.cors_origins_list();
    if origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([CONTENT_TYPE]);
    }

    let origins: Vec<_> = origins
        .iter()
        .map(|o| {
            o.parse()
                .unwrap_or_else(|e| panic!("Invalid CORS origin '{o}': {e}"))
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE])
}

/// Wait for SIGINT or SIGTERM so the server can drain in-flight turns.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT, shutting down");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, shutting down");
        }
    }
}
