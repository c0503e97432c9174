//! # StudyBridge Backend - Main Application Entry Point
//!
//! Actix-web HTTP server for an accessibility-oriented content platform:
//! students upload or link videos, the server transcribes them through an
//! external generative-model service, and a set of transformation endpoints
//! simplify, translate, and quiz on content.
//!
//! ## Application Architecture:
//! - **config**: layered configuration (TOML file + environment variables)
//! - **state**: shared application state (immutable config, metrics, stores)
//! - **error**: error taxonomy and JSON error responses
//! - **video**: transient video storage, upload and remote download
//! - **gemini**: client for the external generative-model service
//! - **transcription**: the submit/poll/fetch/parse/cleanup pipeline
//! - **transcript / readability**: the pure parsing and scoring functions
//! - **handlers**: HTTP endpoints
//! - **middleware / health**: request telemetry and monitoring endpoints

mod config;
mod error;
mod gemini;
mod handlers;
mod health;
mod middleware;
mod prompts;
mod readability;
mod state;
mod transcript;
mod transcription;
mod video;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::Result;
use config::AppConfig;
use state::AppState;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Global shutdown signal, set by the signal-handler task and observed by the
/// main select loop for graceful shutdown.
static SHUTDOWN_SIGNAL: AtomicBool = AtomicBool::new(false);

#[actix_web::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    init_tracing()?;

    let config = AppConfig::load()?;
    config.validate()?;

    info!("Starting studybridge-backend v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded: {}:{}", config.server.host, config.server.port);
    info!("Transient video storage: {}", config.storage.transient_dir);

    let app_state = AppState::new(config.clone());
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);

    setup_signal_handlers();

    info!("Starting HTTP server on {}", bind_addr);

    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(cors)
            .wrap(middleware::Telemetry)
            .service(
                web::scope("/api/v1")
                    .route("/", web::get().to(handlers::root))
                    .route("/health", web::get().to(health::health_check))
                    .route("/metrics", web::get().to(health::detailed_metrics))
                    // Video pipeline
                    .route("/upload-video", web::post().to(handlers::video::upload_video))
                    .route("/process-youtube", web::post().to(handlers::video::process_youtube))
                    .route("/transcribe-video", web::post().to(handlers::video::transcribe_video))
                    .route("/video-file/{video_id}", web::get().to(handlers::video::video_file))
                    // Content transformations
                    .route("/simplify-content", web::post().to(handlers::transform::simplify_content))
                    .route("/generate-study-aids", web::post().to(handlers::transform::generate_study_aids))
                    .route("/translate-content", web::post().to(handlers::transform::translate_content))
                    .route("/describe-image", web::post().to(handlers::transform::describe_image))
                    .route("/tutor-chat", web::post().to(handlers::transform::tutor_chat)),
            )
            // Health check at root level for load balancers
            .route("/health", web::get().to(health::health_check))
    })
    .bind(&bind_addr)?
    .run();

    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    tokio::select! {
        result = server_task => {
            match result {
                Ok(server_result) => {
                    if let Err(e) = server_result {
                        error!("Server error: {}", e);
                    }
                }
                Err(e) => {
                    error!("Server task error: {}", e);
                }
            }
        }
        _ = wait_for_shutdown() => {
            info!("Shutdown signal received, stopping server...");
            server_handle.stop(true).await;
        }
    }

    info!("Server stopped gracefully");
    Ok(())
}

/// Initialize structured logging. `RUST_LOG` controls the filter; the default
/// keeps this crate at debug and actix at info.
fn init_tracing() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "studybridge_backend=debug,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    Ok(())
}

/// Listen for SIGTERM/SIGINT and flip the shutdown flag so in-flight requests
/// can drain before the process exits.
fn setup_signal_handlers() {
    tokio::spawn(async {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler");
        let mut sigint = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())
            .expect("Failed to install SIGINT handler");

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT");
            }
        }

        SHUTDOWN_SIGNAL.store(true, Ordering::SeqCst);
    });
}

/// Poll the shutdown flag without busy-waiting.
async fn wait_for_shutdown() {
    while !SHUTDOWN_SIGNAL.load(Ordering::SeqCst) {
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
    }
}
