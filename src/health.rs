//! Health and metrics endpoints. Both report from the in-process metrics
//! snapshot; neither touches the external model service, so they stay cheap
//! enough for load-balancer probes.

use crate::state::AppState;
use actix_web::{web, HttpResponse};
use serde_json::json;

pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let metrics = state.get_metrics_snapshot();
    let config = &state.config;
    let uptime_seconds = state.get_uptime_seconds();

    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": uptime_seconds,
        "service": {
            "name": "studybridge-backend",
            "version": env!("CARGO_PKG_VERSION"),
            "host": config.server.host,
            "port": config.server.port
        },
        "metrics": {
            "total_requests": metrics.request_count,
            "total_errors": metrics.error_count,
            "error_rate": if metrics.request_count > 0 {
                metrics.error_count as f64 / metrics.request_count as f64
            } else {
                0.0
            },
            "active_transcriptions": metrics.active_transcriptions
        },
        "model": {
            "name": config.gemini.model,
            "api_key_configured": !config.gemini.api_key.is_empty()
        },
        "storage": storage_status(&state)
    }))
}

pub async fn detailed_metrics(state: web::Data<AppState>) -> HttpResponse {
    let metrics = state.get_metrics_snapshot();
    let uptime_seconds = state.get_uptime_seconds();

    let mut endpoint_stats = Vec::new();
    for (endpoint, metric) in metrics.endpoint_metrics.iter() {
        endpoint_stats.push(json!({
            "endpoint": endpoint,
            "request_count": metric.request_count,
            "error_count": metric.error_count,
            "error_rate": metric.error_rate(),
            "average_duration_ms": metric.average_duration_ms(),
            "total_duration_ms": metric.total_duration_ms
        }));
    }

    HttpResponse::Ok().json(json!({
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": uptime_seconds,
        "overall": {
            "total_requests": metrics.request_count,
            "total_errors": metrics.error_count,
            "error_rate": if metrics.request_count > 0 {
                metrics.error_count as f64 / metrics.request_count as f64
            } else {
                0.0
            },
            "active_transcriptions": metrics.active_transcriptions,
            "requests_per_second": if uptime_seconds > 0 {
                metrics.request_count as f64 / uptime_seconds as f64
            } else {
                0.0
            }
        },
        "endpoints": endpoint_stats,
        "storage": storage_status(&state)
    }))
}

/// Transient-storage snapshot: whether the directory exists yet and how many
/// artifacts are currently parked in it. The directory is created lazily on
/// first acquisition, so "absent" is a normal state for a fresh server.
fn storage_status(state: &AppState) -> serde_json::Value {
    let dir = state.videos.transient_dir();
    let artifact_count = std::fs::read_dir(dir)
        .map(|entries| entries.count())
        .ok();

    json!({
        "transient_dir": dir.display().to_string(),
        "exists": dir.is_dir(),
        "artifact_count": artifact_count,
        "max_download_mib": state.config.storage.max_download_mib,
        "cookie_file_configured": state.config.storage.cookie_file.is_some()
    })
}
