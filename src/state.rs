//! # Application State Management
//!
//! Shared state handed to every HTTP request handler. The configuration is
//! immutable after startup (plain `Arc`); only the metrics need interior
//! mutability, guarded by an `RwLock` so concurrent requests can read while
//! the middleware takes brief write locks to bump counters.
//!
//! Cloning `AppState` is cheap — every field is an `Arc` or `Copy` — which is
//! exactly what actix-web's per-worker `app_data` wants.

use crate::config::AppConfig;
use crate::gemini::GeminiClient;
use crate::video::VideoStore;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Instant;

/// The main application state shared across all HTTP request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration, fixed for the process lifetime.
    pub config: Arc<AppConfig>,

    /// Performance metrics, updated by the middleware on every request.
    pub metrics: Arc<RwLock<AppMetrics>>,

    /// Video artifact store rooted at the configured transient directory.
    pub videos: Arc<VideoStore>,

    /// Client for the external generative-model service.
    pub gemini: Arc<GeminiClient>,

    /// When the server started (for uptime reporting).
    pub start_time: Instant,
}

/// Performance metrics collected across all HTTP requests.
#[derive(Debug, Default)]
pub struct AppMetrics {
    /// Total number of HTTP requests processed since server start
    pub request_count: u64,

    /// Total number of errors encountered since server start
    pub error_count: u64,

    /// Transcription pipelines currently in flight
    pub active_transcriptions: u32,

    /// Per-endpoint statistics, keyed by "METHOD /path"
    pub endpoint_metrics: HashMap<String, EndpointMetric>,
}

/// Detailed performance metrics for a specific API endpoint.
#[derive(Debug, Default, Clone)]
pub struct EndpointMetric {
    pub request_count: u64,
    pub total_duration_ms: u64,
    pub error_count: u64,
}

impl AppState {
    /// Create a new AppState from a validated configuration.
    pub fn new(config: AppConfig) -> Self {
        let config = Arc::new(config);
        Self {
            videos: Arc::new(VideoStore::new(&config.storage)),
            gemini: Arc::new(GeminiClient::new(&config.gemini)),
            config,
            metrics: Arc::new(RwLock::new(AppMetrics::default())),
            start_time: Instant::now(),
        }
    }

    /// Increment the total request counter (called by middleware for every request).
    pub fn increment_request_count(&self) {
        let mut metrics = self.metrics.write().unwrap();
        metrics.request_count += 1;
    }

    /// Increment the total error counter (called when any request fails).
    pub fn increment_error_count(&self) {
        let mut metrics = self.metrics.write().unwrap();
        metrics.error_count += 1;
    }

    /// Record detailed metrics for a specific endpoint.
    pub fn record_endpoint_request(&self, endpoint: &str, duration_ms: u64, is_error: bool) {
        let mut metrics = self.metrics.write().unwrap();

        let endpoint_metric = metrics
            .endpoint_metrics
            .entry(endpoint.to_string())
            .or_default();

        endpoint_metric.request_count += 1;
        endpoint_metric.total_duration_ms += duration_ms;

        if is_error {
            endpoint_metric.error_count += 1;
        }
    }

    /// Mark a transcription pipeline as started.
    pub fn increment_active_transcriptions(&self) {
        let mut metrics = self.metrics.write().unwrap();
        metrics.active_transcriptions += 1;
    }

    /// Mark a transcription pipeline as finished (success or failure).
    pub fn decrement_active_transcriptions(&self) {
        let mut metrics = self.metrics.write().unwrap();
        if metrics.active_transcriptions > 0 {
            metrics.active_transcriptions -= 1;
        }
    }

    /// Get a snapshot of current metrics (used by the /metrics endpoint).
    ///
    /// Clones under a read lock so serialization happens without holding it.
    pub fn get_metrics_snapshot(&self) -> AppMetrics {
        let metrics = self.metrics.read().unwrap();
        AppMetrics {
            request_count: metrics.request_count,
            error_count: metrics.error_count,
            active_transcriptions: metrics.active_transcriptions,
            endpoint_metrics: metrics.endpoint_metrics.clone(),
        }
    }

    /// Get server uptime in seconds.
    pub fn get_uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

impl EndpointMetric {
    /// Average response time for this endpoint in milliseconds.
    pub fn average_duration_ms(&self) -> f64 {
        if self.request_count > 0 {
            self.total_duration_ms as f64 / self.request_count as f64
        } else {
            0.0
        }
    }

    /// Error rate for this endpoint as a fraction in [0.0, 1.0].
    pub fn error_rate(&self) -> f64 {
        if self.request_count > 0 {
            self.error_count as f64 / self.request_count as f64
        } else {
            0.0
        }
    }
}
