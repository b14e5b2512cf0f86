use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::domain::circuit_breaker::CircuitBreaker;

/// Serializable health check settings, typically loaded from the scheduling
/// config file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HealthCheckSettings {
    pub interval_secs: u64,
    pub timeout_secs: u64,
}

impl Default for HealthCheckSettings {
    fn default() -> Self {
        Self {
            interval_secs: 10,
            timeout_secs: 5,
        }
    }
}

/// Resolved health check configuration with concrete `Duration` values and
/// the full endpoint URL.
pub struct HealthCheckConfig {
    pub interval: Duration,
    pub health_endpoint: String,
    pub timeout: Duration,
}

impl HealthCheckConfig {
    /// Converts serializable settings into a resolved config using the
    /// workforce service base URL.
    pub fn from_settings(settings: &HealthCheckSettings, workforce_url: &str) -> Self {
        Self {
            interval: Duration::from_secs(settings.interval_secs),
            health_endpoint: format!("{workforce_url}/healthz"),
            timeout: Duration::from_secs(settings.timeout_secs),
        }
    }
}

/// Spawns a periodic health check task that pings the workforce service.
///
/// When the peer recovers after an outage, the health check force-closes the
/// circuit breaker so the next scheduling request goes through immediately
/// instead of waiting out the cooldown.
///
/// # Panics
///
/// Panics if the HTTP client cannot be built.
pub fn spawn_health_check(
    config: HealthCheckConfig,
    breaker: Arc<Mutex<CircuitBreaker>>,
    task_tracker: &TaskTracker,
    cancel_token: CancellationToken,
) {
    let client = Client::builder()
        .timeout(config.timeout)
        .build()
        .expect("Failed to build health check HTTP client");

    tracing::info!(
        endpoint = %config.health_endpoint,
        interval_secs = config.interval.as_secs(),
        "Starting workforce service health check"
    );

    task_tracker.spawn(async move {
        let mut interval = tokio::time::interval(config.interval);

        loop {
            tokio::select! {
                () = cancel_token.cancelled() => {
                    tracing::info!("Health check task shutting down");
                    break;
                }
                _ = interval.tick() => {
                    check_health(&client, &config.health_endpoint, &breaker).await;
                }
            }
        }
    });
}

async fn check_health(client: &Client, endpoint: &str, breaker: &Arc<Mutex<CircuitBreaker>>) {
    match client.get(endpoint).send().await {
        Ok(res) if res.status().is_success() => {
            tracing::debug!("Workforce service health check passed");
            breaker.lock().await.force_close();
        }
        Ok(res) => {
            tracing::warn!(
                status = %res.status(),
                "Workforce service health check returned non-success"
            );
            breaker.lock().await.record_failure();
        }
        Err(e) => {
            tracing::warn!(error = %e, "Workforce service health check failed");
            breaker.lock().await.record_failure();
        }
    }
}
