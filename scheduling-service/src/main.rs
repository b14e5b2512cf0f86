use axum::{
    Json, Router,
    routing::{get, patch, post},
};
use scheduling_service::{
    api::{
        handler::{employee, forecast, labor, optimizer, schedule, shift, swap},
        state::SchedulingAppState,
    },
    config::SchedulingConfig,
    domain::{
        compliance::ComplianceEngine, forecaster::ForecastService, labor::LaborPlanner,
        lifecycle::ShiftLifecycleService, optimizer::ScheduleOptimizer, swap::SwapService,
        workforce::WorkforceClient,
    },
    infrastructure::{
        circuit_breaker::CircuitBreakerClient,
        client::HttpWorkforceClient,
        forecast::PgForecastRepository,
        health_check::{HealthCheckConfig, spawn_health_check},
        labor::PgLaborStandardsRepository,
        notification::PgNotificationRepository,
        schedule::{PgScheduleRepository, PgShiftRepository},
        swap::PgSwapRepository,
    },
};
use sqlx::postgres::PgPoolOptions;
use std::{env, net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tower_governor::{
    GovernorLayer, governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor,
};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        forecast::generate,
        forecast::day,
        forecast::import_historical,
        forecast::update_actuals,
        forecast::accuracy,
        labor::hourly_requirements,
        labor::weekly_summary,
        labor::staffing_estimate,
        optimizer::generate,
        optimizer::apply,
        optimizer::templates,
        schedule::get,
        schedule::compliance,
        schedule::publish,
        schedule::unpublish,
        schedule::delete,
        shift::create,
        shift::update,
        shift::delete,
        shift::compliance,
        shift::callout,
        shift::replacements,
        shift::assign_replacement,
        shift::revert_callout,
        employee::compliance_status,
        swap::create,
        swap::get,
        swap::accept,
        swap::approve,
        swap::deny,
        swap::cancel,
    ),
    tags(
        (name = "Forecasts", description = "Demand forecasting"),
        (name = "Labor", description = "Labor standards and staffing requirements"),
        (name = "Optimizer", description = "Constraint-based schedule generation"),
        (name = "Schedules", description = "Schedule lifecycle"),
        (name = "Shifts", description = "Shift mutations, call-outs and coverage"),
        (name = "Compliance", description = "Labor-rule validation"),
        (name = "Swaps", description = "Shift swap state machine"),
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    let _guard = shared::telemetry::init_telemetry("scheduling-service");

    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let port = env::var("SERVER_PORT").unwrap_or_else(|_| "8081".to_string());
    let workforce_url =
        env::var("WORKFORCE_SERVICE_URL").unwrap_or_else(|_| "http://localhost:8080".to_string());
    let config_path =
        env::var("SCHEDULING_CONFIG_PATH").unwrap_or_else(|_| "scheduling.toml".to_string());
    let config = SchedulingConfig::load(&config_path).expect("Failed to load scheduling config");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to establish connection into Postgres");

    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    // Workforce client behind a circuit breaker; the health check force-
    // closes the breaker when the peer recovers.
    let http_client = Arc::new(HttpWorkforceClient::new(workforce_url.clone()));
    let (breaker_client, breaker) =
        CircuitBreakerClient::new(http_client, config.circuit_breaker.clone());
    let workforce: Arc<dyn WorkforceClient> = Arc::new(breaker_client);

    let task_tracker = TaskTracker::new();
    let cancel_token = CancellationToken::new();
    spawn_health_check(
        HealthCheckConfig::from_settings(&config.health_check, &workforce_url),
        breaker,
        &task_tracker,
        cancel_token.clone(),
    );

    let forecast_repo = Arc::new(PgForecastRepository::new(pool.clone()));
    let standards_repo = Arc::new(PgLaborStandardsRepository::new(pool.clone()));
    let schedule_repo = Arc::new(PgScheduleRepository::new(pool.clone()));
    let shift_repo = Arc::new(PgShiftRepository::new(pool.clone()));
    let swap_repo = Arc::new(PgSwapRepository::new(pool.clone()));
    let notification_repo = Arc::new(PgNotificationRepository::new(pool.clone()));

    let forecasts = Arc::new(ForecastService::new(
        workforce.clone(),
        forecast_repo.clone(),
        &config,
    ));
    let labor = Arc::new(LaborPlanner::new(
        workforce.clone(),
        standards_repo,
        forecast_repo,
        forecasts.clone(),
        &config,
    ));
    let compliance = Arc::new(ComplianceEngine::new(
        shift_repo.clone(),
        schedule_repo.clone(),
        workforce.clone(),
        &config,
    ));
    let optimizer = Arc::new(ScheduleOptimizer::new(
        workforce.clone(),
        labor.clone(),
        schedule_repo.clone(),
        shift_repo.clone(),
        &config,
    ));
    let lifecycle = Arc::new(ShiftLifecycleService::new(
        schedule_repo,
        shift_repo.clone(),
        workforce.clone(),
        compliance.clone(),
        notification_repo.clone(),
    ));
    let swaps = Arc::new(SwapService::new(
        swap_repo,
        shift_repo,
        notification_repo,
        &config,
    ));

    let state = Arc::new(SchedulingAppState {
        forecasts,
        labor,
        compliance,
        optimizer,
        lifecycle,
        swaps,
        config,
    });

    let governor_conf = GovernorConfigBuilder::default()
        .per_second(2)
        .burst_size(10)
        .key_extractor(SmartIpKeyExtractor)
        .use_headers()
        .finish()
        .expect("Failed to build governor config");

    let app = Router::new()
        .route(
            "/healthz",
            get(|| async { Json(shared::responses::HealthResponse::up("scheduling-service")) }),
        )
        // Forecasts
        .route("/api/v1/forecasts/generate", post(forecast::generate))
        .route("/api/v1/forecasts/day", get(forecast::day))
        .route(
            "/api/v1/forecasts/historical",
            post(forecast::import_historical),
        )
        .route("/api/v1/forecasts/actuals", patch(forecast::update_actuals))
        .route("/api/v1/forecasts/accuracy", get(forecast::accuracy))
        // Labor standards bridge
        .route(
            "/api/v1/labor/requirements",
            get(labor::hourly_requirements),
        )
        .route("/api/v1/labor/weekly-summary", get(labor::weekly_summary))
        .route(
            "/api/v1/labor/staffing-estimate",
            get(labor::staffing_estimate),
        )
        // Optimizer
        .route("/api/v1/optimizer/generate", post(optimizer::generate))
        .route("/api/v1/optimizer/apply", post(optimizer::apply))
        .route("/api/v1/optimizer/templates", get(optimizer::templates))
        // Schedules
        .route(
            "/api/v1/schedules/{id}",
            get(schedule::get).delete(schedule::delete),
        )
        .route("/api/v1/schedules/{id}/compliance", get(schedule::compliance))
        .route("/api/v1/schedules/{id}/publish", post(schedule::publish))
        .route("/api/v1/schedules/{id}/unpublish", post(schedule::unpublish))
        // Shifts
        .route("/api/v1/shifts", post(shift::create))
        .route(
            "/api/v1/shifts/{id}",
            patch(shift::update).delete(shift::delete),
        )
        .route("/api/v1/shifts/{id}/compliance", get(shift::compliance))
        .route("/api/v1/shifts/{id}/callout", post(shift::callout))
        .route("/api/v1/shifts/{id}/replacements", get(shift::replacements))
        .route(
            "/api/v1/shifts/{id}/assign-replacement",
            post(shift::assign_replacement),
        )
        .route(
            "/api/v1/shifts/{id}/revert-callout",
            post(shift::revert_callout),
        )
        // Employee compliance status
        .route(
            "/api/v1/employees/{id}/compliance-status",
            get(employee::compliance_status),
        )
        // Swaps
        .route("/api/v1/swaps", post(swap::create))
        .route("/api/v1/swaps/{id}", get(swap::get))
        .route("/api/v1/swaps/{id}/accept", post(swap::accept))
        .route("/api/v1/swaps/{id}/approve", post(swap::approve))
        .route("/api/v1/swaps/{id}/deny", post(swap::deny))
        .route("/api/v1/swaps/{id}/cancel", post(swap::cancel))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Rate limiting (per-IP, 2 req/s with burst of 10)
        .layer(GovernorLayer::new(governor_conf))
        // tracing log (turn request into info level)
        .layer(
            TraceLayer::new_for_http()
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(tower_http::LatencyUnit::Millis),
                ),
        )
        .with_state(state);

    tracing::info!("scheduling-service listening on 0.0.0.0:{port}");

    let listener = TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("Failed to bind");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shared::shutdown::shutdown_signal())
    .await
    .expect("Server crashed");

    // Stop the health check and wait for background tasks to drain
    cancel_token.cancel();
    task_tracker.close();
    tracing::info!("Waiting for background tasks to finish...");
    if tokio::time::timeout(shared::shutdown::DEFAULT_SHUTDOWN_TIMEOUT, task_tracker.wait())
        .await
        .is_err()
    {
        tracing::warn!("Shutdown timeout reached, some background tasks may not have finished");
    }
    tracing::info!("scheduling-service shut down");
}
