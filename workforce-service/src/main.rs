use axum::{
    Json, Router,
    routing::{get, patch, post},
};
use sqlx::postgres::PgPoolOptions;
use std::{env, sync::Arc};
use tokio::net::TcpListener;
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use workforce_service::{
    api::{
        handler::{availability, context, employee, store, time_off},
        state::WorkforceAppState,
    },
    domain::context::ContextService,
    infrastructure::{
        availability::PgAvailabilityRepository,
        cache::{
            client::RedisCache,
            context::CachedContextProvider,
            store::CachedStoreRepository,
            workforce::{
                InvalidatingAvailabilityRepository, InvalidatingEmployeeRepository,
                InvalidatingTimeOffRepository,
            },
        },
        employee::PgEmployeeRepository,
        store::PgStoreRepository,
        time_off::PgTimeOffRepository,
    },
};

#[derive(OpenApi)]
#[openapi(
    paths(
        store::find_all,
        store::find_by_id,
        store::create,
        store::update,
        context::scheduling_context,
        employee::find_all,
        employee::find_by_id,
        employee::create,
        employee::update,
        employee::deactivate,
        availability::for_employee,
        availability::replace,
        time_off::create,
        time_off::for_employee,
        time_off::approve,
        time_off::deny,
        time_off::cancel,
    ),
    tags(
        (name = "Stores", description = "Store management and scheduling context"),
        (name = "Employees", description = "Employee roster management"),
        (name = "Availability", description = "Weekly availability preferences"),
        (name = "TimeOff", description = "Time off requests and decisions"),
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    let _guard = shared::telemetry::init_telemetry("workforce-service");

    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let port = env::var("SERVER_PORT").unwrap_or_else(|_| "8080".to_string());

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to establish connection into Postgres");

    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    let redis_url = env::var("REDIS_URL").expect("REDIS_URL must be set");
    let cache = RedisCache::new(&redis_url)
        .await
        .expect("Failed to connect to Redis");

    let store_repo = Arc::new(CachedStoreRepository::new(
        Arc::new(PgStoreRepository::new(pool.clone())),
        cache.clone(),
    ));
    let employee_repo = Arc::new(InvalidatingEmployeeRepository::new(
        Arc::new(PgEmployeeRepository::new(pool.clone())),
        cache.clone(),
    ));
    let availability_repo = Arc::new(InvalidatingAvailabilityRepository::new(
        Arc::new(PgAvailabilityRepository::new(pool.clone())),
        cache.clone(),
    ));
    let time_off_repo = Arc::new(InvalidatingTimeOffRepository::new(
        Arc::new(PgTimeOffRepository::new(pool.clone())),
        cache.clone(),
    ));
    let context = Arc::new(CachedContextProvider::new(
        Arc::new(ContextService::new(
            store_repo.clone(),
            employee_repo.clone(),
            availability_repo.clone(),
            time_off_repo.clone(),
        )),
        cache,
    ));

    let state = Arc::new(WorkforceAppState {
        store_repo,
        employee_repo,
        availability_repo,
        time_off_repo,
        context,
    });

    let app = Router::new()
        .route(
            "/healthz",
            get(|| async { Json(shared::responses::HealthResponse::up("workforce-service")) }),
        )
        // Store routes
        .route("/api/v1/stores", get(store::find_all).post(store::create))
        .route(
            "/api/v1/stores/{id}",
            get(store::find_by_id).put(store::update),
        )
        .route(
            "/api/v1/stores/{id}/scheduling-context",
            get(context::scheduling_context),
        )
        // Employee routes
        .route(
            "/api/v1/employees",
            get(employee::find_all).post(employee::create),
        )
        .route(
            "/api/v1/employees/{id}",
            get(employee::find_by_id).put(employee::update),
        )
        .route(
            "/api/v1/employees/{id}/deactivate",
            patch(employee::deactivate),
        )
        // Availability routes
        .route(
            "/api/v1/employees/{id}/availability",
            get(availability::for_employee).put(availability::replace),
        )
        // Time off routes
        .route("/api/v1/time-off", post(time_off::create))
        .route(
            "/api/v1/employees/{id}/time-off",
            get(time_off::for_employee),
        )
        .route("/api/v1/time-off/{id}/approve", patch(time_off::approve))
        .route("/api/v1/time-off/{id}/deny", patch(time_off::deny))
        .route("/api/v1/time-off/{id}/cancel", patch(time_off::cancel))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
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

    tracing::info!("workforce-service listening on 0.0.0.0:{port}");

    let listener = TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("Failed to bind");

    axum::serve(listener, app)
        .with_graceful_shutdown(shared::shutdown::shutdown_signal())
        .await
        .expect("Server crashed");

    tracing::info!("workforce-service shut down");
}
