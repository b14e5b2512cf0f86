use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
    routing::{get, post},
};
use chrono::{NaiveDate, NaiveTime, Utc};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use scheduling_service::{
    api::{
        handler::{employee, forecast, optimizer, shift, swap},
        state::SchedulingAppState,
    },
    config::SchedulingConfig,
    domain::{
        compliance::ComplianceEngine,
        forecast::MockForecastRepository,
        forecaster::ForecastService,
        labor::{LaborPlanner, MockLaborStandardsRepository},
        lifecycle::ShiftLifecycleService,
        notification::MockNotificationRepository,
        optimizer::ScheduleOptimizer,
        schedule::{MockScheduleRepository, MockShiftRepository},
        swap::{MockSwapRepository, SwapService},
        workforce::MockWorkforceClient,
    },
};
use shared::types::{Shift, ShiftStatus, Store};

struct Mocks {
    workforce: MockWorkforceClient,
    forecast_repo: MockForecastRepository,
    standards_repo: MockLaborStandardsRepository,
    schedule_repo: MockScheduleRepository,
    shift_repo: MockShiftRepository,
    swap_repo: MockSwapRepository,
    notifications: MockNotificationRepository,
    // Separate instances for collaborators that hold their own handles
    compliance_workforce: MockWorkforceClient,
    compliance_schedule_repo: MockScheduleRepository,
    compliance_shift_repo: MockShiftRepository,
    forecaster_workforce: MockWorkforceClient,
    forecaster_repo: MockForecastRepository,
}

impl Default for Mocks {
    fn default() -> Self {
        Self {
            workforce: MockWorkforceClient::new(),
            forecast_repo: MockForecastRepository::new(),
            standards_repo: MockLaborStandardsRepository::new(),
            schedule_repo: MockScheduleRepository::new(),
            shift_repo: MockShiftRepository::new(),
            swap_repo: MockSwapRepository::new(),
            notifications: MockNotificationRepository::new(),
            compliance_workforce: MockWorkforceClient::new(),
            compliance_schedule_repo: MockScheduleRepository::new(),
            compliance_shift_repo: MockShiftRepository::new(),
            forecaster_workforce: MockWorkforceClient::new(),
            forecaster_repo: MockForecastRepository::new(),
        }
    }
}

fn build_test_app(mocks: Mocks) -> Router {
    let config = SchedulingConfig::default();

    let workforce = Arc::new(mocks.workforce);
    let shift_repo = Arc::new(mocks.shift_repo);
    let schedule_repo = Arc::new(mocks.schedule_repo);
    let notifications = Arc::new(mocks.notifications);

    let forecasts = Arc::new(ForecastService::new(
        Arc::new(mocks.forecaster_workforce),
        Arc::new(mocks.forecaster_repo),
        &config,
    ));
    let labor = Arc::new(LaborPlanner::new(
        workforce.clone(),
        Arc::new(mocks.standards_repo),
        Arc::new(mocks.forecast_repo),
        forecasts.clone(),
        &config,
    ));
    let compliance = Arc::new(ComplianceEngine::new(
        Arc::new(mocks.compliance_shift_repo),
        Arc::new(mocks.compliance_schedule_repo),
        Arc::new(mocks.compliance_workforce),
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
        notifications.clone(),
    ));
    let swaps = Arc::new(SwapService::new(
        Arc::new(mocks.swap_repo),
        shift_repo,
        notifications,
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

    Router::new()
        .route("/api/v1/forecasts/generate", post(forecast::generate))
        .route("/api/v1/optimizer/templates", get(optimizer::templates))
        .route("/api/v1/shifts/{id}/callout", post(shift::callout))
        .route(
            "/api/v1/employees/{id}/compliance-status",
            get(employee::compliance_status),
        )
        .route("/api/v1/swaps", post(swap::create))
        .with_state(state)
}

fn t(h: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, 0, 0).unwrap()
}

fn make_store(id: Uuid) -> Store {
    Store {
        id,
        name: "Downtown".into(),
        code: "DT-01".into(),
        address: None,
        operating_start: t(8),
        operating_end: t(22),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn make_shift(id: Uuid, employee_id: Uuid, status: ShiftStatus) -> Shift {
    Shift {
        id,
        schedule_id: Uuid::new_v4(),
        employee_id,
        date: NaiveDate::from_ymd_opt(2030, 6, 3).unwrap(),
        start_time: t(8),
        end_time: t(16),
        break_minutes: 30,
        status,
        callout_reason: None,
        callout_time: None,
        original_employee_id: None,
        covered_by_id: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

async fn body_json(res: axum::response::Response) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn templates_catalog_has_eight_entries() {
    let app = build_test_app(Mocks::default());

    let res = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/optimizer/templates")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    let templates = body["data"].as_array().unwrap();
    assert_eq!(templates.len(), 8);
    assert_eq!(templates[0]["start_hour"], 8);
    assert_eq!(templates[7]["break_minutes"], 60);
}

#[tokio::test]
async fn callout_on_missing_shift_is_404() {
    let mut mocks = Mocks::default();
    mocks.shift_repo.expect_find_by_id().returning(|_| Ok(None));

    let app = build_test_app(mocks);
    let res = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/v1/shifts/{}/callout", Uuid::new_v4()))
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&json!({"reason": "sick"})).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn callout_on_covered_shift_is_409() {
    let mut mocks = Mocks::default();
    mocks.shift_repo.expect_find_by_id().returning(|id| {
        Ok(Some(make_shift(id, Uuid::new_v4(), ShiftStatus::Covered)))
    });

    let app = build_test_app(mocks);
    let res = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/v1/shifts/{}/callout", Uuid::new_v4()))
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&json!({"reason": null})).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn cold_start_forecast_round_trips() {
    let store_id = Uuid::new_v4();

    let mut mocks = Mocks::default();
    let store = make_store(store_id);
    mocks
        .forecaster_workforce
        .expect_get_store()
        .returning(move |_| Ok(store.clone()));
    mocks
        .forecaster_repo
        .expect_historical_since()
        .returning(|_, _| Ok(vec![]));

    let app = build_test_app(mocks);
    let body = json!({
        "store_id": store_id,
        "week_start": "2025-01-06",
        "method": "ensemble",
        "save_to_db": false
    });

    let res = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/forecasts/generate")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["data"]["method"], "default_pattern");
    assert_eq!(body["data"]["daily_forecasts"].as_array().unwrap().len(), 7);
    // Saturday carries the 1.2 weekend multiplier
    assert_eq!(
        body["data"]["daily_forecasts"][5]["total_predicted_orders"],
        120.0
    );
}

#[tokio::test]
async fn non_monday_forecast_is_400() {
    let app = build_test_app(Mocks::default());
    let body = json!({
        "store_id": Uuid::new_v4(),
        "week_start": "2025-01-07",
        "save_to_db": false
    });

    let res = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/forecasts/generate")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn compliance_status_requires_monday() {
    let app = build_test_app(Mocks::default());

    let res = app
        .oneshot(
            Request::builder()
                .uri(format!(
                    "/api/v1/employees/{}/compliance-status?week_start=2025-01-08",
                    Uuid::new_v4()
                ))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn swap_create_by_non_owner_is_409() {
    let owner = Uuid::new_v4();

    let mut mocks = Mocks::default();
    mocks.shift_repo.expect_find_by_id().returning(move |id| {
        Ok(Some(make_shift(id, owner, ShiftStatus::Scheduled)))
    });

    let app = build_test_app(mocks);
    let body = json!({
        "requester_shift_id": Uuid::new_v4(),
        "requester_employee_id": Uuid::new_v4(),
        "requested_shift_id": null,
        "notes": null
    });

    let res = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/swaps")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::CONFLICT);
}
