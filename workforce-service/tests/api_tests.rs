use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
    routing::{get, patch},
};
use chrono::{NaiveDate, NaiveTime, Utc};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use shared::types::{
    Employee, EmployeeContext, EmployeeStatus, SchedulingContext, Store, TimeOffRequest,
    TimeOffStatus,
};
use workforce_service::{
    api::{
        handler::{context, employee, store, time_off},
        state::WorkforceAppState,
    },
    domain::{
        availability::MockAvailabilityRepository, context::MockContextProvider,
        employee::MockEmployeeRepository, store::MockStoreRepository,
        time_off::MockTimeOffRepository,
    },
    error::WorkforceServiceError,
};

struct Mocks {
    stores: MockStoreRepository,
    employees: MockEmployeeRepository,
    availability: MockAvailabilityRepository,
    time_off: MockTimeOffRepository,
    context: MockContextProvider,
}

impl Default for Mocks {
    fn default() -> Self {
        Self {
            stores: MockStoreRepository::new(),
            employees: MockEmployeeRepository::new(),
            availability: MockAvailabilityRepository::new(),
            time_off: MockTimeOffRepository::new(),
            context: MockContextProvider::new(),
        }
    }
}

fn build_test_app(mocks: Mocks) -> Router {
    let state = Arc::new(WorkforceAppState {
        store_repo: Arc::new(mocks.stores),
        employee_repo: Arc::new(mocks.employees),
        availability_repo: Arc::new(mocks.availability),
        time_off_repo: Arc::new(mocks.time_off),
        context: Arc::new(mocks.context),
    });

    Router::new()
        .route("/api/v1/stores", get(store::find_all).post(store::create))
        .route("/api/v1/stores/{id}", get(store::find_by_id))
        .route(
            "/api/v1/stores/{id}/scheduling-context",
            get(context::scheduling_context),
        )
        .route(
            "/api/v1/employees",
            get(employee::find_all).post(employee::create),
        )
        .route("/api/v1/time-off/{id}/approve", patch(time_off::approve))
        .with_state(state)
}

fn make_store(id: Uuid) -> Store {
    Store {
        id,
        name: "Riverside".into(),
        code: "RV-02".into(),
        address: Some("12 Quay St".into()),
        operating_start: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
        operating_end: NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn make_employee(store_id: Uuid) -> Employee {
    Employee {
        id: Uuid::new_v4(),
        store_id,
        first_name: "Maya".into(),
        last_name: "Chen".into(),
        hire_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        status: EmployeeStatus::Active,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

async fn body_json(res: axum::response::Response) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn get_store_returns_store() {
    let store_id = Uuid::new_v4();
    let store = make_store(store_id);

    let mut mocks = Mocks::default();
    mocks
        .stores
        .expect_find_by_id()
        .returning(move |_| Ok(Some(store.clone())));

    let app = build_test_app(mocks);
    let res = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/v1/stores/{store_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["data"]["code"], "RV-02");
}

#[tokio::test]
async fn get_store_not_found_is_404() {
    let mut mocks = Mocks::default();
    mocks.stores.expect_find_by_id().returning(|_| Ok(None));

    let app = build_test_app(mocks);
    let res = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/v1/stores/{}", Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_employee_rejects_unknown_store() {
    let mut mocks = Mocks::default();
    mocks.stores.expect_find_by_id().returning(|_| Ok(None));

    let app = build_test_app(mocks);
    let body = json!({
        "store_id": Uuid::new_v4(),
        "first_name": "Maya",
        "last_name": "Chen",
        "hire_date": "2024-06-01"
    });

    let res = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/employees")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn scheduling_context_round_trips() {
    let store_id = Uuid::new_v4();
    let monday = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
    let ctx = SchedulingContext {
        store: make_store(store_id),
        week_start: monday,
        employees: vec![EmployeeContext {
            employee: make_employee(store_id),
            availability: vec![],
            time_off: vec![],
        }],
    };

    let mut mocks = Mocks::default();
    mocks
        .context
        .expect_scheduling_context()
        .returning(move |_, _| Ok(ctx.clone()));

    let app = build_test_app(mocks);
    let res = app
        .oneshot(
            Request::builder()
                .uri(format!(
                    "/api/v1/stores/{store_id}/scheduling-context?week_start=2025-01-06"
                ))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["data"]["week_start"], "2025-01-06");
    assert_eq!(body["data"]["employees"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn context_bad_request_maps_to_400() {
    let mut mocks = Mocks::default();
    mocks
        .context
        .expect_scheduling_context()
        .returning(|_, _| Err(WorkforceServiceError::BadRequest("week_start must be a Monday".into())));

    let app = build_test_app(mocks);
    let res = app
        .oneshot(
            Request::builder()
                .uri(format!(
                    "/api/v1/stores/{}/scheduling-context?week_start=2025-01-07",
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
async fn approving_decided_time_off_conflicts() {
    let request_id = Uuid::new_v4();
    let decided = TimeOffRequest {
        id: request_id,
        employee_id: Uuid::new_v4(),
        start_date: NaiveDate::from_ymd_opt(2025, 2, 3).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2025, 2, 4).unwrap(),
        reason: None,
        status: TimeOffStatus::Denied,
        approved_by: Some(Uuid::new_v4()),
        approved_at: Some(Utc::now()),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    let mut mocks = Mocks::default();
    mocks
        .time_off
        .expect_find_by_id()
        .returning(move |_| Ok(Some(decided.clone())));

    let app = build_test_app(mocks);
    let body = json!({ "decided_by": Uuid::new_v4() });

    let res = app
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri(format!("/api/v1/time-off/{request_id}/approve"))
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::CONFLICT);
}
