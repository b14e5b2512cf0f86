use async_trait::async_trait;
use chrono::NaiveDate;
use opentelemetry::global;
use opentelemetry::propagation::Injector;
use reqwest::{Client, StatusCode, header};
use serde::de::DeserializeOwned;
use shared::{
    responses::ApiResponse,
    types::{Employee, SchedulingContext, Store},
};
use tracing_opentelemetry::OpenTelemetrySpanExt;
use uuid::Uuid;

use crate::{domain::workforce::WorkforceClient, error::SchedulingServiceError};

pub struct HttpWorkforceClient {
    client: Client,
    base_url: String,
}

impl HttpWorkforceClient {
    pub fn new(base_url: String) -> Self {
        let client = Client::new();
        Self { client, base_url }
    }

    /// GET a JSON envelope from the workforce service, propagating the
    /// current trace context. A 404 becomes `NotFound` with the given
    /// message.
    async fn get_json<T: DeserializeOwned + serde::Serialize>(
        &self,
        url: String,
        not_found_msg: &str,
    ) -> Result<T, SchedulingServiceError> {
        let mut headers = header::HeaderMap::new();
        let cx = tracing::Span::current().context();
        global::get_text_map_propagator(|propagator| {
            propagator.inject_context(&cx, &mut HeaderMapInjector(&mut headers));
        });

        tracing::debug!(%url, "Requesting workforce data");

        let res = self
            .client
            .get(&url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    SchedulingServiceError::WorkforceServiceUnavailable(format!(
                        "Failed to reach workforce service: {e}"
                    ))
                } else {
                    SchedulingServiceError::WorkforceService(format!(
                        "Failed to reach workforce service: {e}"
                    ))
                }
            })?;

        tracing::debug!(status = %res.status(), "Workforce service responded");

        match res.status() {
            StatusCode::NOT_FOUND => {
                return Err(SchedulingServiceError::NotFound(not_found_msg.to_string()));
            }
            status if !status.is_success() => {
                return Err(SchedulingServiceError::WorkforceService(format!(
                    "Workforce service returned status {status}"
                )));
            }
            _ => {}
        }

        let api_response = res.json::<ApiResponse<T>>().await.map_err(|e| {
            SchedulingServiceError::WorkforceService(format!(
                "Failed to deserialize response: {e}"
            ))
        })?;

        api_response.data.ok_or_else(|| {
            SchedulingServiceError::WorkforceService("No data in response".to_string())
        })
    }
}

struct HeaderMapInjector<'a>(&'a mut header::HeaderMap);

impl Injector for HeaderMapInjector<'_> {
    fn set(&mut self, key: &str, value: String) {
        if let Ok(name) = header::HeaderName::from_bytes(key.as_bytes())
            && let Ok(val) = header::HeaderValue::from_str(&value)
        {
            self.0.insert(name, val);
        }
    }
}

#[async_trait]
impl WorkforceClient for HttpWorkforceClient {
    #[tracing::instrument(skip(self))]
    async fn get_store(&self, store_id: Uuid) -> Result<Store, SchedulingServiceError> {
        let url = format!("{}/api/v1/stores/{store_id}", self.base_url);
        self.get_json(url, &format!("Store {store_id} not found"))
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn get_employee(&self, employee_id: Uuid) -> Result<Employee, SchedulingServiceError> {
        let url = format!("{}/api/v1/employees/{employee_id}", self.base_url);
        self.get_json(url, &format!("Employee {employee_id} not found"))
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn get_scheduling_context(
        &self,
        store_id: Uuid,
        week_start: NaiveDate,
    ) -> Result<SchedulingContext, SchedulingServiceError> {
        let url = format!(
            "{}/api/v1/stores/{store_id}/scheduling-context?week_start={week_start}",
            self.base_url
        );
        self.get_json(url, &format!("Store {store_id} not found"))
            .await
    }
}
