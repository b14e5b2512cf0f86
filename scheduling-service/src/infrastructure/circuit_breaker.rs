use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use shared::types::{Employee, SchedulingContext, Store};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
use crate::domain::workforce::WorkforceClient;
use crate::error::SchedulingServiceError;

/// Decorator around a [`WorkforceClient`] that checks the circuit breaker
/// before delegating calls and records successes/failures.
pub struct CircuitBreakerClient {
    inner: Arc<dyn WorkforceClient>,
    breaker: Arc<Mutex<CircuitBreaker>>,
}

impl CircuitBreakerClient {
    /// Creates a new circuit-breaker-wrapped client. Returns both the
    /// client and a shared handle to the breaker (used by the health check
    /// to force-close it).
    pub fn new(
        inner: Arc<dyn WorkforceClient>,
        config: CircuitBreakerConfig,
    ) -> (Self, Arc<Mutex<CircuitBreaker>>) {
        let breaker = Arc::new(Mutex::new(CircuitBreaker::new(config)));
        let client = Self {
            inner,
            breaker: Arc::clone(&breaker),
        };
        (client, breaker)
    }

    async fn check_open(&self) -> Result<(), SchedulingServiceError> {
        let mut breaker = self.breaker.lock().await;
        if !breaker.can_execute() {
            tracing::warn!("Circuit breaker is open, fast-failing request");
            return Err(SchedulingServiceError::CircuitOpen);
        }
        Ok(())
    }

    async fn record<T>(
        &self,
        result: Result<T, SchedulingServiceError>,
    ) -> Result<T, SchedulingServiceError> {
        match result {
            Ok(value) => {
                self.breaker.lock().await.record_success();
                Ok(value)
            }
            // Only transport-level failures trip the breaker; domain errors
            // like NotFound mean the peer is healthy.
            Err(
                e @ (SchedulingServiceError::WorkforceServiceUnavailable(_)
                | SchedulingServiceError::WorkforceService(_)),
            ) => {
                let mut breaker = self.breaker.lock().await;
                breaker.record_failure();
                let state = breaker.state();
                drop(breaker);

                tracing::warn!(
                    circuit_state = ?state,
                    "Workforce service call failed, circuit breaker recorded failure"
                );
                Err(e)
            }
            Err(e) => {
                self.breaker.lock().await.record_success();
                Err(e)
            }
        }
    }
}

#[async_trait]
impl WorkforceClient for CircuitBreakerClient {
    #[tracing::instrument(skip(self))]
    async fn get_store(&self, store_id: Uuid) -> Result<Store, SchedulingServiceError> {
        self.check_open().await?;
        let result = self.inner.get_store(store_id).await;
        self.record(result).await
    }

    #[tracing::instrument(skip(self))]
    async fn get_employee(&self, employee_id: Uuid) -> Result<Employee, SchedulingServiceError> {
        self.check_open().await?;
        let result = self.inner.get_employee(employee_id).await;
        self.record(result).await
    }

    #[tracing::instrument(skip(self))]
    async fn get_scheduling_context(
        &self,
        store_id: Uuid,
        week_start: NaiveDate,
    ) -> Result<SchedulingContext, SchedulingServiceError> {
        self.check_open().await?;
        let result = self
            .inner
            .get_scheduling_context(store_id, week_start)
            .await;
        self.record(result).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::circuit_breaker::CircuitState;
    use crate::domain::workforce::MockWorkforceClient;

    fn make_config(threshold: u32) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: threshold,
            cooldown_secs: 100,
        }
    }

    #[tokio::test]
    async fn delegates_to_inner_when_closed() {
        let mut mock = MockWorkforceClient::new();
        mock.expect_get_employee().returning(|id| {
            Ok(shared::types::Employee {
                id,
                store_id: Uuid::new_v4(),
                first_name: "Ana".into(),
                last_name: "Reyes".into(),
                hire_date: chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                status: shared::types::EmployeeStatus::Active,
                created_at: chrono::Utc::now(),
                updated_at: chrono::Utc::now(),
            })
        });

        let (client, breaker) = CircuitBreakerClient::new(Arc::new(mock), make_config(3));
        let result = client.get_employee(Uuid::new_v4()).await;

        assert!(result.is_ok());
        assert_eq!(breaker.lock().await.state(), CircuitState::Closed);
    }

    #[tokio::test]
    async fn opens_after_transport_failures_and_fast_fails() {
        let mut mock = MockWorkforceClient::new();
        mock.expect_get_store().returning(|_| {
            Err(SchedulingServiceError::WorkforceServiceUnavailable(
                "connection refused".into(),
            ))
        });

        let (client, _breaker) = CircuitBreakerClient::new(Arc::new(mock), make_config(2));

        let _ = client.get_store(Uuid::new_v4()).await;
        let _ = client.get_store(Uuid::new_v4()).await;

        // Third call is rejected by the breaker without reaching the inner
        // client
        let result = client.get_store(Uuid::new_v4()).await;
        assert!(matches!(
            result.unwrap_err(),
            SchedulingServiceError::CircuitOpen
        ));
    }

    #[tokio::test]
    async fn not_found_does_not_trip_the_breaker() {
        let mut mock = MockWorkforceClient::new();
        mock.expect_get_store()
            .returning(|id| Err(SchedulingServiceError::NotFound(format!("Store {id} not found"))));

        let (client, breaker) = CircuitBreakerClient::new(Arc::new(mock), make_config(1));

        let _ = client.get_store(Uuid::new_v4()).await;
        let _ = client.get_store(Uuid::new_v4()).await;

        assert_eq!(breaker.lock().await.state(), CircuitState::Closed);
    }
}
