use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use shared::types::{Availability, Employee, TimeOffRequest, TimeOffStatus};
use uuid::Uuid;

use super::client::RedisCache;
use crate::domain::availability::{AvailabilityRepository, SetAvailability};
use crate::domain::employee::{CreateEmployee, EmployeeRepository, UpdateEmployee};
use crate::domain::time_off::{CreateTimeOff, TimeOffRepository};
use crate::error::WorkforceServiceError;

/// Any workforce write makes every cached scheduling context stale.
const CONTEXT_PATTERN: &str = "workforce:context:*";

/// Write-through decorator around an [`EmployeeRepository`] that drops
/// cached scheduling contexts whenever the roster changes. Employee reads
/// are not cached: the scheduling side reads them through the context view.
pub struct InvalidatingEmployeeRepository {
    inner: Arc<dyn EmployeeRepository>,
    cache: RedisCache,
}

impl InvalidatingEmployeeRepository {
    pub fn new(inner: Arc<dyn EmployeeRepository>, cache: RedisCache) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl EmployeeRepository for InvalidatingEmployeeRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Employee>, WorkforceServiceError> {
        self.inner.find_by_id(id).await
    }

    async fn find_all(
        &self,
        store_id: Option<Uuid>,
    ) -> Result<Vec<Employee>, WorkforceServiceError> {
        self.inner.find_all(store_id).await
    }

    async fn create(&self, employee: CreateEmployee) -> Result<Employee, WorkforceServiceError> {
        let output = self.inner.create(employee).await?;
        self.cache
            .delete_by_pattern(&format!("workforce:context:{}:*", output.store_id))
            .await;

        Ok(output)
    }

    async fn update(
        &self,
        id: Uuid,
        employee: UpdateEmployee,
    ) -> Result<Employee, WorkforceServiceError> {
        let output = self.inner.update(id, employee).await?;
        self.cache
            .delete_by_pattern(&format!("workforce:context:{}:*", output.store_id))
            .await;

        Ok(output)
    }

    async fn deactivate(&self, id: Uuid) -> Result<(), WorkforceServiceError> {
        self.inner.deactivate(id).await?;
        self.cache.delete_by_pattern(CONTEXT_PATTERN).await;

        Ok(())
    }
}

/// Write-through decorator around an [`AvailabilityRepository`].
pub struct InvalidatingAvailabilityRepository {
    inner: Arc<dyn AvailabilityRepository>,
    cache: RedisCache,
}

impl InvalidatingAvailabilityRepository {
    pub fn new(inner: Arc<dyn AvailabilityRepository>, cache: RedisCache) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl AvailabilityRepository for InvalidatingAvailabilityRepository {
    async fn for_employee(
        &self,
        employee_id: Uuid,
    ) -> Result<Vec<Availability>, WorkforceServiceError> {
        self.inner.for_employee(employee_id).await
    }

    async fn replace_for_employee(
        &self,
        employee_id: Uuid,
        rows: Vec<SetAvailability>,
    ) -> Result<Vec<Availability>, WorkforceServiceError> {
        let output = self.inner.replace_for_employee(employee_id, rows).await?;
        self.cache.delete_by_pattern(CONTEXT_PATTERN).await;

        Ok(output)
    }
}

/// Write-through decorator around a [`TimeOffRepository`].
pub struct InvalidatingTimeOffRepository {
    inner: Arc<dyn TimeOffRepository>,
    cache: RedisCache,
}

impl InvalidatingTimeOffRepository {
    pub fn new(inner: Arc<dyn TimeOffRepository>, cache: RedisCache) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl TimeOffRepository for InvalidatingTimeOffRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<TimeOffRequest>, WorkforceServiceError> {
        self.inner.find_by_id(id).await
    }

    async fn for_employee(
        &self,
        employee_id: Uuid,
    ) -> Result<Vec<TimeOffRequest>, WorkforceServiceError> {
        self.inner.for_employee(employee_id).await
    }

    async fn approved_overlapping(
        &self,
        employee_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<TimeOffRequest>, WorkforceServiceError> {
        self.inner
            .approved_overlapping(employee_id, start, end)
            .await
    }

    async fn create(
        &self,
        request: CreateTimeOff,
    ) -> Result<TimeOffRequest, WorkforceServiceError> {
        // Pending requests do not affect scheduling; no invalidation needed.
        self.inner.create(request).await
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: TimeOffStatus,
        decided_by: Option<Uuid>,
        decided_at: Option<DateTime<Utc>>,
    ) -> Result<TimeOffRequest, WorkforceServiceError> {
        let output = self
            .inner
            .set_status(id, status, decided_by, decided_at)
            .await?;
        self.cache.delete_by_pattern(CONTEXT_PATTERN).await;

        Ok(output)
    }
}
