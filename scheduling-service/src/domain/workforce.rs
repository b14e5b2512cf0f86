use async_trait::async_trait;
use chrono::NaiveDate;
use shared::types::{Employee, SchedulingContext, Store};
use uuid::Uuid;

use crate::error::SchedulingServiceError;

/// Read surface into the workforce service.
///
/// `get_store` and `get_employee` map a missing record to `NotFound`; the
/// scheduling context is the per-week constraint bundle consumed by the
/// optimizer, compliance checks and replacement search.
#[cfg_attr(feature = "test-support", mockall::automock)]
#[async_trait]
pub trait WorkforceClient: Send + Sync {
    async fn get_store(&self, store_id: Uuid) -> Result<Store, SchedulingServiceError>;
    async fn get_employee(&self, employee_id: Uuid) -> Result<Employee, SchedulingServiceError>;
    async fn get_scheduling_context(
        &self,
        store_id: Uuid,
        week_start: NaiveDate,
    ) -> Result<SchedulingContext, SchedulingServiceError>;
}
