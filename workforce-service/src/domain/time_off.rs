use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use shared::types::{TimeOffRequest, TimeOffStatus};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::WorkforceServiceError;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTimeOff {
    pub employee_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
}

impl CreateTimeOff {
    pub fn validate(&self) -> Result<(), WorkforceServiceError> {
        if self.start_date > self.end_date {
            return Err(WorkforceServiceError::BadRequest(
                "start_date must not be after end_date".into(),
            ));
        }
        Ok(())
    }
}

#[cfg_attr(feature = "test-support", mockall::automock)]
#[async_trait]
pub trait TimeOffRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<TimeOffRequest>, WorkforceServiceError>;
    async fn for_employee(
        &self,
        employee_id: Uuid,
    ) -> Result<Vec<TimeOffRequest>, WorkforceServiceError>;
    /// Approved requests whose range intersects `[start, end]`.
    async fn approved_overlapping(
        &self,
        employee_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<TimeOffRequest>, WorkforceServiceError>;
    async fn create(
        &self,
        request: CreateTimeOff,
    ) -> Result<TimeOffRequest, WorkforceServiceError>;
    async fn set_status(
        &self,
        id: Uuid,
        status: TimeOffStatus,
        decided_by: Option<Uuid>,
        decided_at: Option<DateTime<Utc>>,
    ) -> Result<TimeOffRequest, WorkforceServiceError>;
}
