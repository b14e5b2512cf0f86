use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use shared::types::{Employee, EmployeeStatus};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::WorkforceServiceError;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateEmployee {
    pub store_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub hire_date: NaiveDate,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateEmployee {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub status: Option<EmployeeStatus>,
}

#[cfg_attr(feature = "test-support", mockall::automock)]
#[async_trait]
pub trait EmployeeRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Employee>, WorkforceServiceError>;
    async fn find_all(
        &self,
        store_id: Option<Uuid>,
    ) -> Result<Vec<Employee>, WorkforceServiceError>;
    async fn create(&self, employee: CreateEmployee) -> Result<Employee, WorkforceServiceError>;
    async fn update(
        &self,
        id: Uuid,
        employee: UpdateEmployee,
    ) -> Result<Employee, WorkforceServiceError>;
    async fn deactivate(&self, id: Uuid) -> Result<(), WorkforceServiceError>;
}
