use async_trait::async_trait;
use chrono::NaiveTime;
use serde::Deserialize;
use shared::types::Store;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::WorkforceServiceError;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateStore {
    pub name: String,
    pub code: String,
    pub address: Option<String>,
    /// Defaults to 08:00 when omitted.
    pub operating_start: Option<NaiveTime>,
    /// Defaults to 22:00 when omitted.
    pub operating_end: Option<NaiveTime>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStore {
    pub name: Option<String>,
    pub address: Option<String>,
    pub operating_start: Option<NaiveTime>,
    pub operating_end: Option<NaiveTime>,
}

#[cfg_attr(feature = "test-support", mockall::automock)]
#[async_trait]
pub trait StoreRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Store>, WorkforceServiceError>;
    async fn find_all(&self) -> Result<Vec<Store>, WorkforceServiceError>;
    async fn create(&self, store: CreateStore) -> Result<Store, WorkforceServiceError>;
    async fn update(&self, id: Uuid, store: UpdateStore) -> Result<Store, WorkforceServiceError>;
}
