use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use shared::types::SchedulingContext;
use uuid::Uuid;

use super::client::RedisCache;
use crate::domain::context::ContextProvider;
use crate::error::WorkforceServiceError;

/// TTL in seconds for a resolved scheduling context.
///
/// Kept short: the context folds together employees, availability and time
/// off, and workforce writes invalidate by pattern rather than exact key.
const TTL_CONTEXT: u64 = 120;

fn key_for(store_id: Uuid, week_start: NaiveDate) -> String {
    format!("workforce:context:{store_id}:{week_start}")
}

/// Cache-aside decorator around a [`ContextProvider`].
pub struct CachedContextProvider {
    inner: Arc<dyn ContextProvider>,
    cache: RedisCache,
}

impl CachedContextProvider {
    pub fn new(inner: Arc<dyn ContextProvider>, cache: RedisCache) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl ContextProvider for CachedContextProvider {
    async fn scheduling_context(
        &self,
        store_id: Uuid,
        week_start: NaiveDate,
    ) -> Result<SchedulingContext, WorkforceServiceError> {
        let key = key_for(store_id, week_start);
        if let Some(cached) = self.cache.get::<SchedulingContext>(&key).await {
            return Ok(cached);
        }
        let output = self.inner.scheduling_context(store_id, week_start).await?;
        self.cache.set(&key, &output, TTL_CONTEXT).await;

        Ok(output)
    }
}
