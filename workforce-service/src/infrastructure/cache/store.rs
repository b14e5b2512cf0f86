use std::sync::Arc;

use async_trait::async_trait;
use shared::types::Store;
use uuid::Uuid;

use super::client::RedisCache;
use crate::domain::store::{CreateStore, StoreRepository, UpdateStore};
use crate::error::WorkforceServiceError;

/// Cache key for the full store list.
const KEY_ALL: &str = "workforce:store:all";
/// TTL in seconds for the store list cache entry.
const TTL_ALL: u64 = 300;
/// TTL in seconds for individual store-by-id cache entries.
const TTL_BY_ID: u64 = 600;

fn key_by_id(id: Uuid) -> String {
    format!("workforce:store:id:{id}")
}

/// Cache-aside decorator around a [`StoreRepository`].
///
/// Reads check Redis first; writes delegate to the inner repository and
/// invalidate relevant cache keys, including derived scheduling contexts.
pub struct CachedStoreRepository {
    inner: Arc<dyn StoreRepository>,
    cache: RedisCache,
}

impl CachedStoreRepository {
    pub fn new(inner: Arc<dyn StoreRepository>, cache: RedisCache) -> Self {
        Self { inner, cache }
    }

    async fn invalidate(&self, id: Uuid) {
        self.cache.delete(&[KEY_ALL, &key_by_id(id)]).await;
        self.cache
            .delete_by_pattern(&format!("workforce:context:{id}:*"))
            .await;
    }
}

#[async_trait]
impl StoreRepository for CachedStoreRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Store>, WorkforceServiceError> {
        let key = key_by_id(id);
        if let Some(cached) = self.cache.get::<Option<Store>>(&key).await {
            return Ok(cached);
        }
        let output = self.inner.find_by_id(id).await?;
        self.cache.set(&key, &output, TTL_BY_ID).await;

        Ok(output)
    }

    async fn find_all(&self) -> Result<Vec<Store>, WorkforceServiceError> {
        if let Some(cached) = self.cache.get::<Vec<Store>>(KEY_ALL).await {
            return Ok(cached);
        }
        let output = self.inner.find_all().await?;
        self.cache.set(KEY_ALL, &output, TTL_ALL).await;

        Ok(output)
    }

    async fn create(&self, store: CreateStore) -> Result<Store, WorkforceServiceError> {
        let output = self.inner.create(store).await?;
        self.cache.delete(&[KEY_ALL]).await;

        Ok(output)
    }

    async fn update(&self, id: Uuid, store: UpdateStore) -> Result<Store, WorkforceServiceError> {
        let output = self.inner.update(id, store).await?;
        self.invalidate(id).await;

        Ok(output)
    }
}
