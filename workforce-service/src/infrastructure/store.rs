use async_trait::async_trait;
use shared::types::Store;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    domain::store::{CreateStore, StoreRepository, UpdateStore},
    error::WorkforceServiceError,
};

const COLUMNS: &str = "id, name, code, address, operating_start, operating_end, created_at, updated_at";

pub struct PgStoreRepository {
    pool: PgPool,
}

impl PgStoreRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StoreRepository for PgStoreRepository {
    #[tracing::instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Store>, WorkforceServiceError> {
        let output = sqlx::query_as::<_, Store>(&format!(
            "SELECT {COLUMNS} FROM stores WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(output)
    }

    #[tracing::instrument(skip(self))]
    async fn find_all(&self) -> Result<Vec<Store>, WorkforceServiceError> {
        let output = sqlx::query_as::<_, Store>(&format!(
            "SELECT {COLUMNS} FROM stores ORDER BY code"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(output)
    }

    #[tracing::instrument(skip(self))]
    async fn create(&self, store: CreateStore) -> Result<Store, WorkforceServiceError> {
        let output = sqlx::query_as::<_, Store>(&format!(
            r#"
            INSERT INTO stores (name, code, address, operating_start, operating_end)
            VALUES ($1, $2, $3, COALESCE($4, TIME '08:00'), COALESCE($5, TIME '22:00'))
            RETURNING {COLUMNS}
            "#
        ))
        .bind(store.name)
        .bind(store.code)
        .bind(store.address)
        .bind(store.operating_start)
        .bind(store.operating_end)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| WorkforceServiceError::from_db(e, "Store code already exists"))?;

        Ok(output)
    }

    #[tracing::instrument(skip(self))]
    async fn update(&self, id: Uuid, store: UpdateStore) -> Result<Store, WorkforceServiceError> {
        let output = sqlx::query_as::<_, Store>(&format!(
            r#"
            UPDATE stores
            SET name = COALESCE($2, name),
                address = COALESCE($3, address),
                operating_start = COALESCE($4, operating_start),
                operating_end = COALESCE($5, operating_end),
                updated_at = now()
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(store.name)
        .bind(store.address)
        .bind(store.operating_start)
        .bind(store.operating_end)
        .fetch_optional(&self.pool)
        .await?;

        output.ok_or_else(|| WorkforceServiceError::NotFound("Store not found".to_string()))
    }
}
