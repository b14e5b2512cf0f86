use async_trait::async_trait;
use shared::types::NotificationKind;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    domain::notification::{NewNotification, NotificationRepository},
    error::SchedulingServiceError,
};

pub struct PgNotificationRepository {
    pool: PgPool,
}

impl PgNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for PgNotificationRepository {
    #[tracing::instrument(skip(self, notifications))]
    async fn enqueue(
        &self,
        notifications: Vec<NewNotification>,
    ) -> Result<(), SchedulingServiceError> {
        if notifications.is_empty() {
            return Ok(());
        }

        let employee_ids: Vec<Uuid> = notifications.iter().map(|n| n.employee_id).collect();
        let messages: Vec<String> = notifications.iter().map(|n| n.message.clone()).collect();
        let kinds: Vec<NotificationKind> = notifications.iter().map(|n| n.kind).collect();

        sqlx::query(
            r#"
            INSERT INTO notifications (employee_id, message, kind)
            SELECT * FROM UNNEST($1::uuid[], $2::varchar[], $3::notification_kind[])
            "#,
        )
        .bind(&employee_ids)
        .bind(&messages)
        .bind(&kinds)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
