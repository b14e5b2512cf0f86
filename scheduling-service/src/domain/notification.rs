use async_trait::async_trait;
use shared::types::NotificationKind;
use uuid::Uuid;

use crate::error::SchedulingServiceError;

/// A notification to be enqueued, before it has a database-generated ID.
/// Delivery is out of scope; rows are only written.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub employee_id: Uuid,
    pub message: String,
    pub kind: NotificationKind,
}

#[cfg_attr(feature = "test-support", mockall::automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn enqueue(
        &self,
        notifications: Vec<NewNotification>,
    ) -> Result<(), SchedulingServiceError>;
}
