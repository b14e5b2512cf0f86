use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use shared::types::{NotificationKind, Shift, ShiftSwap, SwapStatus};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::SchedulingConfig;
use crate::domain::notification::{NewNotification, NotificationRepository};
use crate::domain::schedule::ShiftRepository;
use crate::domain::swap_state::{AcceptedSwap, PendingSwap};
use crate::error::SchedulingServiceError;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSwap {
    /// The shift being offered up for swap.
    pub requester_shift_id: Uuid,
    /// Who is asking; must own the requester shift.
    pub requester_employee_id: Uuid,
    /// Specific shift wanted in exchange; None posts an open swap.
    pub requested_shift_id: Option<Uuid>,
    pub notes: Option<String>,
}

/// Persistence operations for shift swaps.
#[cfg_attr(feature = "test-support", mockall::automock)]
#[async_trait]
pub trait SwapRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ShiftSwap>, SchedulingServiceError>;
    /// Any Pending or Accepted swap already posted for the shift.
    async fn open_for_shift(
        &self,
        requester_shift_id: Uuid,
    ) -> Result<Option<ShiftSwap>, SchedulingServiceError>;
    async fn create(
        &self,
        requester_shift_id: Uuid,
        requested_shift_id: Option<Uuid>,
        notes: Option<String>,
    ) -> Result<ShiftSwap, SchedulingServiceError>;
    async fn set_accepted(
        &self,
        id: Uuid,
        requested_shift_id: Uuid,
    ) -> Result<ShiftSwap, SchedulingServiceError>;
    async fn set_status(
        &self,
        id: Uuid,
        status: SwapStatus,
        decided_by: Option<Uuid>,
        decided_at: Option<DateTime<Utc>>,
    ) -> Result<ShiftSwap, SchedulingServiceError>;
    /// Approves the swap and exchanges the two shifts' employees in one
    /// transaction. Returns the swap and both updated shifts.
    async fn approve_exchange(
        &self,
        id: Uuid,
        approved_by: Uuid,
        approved_at: DateTime<Utc>,
    ) -> Result<(ShiftSwap, Shift, Shift), SchedulingServiceError>;
}

/// Drives the swap state machine: pending -> accepted -> approved, with
/// denied/cancelled branches out of either open state.
pub struct SwapService {
    swaps: Arc<dyn SwapRepository>,
    shifts: Arc<dyn ShiftRepository>,
    notifications: Arc<dyn NotificationRepository>,
    timezone: Tz,
}

impl SwapService {
    pub fn new(
        swaps: Arc<dyn SwapRepository>,
        shifts: Arc<dyn ShiftRepository>,
        notifications: Arc<dyn NotificationRepository>,
        config: &SchedulingConfig,
    ) -> Self {
        Self {
            swaps,
            shifts,
            notifications,
            timezone: config.timezone(),
        }
    }

    async fn shift(&self, id: Uuid) -> Result<Shift, SchedulingServiceError> {
        self.shifts
            .find_by_id(id)
            .await?
            .ok_or_else(|| SchedulingServiceError::NotFound(format!("Shift {id} not found")))
    }

    async fn swap(&self, id: Uuid) -> Result<ShiftSwap, SchedulingServiceError> {
        self.swaps
            .find_by_id(id)
            .await?
            .ok_or_else(|| SchedulingServiceError::NotFound(format!("Shift swap {id} not found")))
    }

    #[tracing::instrument(skip(self, request))]
    pub async fn create(&self, request: CreateSwap) -> Result<ShiftSwap, SchedulingServiceError> {
        let requester_shift = self.shift(request.requester_shift_id).await?;

        if requester_shift.employee_id != request.requester_employee_id {
            return Err(SchedulingServiceError::PreconditionFailed(
                "Only the shift's employee can post it for swap".into(),
            ));
        }

        if requester_shift.date < shared::time::today_in(self.timezone) {
            return Err(SchedulingServiceError::BadRequest(
                "Cannot swap past shifts".into(),
            ));
        }

        if self
            .swaps
            .open_for_shift(request.requester_shift_id)
            .await?
            .is_some()
        {
            return Err(SchedulingServiceError::Conflict(
                "This shift already has an open swap request".into(),
            ));
        }

        if let Some(requested_id) = request.requested_shift_id {
            let requested_shift = self.shift(requested_id).await?;
            if requested_shift.employee_id == request.requester_employee_id {
                return Err(SchedulingServiceError::BadRequest(
                    "Cannot swap with your own shift".into(),
                ));
            }
        }

        self.swaps
            .create(
                request.requester_shift_id,
                request.requested_shift_id,
                request.notes,
            )
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn accept(
        &self,
        swap_id: Uuid,
        accepting_shift_id: Uuid,
        accepting_employee_id: Uuid,
    ) -> Result<ShiftSwap, SchedulingServiceError> {
        let swap = self.swap(swap_id).await?;
        let pending = PendingSwap::from_swap(swap).ok_or_else(|| {
            SchedulingServiceError::PreconditionFailed(
                "Can only accept pending swap requests".into(),
            )
        })?;

        let accepting_shift = self.shift(accepting_shift_id).await?;
        if accepting_shift.employee_id != accepting_employee_id {
            return Err(SchedulingServiceError::PreconditionFailed(
                "You can only offer your own shifts".into(),
            ));
        }
        if accepting_shift.date < shared::time::today_in(self.timezone) {
            return Err(SchedulingServiceError::BadRequest(
                "Cannot offer past shifts".into(),
            ));
        }

        let requester_shift = self.shift(pending.requester_shift_id()).await?;
        if requester_shift.employee_id == accepting_employee_id {
            return Err(SchedulingServiceError::PreconditionFailed(
                "Cannot accept your own swap request".into(),
            ));
        }

        let (_accepted, id, _status) = pending.accept(accepting_shift_id);
        let saved = self.swaps.set_accepted(id, accepting_shift_id).await?;

        self.notifications
            .enqueue(vec![NewNotification {
                employee_id: requester_shift.employee_id,
                message: "Your swap request was accepted. Awaiting manager approval.".to_string(),
                kind: NotificationKind::SwapRequested,
            }])
            .await?;

        Ok(saved)
    }

    /// Executes the swap: both shifts exchange employees atomically.
    #[tracing::instrument(skip(self))]
    pub async fn approve(
        &self,
        swap_id: Uuid,
        approved_by: Uuid,
    ) -> Result<ShiftSwap, SchedulingServiceError> {
        let swap = self.swap(swap_id).await?;
        let accepted = AcceptedSwap::from_swap(swap).ok_or_else(|| {
            SchedulingServiceError::PreconditionFailed(
                "Can only approve accepted swap requests".into(),
            )
        })?;

        if accepted.requested_shift_id().is_none() {
            return Err(SchedulingServiceError::PreconditionFailed(
                "Swap must have an accepted shift before approval".into(),
            ));
        }

        let (_approved, id, _status) = accepted.approve(approved_by, Utc::now());
        let (saved, requester_shift, requested_shift) =
            self.swaps.approve_exchange(id, approved_by, Utc::now()).await?;

        // Both post-exchange owners hear about it
        self.notifications
            .enqueue(vec![
                NewNotification {
                    employee_id: requester_shift.employee_id,
                    message: "Your shift swap has been approved.".to_string(),
                    kind: NotificationKind::SwapApproved,
                },
                NewNotification {
                    employee_id: requested_shift.employee_id,
                    message: "Your shift swap has been approved.".to_string(),
                    kind: NotificationKind::SwapApproved,
                },
            ])
            .await?;

        Ok(saved)
    }

    #[tracing::instrument(skip(self))]
    pub async fn deny(
        &self,
        swap_id: Uuid,
        decided_by: Uuid,
    ) -> Result<ShiftSwap, SchedulingServiceError> {
        let swap = self.swap(swap_id).await?;
        if !matches!(swap.status, SwapStatus::Pending | SwapStatus::Accepted) {
            return Err(SchedulingServiceError::PreconditionFailed(
                "Can only deny pending or accepted swap requests".into(),
            ));
        }

        let requester_shift = self.shift(swap.requester_shift_id).await?;
        let saved = self
            .swaps
            .set_status(swap_id, SwapStatus::Denied, Some(decided_by), Some(Utc::now()))
            .await?;

        self.notifications
            .enqueue(vec![NewNotification {
                employee_id: requester_shift.employee_id,
                message: "Your shift swap request has been denied.".to_string(),
                kind: NotificationKind::SwapDenied,
            }])
            .await?;

        Ok(saved)
    }

    #[tracing::instrument(skip(self))]
    pub async fn cancel(
        &self,
        swap_id: Uuid,
        requester_employee_id: Uuid,
    ) -> Result<ShiftSwap, SchedulingServiceError> {
        let swap = self.swap(swap_id).await?;
        if !matches!(swap.status, SwapStatus::Pending | SwapStatus::Accepted) {
            return Err(SchedulingServiceError::PreconditionFailed(
                "Can only cancel pending or accepted swap requests".into(),
            ));
        }

        let requester_shift = self.shift(swap.requester_shift_id).await?;
        if requester_shift.employee_id != requester_employee_id {
            return Err(SchedulingServiceError::PreconditionFailed(
                "Only the requester can cancel this swap".into(),
            ));
        }

        self.swaps
            .set_status(swap_id, SwapStatus::Cancelled, None, None)
            .await
    }

    pub async fn get(&self, swap_id: Uuid) -> Result<ShiftSwap, SchedulingServiceError> {
        self.swap(swap_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::notification::MockNotificationRepository;
    use crate::domain::schedule::MockShiftRepository;
    use chrono::{NaiveDate, NaiveTime};
    use shared::types::ShiftStatus;
    use std::sync::Mutex;

    fn t(h: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, 0, 0).unwrap()
    }

    fn make_shift(id: Uuid, employee_id: Uuid, date: NaiveDate, start: u32, end: u32) -> Shift {
        Shift {
            id,
            schedule_id: Uuid::new_v4(),
            employee_id,
            date,
            start_time: t(start),
            end_time: t(end),
            break_minutes: 30,
            status: ShiftStatus::Scheduled,
            callout_reason: None,
            callout_time: None,
            original_employee_id: None,
            covered_by_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn make_swap(id: Uuid, requester_shift_id: Uuid, status: SwapStatus) -> ShiftSwap {
        ShiftSwap {
            id,
            requester_shift_id,
            requested_shift_id: None,
            notes: None,
            status,
            approved_by: None,
            approved_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn far_future() -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 6, 3).unwrap()
    }

    fn service(
        swaps: MockSwapRepository,
        shifts: MockShiftRepository,
        notifications: MockNotificationRepository,
    ) -> SwapService {
        SwapService::new(
            Arc::new(swaps),
            Arc::new(shifts),
            Arc::new(notifications),
            &SchedulingConfig::default(),
        )
    }

    #[tokio::test]
    async fn create_rejects_non_owner() {
        let shift_id = Uuid::new_v4();
        let owner = Uuid::new_v4();

        let mut shifts = MockShiftRepository::new();
        shifts.expect_find_by_id().returning(move |id| {
            Ok(Some(make_shift(id, owner, far_future(), 8, 16)))
        });

        let svc = service(
            MockSwapRepository::new(),
            shifts,
            MockNotificationRepository::new(),
        );

        let output = svc
            .create(CreateSwap {
                requester_shift_id: shift_id,
                requester_employee_id: Uuid::new_v4(),
                requested_shift_id: None,
                notes: None,
            })
            .await;

        assert!(matches!(
            output.unwrap_err(),
            SchedulingServiceError::PreconditionFailed(_)
        ));
    }

    #[tokio::test]
    async fn create_rejects_second_open_swap() {
        let shift_id = Uuid::new_v4();
        let owner = Uuid::new_v4();

        let mut shifts = MockShiftRepository::new();
        shifts.expect_find_by_id().returning(move |id| {
            Ok(Some(make_shift(id, owner, far_future(), 8, 16)))
        });

        let mut swaps = MockSwapRepository::new();
        swaps.expect_open_for_shift().returning(move |sid| {
            Ok(Some(make_swap(Uuid::new_v4(), sid, SwapStatus::Pending)))
        });

        let svc = service(swaps, shifts, MockNotificationRepository::new());

        let output = svc
            .create(CreateSwap {
                requester_shift_id: shift_id,
                requester_employee_id: owner,
                requested_shift_id: None,
                notes: None,
            })
            .await;

        assert!(matches!(
            output.unwrap_err(),
            SchedulingServiceError::Conflict(_)
        ));
    }

    #[tokio::test]
    async fn accept_own_swap_is_rejected() {
        let swap_id = Uuid::new_v4();
        let requester_shift_id = Uuid::new_v4();
        let owner = Uuid::new_v4();

        let mut swaps = MockSwapRepository::new();
        swaps.expect_find_by_id().returning(move |id| {
            Ok(Some(make_swap(id, requester_shift_id, SwapStatus::Pending)))
        });

        let mut shifts = MockShiftRepository::new();
        shifts.expect_find_by_id().returning(move |id| {
            Ok(Some(make_shift(id, owner, far_future(), 8, 16)))
        });

        let svc = service(swaps, shifts, MockNotificationRepository::new());

        // The accepting employee owns both shifts here, so this must fail
        let output = svc.accept(swap_id, Uuid::new_v4(), owner).await;
        assert!(matches!(
            output.unwrap_err(),
            SchedulingServiceError::PreconditionFailed(_)
        ));
    }

    #[tokio::test]
    async fn approve_requires_accepted_status() {
        let swap_id = Uuid::new_v4();

        let mut swaps = MockSwapRepository::new();
        swaps.expect_find_by_id().returning(move |id| {
            Ok(Some(make_swap(id, Uuid::new_v4(), SwapStatus::Pending)))
        });

        let svc = service(
            swaps,
            MockShiftRepository::new(),
            MockNotificationRepository::new(),
        );

        let output = svc.approve(swap_id, Uuid::new_v4()).await;
        assert!(matches!(
            output.unwrap_err(),
            SchedulingServiceError::PreconditionFailed(_)
        ));
    }

    #[tokio::test]
    async fn approve_exchanges_employees_and_notifies_both() {
        let swap_id = Uuid::new_v4();
        let shift_a = Uuid::new_v4();
        let shift_b = Uuid::new_v4();
        let emp_1 = Uuid::new_v4();
        let emp_2 = Uuid::new_v4();
        let manager = Uuid::new_v4();

        let mut swaps = MockSwapRepository::new();
        swaps.expect_find_by_id().returning(move |id| {
            let mut swap = make_swap(id, shift_a, SwapStatus::Accepted);
            swap.requested_shift_id = Some(shift_b);
            Ok(Some(swap))
        });
        swaps
            .expect_approve_exchange()
            .returning(move |id, approved_by, at| {
                let mut swap = make_swap(id, shift_a, SwapStatus::Approved);
                swap.requested_shift_id = Some(shift_b);
                swap.approved_by = Some(approved_by);
                swap.approved_at = Some(at);
                // Monday 8-16 now belongs to emp_2, Wednesday 10-18 to emp_1
                let monday = NaiveDate::from_ymd_opt(2030, 6, 3).unwrap();
                let wednesday = NaiveDate::from_ymd_opt(2030, 6, 5).unwrap();
                Ok((
                    swap,
                    make_shift(shift_a, emp_2, monday, 8, 16),
                    make_shift(shift_b, emp_1, wednesday, 10, 18),
                ))
            });

        let notified = Arc::new(Mutex::new(Vec::new()));
        let notified_clone = notified.clone();
        let mut notifications = MockNotificationRepository::new();
        notifications.expect_enqueue().returning(move |batch| {
            notified_clone.lock().unwrap().extend(batch);
            Ok(())
        });

        let svc = service(swaps, MockShiftRepository::new(), notifications);
        let saved = svc.approve(swap_id, manager).await.unwrap();

        assert_eq!(saved.status, SwapStatus::Approved);
        assert_eq!(saved.approved_by, Some(manager));

        let sent = notified.lock().unwrap();
        assert_eq!(sent.len(), 2);
        let targets: Vec<Uuid> = sent.iter().map(|n| n.employee_id).collect();
        assert!(targets.contains(&emp_1));
        assert!(targets.contains(&emp_2));
    }

    #[tokio::test]
    async fn cancel_restricted_to_requester() {
        let swap_id = Uuid::new_v4();
        let requester_shift_id = Uuid::new_v4();
        let owner = Uuid::new_v4();

        let mut swaps = MockSwapRepository::new();
        swaps.expect_find_by_id().returning(move |id| {
            Ok(Some(make_swap(id, requester_shift_id, SwapStatus::Pending)))
        });

        let mut shifts = MockShiftRepository::new();
        shifts.expect_find_by_id().returning(move |id| {
            Ok(Some(make_shift(id, owner, far_future(), 8, 16)))
        });

        let svc = service(swaps, shifts, MockNotificationRepository::new());

        let output = svc.cancel(swap_id, Uuid::new_v4()).await;
        assert!(matches!(
            output.unwrap_err(),
            SchedulingServiceError::PreconditionFailed(_)
        ));
    }
}
