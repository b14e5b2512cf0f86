use chrono::{DateTime, Utc};
use shared::types::{ShiftSwap, SwapStatus};
use uuid::Uuid;

/// Wrapper for a swap in `Pending` status.
/// Consuming `accept` moves it to `AcceptedSwap`; `deny`/`cancel` close it.
pub struct PendingSwap {
    inner: ShiftSwap,
}

/// Wrapper for a swap in `Accepted` status, awaiting manager decision.
pub struct AcceptedSwap {
    inner: ShiftSwap,
}

/// Terminal state: manager approved and the shifts were exchanged.
pub struct ApprovedSwap {
    inner: ShiftSwap,
}

/// Terminal state: denied or cancelled.
pub struct ClosedSwap {
    inner: ShiftSwap,
}

impl PendingSwap {
    pub fn from_swap(swap: ShiftSwap) -> Option<Self> {
        if swap.status == SwapStatus::Pending {
            Some(Self { inner: swap })
        } else {
            None
        }
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn requester_shift_id(&self) -> Uuid {
        self.inner.requester_shift_id
    }

    pub fn accept(mut self, requested_shift_id: Uuid) -> (AcceptedSwap, Uuid, SwapStatus) {
        let id = self.inner.id;
        self.inner.status = SwapStatus::Accepted;
        self.inner.requested_shift_id = Some(requested_shift_id);
        (AcceptedSwap { inner: self.inner }, id, SwapStatus::Accepted)
    }

    pub fn deny(mut self) -> (ClosedSwap, Uuid, SwapStatus) {
        let id = self.inner.id;
        self.inner.status = SwapStatus::Denied;
        (ClosedSwap { inner: self.inner }, id, SwapStatus::Denied)
    }

    pub fn cancel(mut self) -> (ClosedSwap, Uuid, SwapStatus) {
        let id = self.inner.id;
        self.inner.status = SwapStatus::Cancelled;
        (ClosedSwap { inner: self.inner }, id, SwapStatus::Cancelled)
    }
}

impl AcceptedSwap {
    pub fn from_swap(swap: ShiftSwap) -> Option<Self> {
        if swap.status == SwapStatus::Accepted {
            Some(Self { inner: swap })
        } else {
            None
        }
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn requester_shift_id(&self) -> Uuid {
        self.inner.requester_shift_id
    }

    pub fn requested_shift_id(&self) -> Option<Uuid> {
        self.inner.requested_shift_id
    }

    pub fn approve(
        mut self,
        approved_by: Uuid,
        approved_at: DateTime<Utc>,
    ) -> (ApprovedSwap, Uuid, SwapStatus) {
        let id = self.inner.id;
        self.inner.status = SwapStatus::Approved;
        self.inner.approved_by = Some(approved_by);
        self.inner.approved_at = Some(approved_at);
        (ApprovedSwap { inner: self.inner }, id, SwapStatus::Approved)
    }

    pub fn deny(mut self) -> (ClosedSwap, Uuid, SwapStatus) {
        let id = self.inner.id;
        self.inner.status = SwapStatus::Denied;
        (ClosedSwap { inner: self.inner }, id, SwapStatus::Denied)
    }

    pub fn cancel(mut self) -> (ClosedSwap, Uuid, SwapStatus) {
        let id = self.inner.id;
        self.inner.status = SwapStatus::Cancelled;
        (ClosedSwap { inner: self.inner }, id, SwapStatus::Cancelled)
    }
}

impl ApprovedSwap {
    pub fn into_inner(self) -> ShiftSwap {
        self.inner
    }
}

impl ClosedSwap {
    pub fn into_inner(self) -> ShiftSwap {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_swap(status: SwapStatus) -> ShiftSwap {
        ShiftSwap {
            id: Uuid::new_v4(),
            requester_shift_id: Uuid::new_v4(),
            requested_shift_id: None,
            notes: None,
            status,
            approved_by: None,
            approved_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn pending_from_pending_succeeds() {
        assert!(PendingSwap::from_swap(make_swap(SwapStatus::Pending)).is_some());
    }

    #[test]
    fn pending_from_other_statuses_fails() {
        for status in [
            SwapStatus::Accepted,
            SwapStatus::Approved,
            SwapStatus::Denied,
            SwapStatus::Cancelled,
        ] {
            assert!(PendingSwap::from_swap(make_swap(status)).is_none());
        }
    }

    #[test]
    fn accepted_from_non_accepted_fails() {
        for status in [SwapStatus::Pending, SwapStatus::Approved, SwapStatus::Denied] {
            assert!(AcceptedSwap::from_swap(make_swap(status)).is_none());
        }
    }

    #[test]
    fn accept_attaches_the_offered_shift() {
        let swap = make_swap(SwapStatus::Pending);
        let swap_id = swap.id;
        let pending = PendingSwap::from_swap(swap).unwrap();

        let offered = Uuid::new_v4();
        let (accepted, id, status) = pending.accept(offered);
        assert_eq!(id, swap_id);
        assert_eq!(status, SwapStatus::Accepted);
        assert_eq!(accepted.requested_shift_id(), Some(offered));
    }

    #[test]
    fn approve_stamps_approver_and_time() {
        let swap = make_swap(SwapStatus::Pending);
        let pending = PendingSwap::from_swap(swap).unwrap();
        let (accepted, _, _) = pending.accept(Uuid::new_v4());

        let approver = Uuid::new_v4();
        let at = Utc::now();
        let (approved, _, status) = accepted.approve(approver, at);
        assert_eq!(status, SwapStatus::Approved);

        let inner = approved.into_inner();
        assert_eq!(inner.approved_by, Some(approver));
        assert_eq!(inner.approved_at, Some(at));
    }

    #[test]
    fn both_open_states_can_close() {
        let pending = PendingSwap::from_swap(make_swap(SwapStatus::Pending)).unwrap();
        let (_, _, status) = pending.deny();
        assert_eq!(status, SwapStatus::Denied);

        let pending = PendingSwap::from_swap(make_swap(SwapStatus::Pending)).unwrap();
        let (accepted, _, _) = pending.accept(Uuid::new_v4());
        let (closed, _, status) = accepted.cancel();
        assert_eq!(status, SwapStatus::Cancelled);
        assert_eq!(closed.into_inner().status, SwapStatus::Cancelled);
    }
}
