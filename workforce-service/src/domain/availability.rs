use async_trait::async_trait;
use chrono::NaiveTime;
use serde::Deserialize;
use shared::types::Availability;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::WorkforceServiceError;

/// One day-of-week row in a full weekly availability replacement.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SetAvailability {
    /// 0 = Monday .. 6 = Sunday
    pub day_of_week: i16,
    pub is_available: bool,
    pub preferred_start: Option<NaiveTime>,
    pub preferred_end: Option<NaiveTime>,
}

impl SetAvailability {
    pub fn validate(&self) -> Result<(), WorkforceServiceError> {
        if !(0..=6).contains(&self.day_of_week) {
            return Err(WorkforceServiceError::BadRequest(format!(
                "day_of_week must be 0..=6, got {}",
                self.day_of_week
            )));
        }
        if let (Some(start), Some(end)) = (self.preferred_start, self.preferred_end)
            && start >= end
        {
            return Err(WorkforceServiceError::BadRequest(
                "preferred_start must be before preferred_end".into(),
            ));
        }
        Ok(())
    }
}

#[cfg_attr(feature = "test-support", mockall::automock)]
#[async_trait]
pub trait AvailabilityRepository: Send + Sync {
    async fn for_employee(
        &self,
        employee_id: Uuid,
    ) -> Result<Vec<Availability>, WorkforceServiceError>;
    /// Replaces the employee's whole weekly availability set in one transaction.
    async fn replace_for_employee(
        &self,
        employee_id: Uuid,
        rows: Vec<SetAvailability>,
    ) -> Result<Vec<Availability>, WorkforceServiceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_day() {
        let row = SetAvailability {
            day_of_week: 7,
            is_available: true,
            preferred_start: None,
            preferred_end: None,
        };
        assert!(matches!(
            row.validate(),
            Err(WorkforceServiceError::BadRequest(_))
        ));
    }

    #[test]
    fn rejects_inverted_window() {
        let row = SetAvailability {
            day_of_week: 2,
            is_available: true,
            preferred_start: NaiveTime::from_hms_opt(18, 0, 0),
            preferred_end: NaiveTime::from_hms_opt(9, 0, 0),
        };
        assert!(row.validate().is_err());
    }

    #[test]
    fn accepts_plain_unavailable_day() {
        let row = SetAvailability {
            day_of_week: 6,
            is_available: false,
            preferred_start: None,
            preferred_end: None,
        };
        assert!(row.validate().is_ok());
    }
}
