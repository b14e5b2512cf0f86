use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use shared::types::{EmployeeContext, EmployeeStatus, SchedulingContext, TimeOffWindow};
use uuid::Uuid;

use crate::domain::availability::AvailabilityRepository;
use crate::domain::employee::EmployeeRepository;
use crate::domain::store::StoreRepository;
use crate::domain::time_off::TimeOffRepository;
use crate::error::WorkforceServiceError;

/// Read-side view used by the scheduling service: one store's active
/// employees together with their availability rows and approved absences
/// for a Monday-aligned week.
#[cfg_attr(feature = "test-support", mockall::automock)]
#[async_trait]
pub trait ContextProvider: Send + Sync {
    async fn scheduling_context(
        &self,
        store_id: Uuid,
        week_start: NaiveDate,
    ) -> Result<SchedulingContext, WorkforceServiceError>;
}

pub struct ContextService {
    stores: Arc<dyn StoreRepository>,
    employees: Arc<dyn EmployeeRepository>,
    availability: Arc<dyn AvailabilityRepository>,
    time_off: Arc<dyn TimeOffRepository>,
}

impl ContextService {
    pub fn new(
        stores: Arc<dyn StoreRepository>,
        employees: Arc<dyn EmployeeRepository>,
        availability: Arc<dyn AvailabilityRepository>,
        time_off: Arc<dyn TimeOffRepository>,
    ) -> Self {
        Self {
            stores,
            employees,
            availability,
            time_off,
        }
    }
}

#[async_trait]
impl ContextProvider for ContextService {
    #[tracing::instrument(skip(self))]
    async fn scheduling_context(
        &self,
        store_id: Uuid,
        week_start: NaiveDate,
    ) -> Result<SchedulingContext, WorkforceServiceError> {
        if !shared::time::is_monday(week_start) {
            return Err(WorkforceServiceError::BadRequest(
                "week_start must be a Monday".into(),
            ));
        }

        let store = self.stores.find_by_id(store_id).await?.ok_or_else(|| {
            WorkforceServiceError::NotFound(format!("Store {store_id} not found"))
        })?;

        let week_end = shared::time::week_end(week_start);
        let mut employees = Vec::new();

        for employee in self.employees.find_all(Some(store_id)).await? {
            if employee.status != EmployeeStatus::Active {
                continue;
            }

            let availability = self.availability.for_employee(employee.id).await?;
            let time_off = self
                .time_off
                .approved_overlapping(employee.id, week_start, week_end)
                .await?
                .into_iter()
                .map(|r| TimeOffWindow {
                    start_date: r.start_date,
                    end_date: r.end_date,
                })
                .collect();

            employees.push(EmployeeContext {
                employee,
                availability,
                time_off,
            });
        }

        Ok(SchedulingContext {
            store,
            week_start,
            employees,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::availability::MockAvailabilityRepository;
    use crate::domain::employee::MockEmployeeRepository;
    use crate::domain::store::MockStoreRepository;
    use crate::domain::time_off::MockTimeOffRepository;
    use chrono::{NaiveTime, Utc};
    use shared::types::{Employee, Store, TimeOffRequest, TimeOffStatus};

    fn make_store(id: Uuid) -> Store {
        Store {
            id,
            name: "Downtown".into(),
            code: "DT-01".into(),
            address: None,
            operating_start: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            operating_end: NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn make_employee(store_id: Uuid, status: EmployeeStatus) -> Employee {
        Employee {
            id: Uuid::new_v4(),
            store_id,
            first_name: "Ana".into(),
            last_name: "Reyes".into(),
            hire_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn service(
        stores: MockStoreRepository,
        employees: MockEmployeeRepository,
        availability: MockAvailabilityRepository,
        time_off: MockTimeOffRepository,
    ) -> ContextService {
        ContextService::new(
            Arc::new(stores),
            Arc::new(employees),
            Arc::new(availability),
            Arc::new(time_off),
        )
    }

    #[tokio::test]
    async fn rejects_non_monday_week_start() {
        let svc = service(
            MockStoreRepository::new(),
            MockEmployeeRepository::new(),
            MockAvailabilityRepository::new(),
            MockTimeOffRepository::new(),
        );

        // 2025-01-07 is a Tuesday
        let tuesday = NaiveDate::from_ymd_opt(2025, 1, 7).unwrap();
        let output = svc.scheduling_context(Uuid::new_v4(), tuesday).await;

        assert!(matches!(
            output.unwrap_err(),
            WorkforceServiceError::BadRequest(_)
        ));
    }

    #[tokio::test]
    async fn unknown_store_is_not_found() {
        let mut stores = MockStoreRepository::new();
        stores.expect_find_by_id().returning(|_| Ok(None));

        let svc = service(
            stores,
            MockEmployeeRepository::new(),
            MockAvailabilityRepository::new(),
            MockTimeOffRepository::new(),
        );

        let monday = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let output = svc.scheduling_context(Uuid::new_v4(), monday).await;

        assert!(matches!(
            output.unwrap_err(),
            WorkforceServiceError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn excludes_inactive_employees_and_maps_time_off() {
        let store_id = Uuid::new_v4();
        let active = make_employee(store_id, EmployeeStatus::Active);
        let inactive = make_employee(store_id, EmployeeStatus::Inactive);
        let active_id = active.id;

        let mut stores = MockStoreRepository::new();
        let store = make_store(store_id);
        stores
            .expect_find_by_id()
            .returning(move |_| Ok(Some(store.clone())));

        let mut employees = MockEmployeeRepository::new();
        let roster = vec![active.clone(), inactive.clone()];
        employees
            .expect_find_all()
            .returning(move |_| Ok(roster.clone()));

        let mut availability = MockAvailabilityRepository::new();
        availability.expect_for_employee().returning(|_| Ok(vec![]));

        let mut time_off = MockTimeOffRepository::new();
        time_off.expect_approved_overlapping().returning(|id, _, _| {
            Ok(vec![TimeOffRequest {
                id: Uuid::new_v4(),
                employee_id: id,
                start_date: NaiveDate::from_ymd_opt(2025, 1, 8).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2025, 1, 9).unwrap(),
                reason: None,
                status: TimeOffStatus::Approved,
                approved_by: None,
                approved_at: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            }])
        });

        let svc = service(stores, employees, availability, time_off);

        let monday = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let context = svc.scheduling_context(store_id, monday).await.unwrap();

        assert_eq!(context.employees.len(), 1);
        assert_eq!(context.employees[0].employee.id, active_id);
        assert_eq!(context.employees[0].time_off.len(), 1);
        assert_eq!(
            context.employees[0].time_off[0].start_date,
            NaiveDate::from_ymd_opt(2025, 1, 8).unwrap()
        );
    }
}
