use std::sync::Arc;

use crate::domain::availability::AvailabilityRepository;
use crate::domain::context::ContextProvider;
use crate::domain::employee::EmployeeRepository;
use crate::domain::store::StoreRepository;
use crate::domain::time_off::TimeOffRepository;

/// Shared application state for the workforce service axum router.
pub struct WorkforceAppState {
    pub store_repo: Arc<dyn StoreRepository>,
    pub employee_repo: Arc<dyn EmployeeRepository>,
    pub availability_repo: Arc<dyn AvailabilityRepository>,
    pub time_off_repo: Arc<dyn TimeOffRepository>,
    pub context: Arc<dyn ContextProvider>,
}
