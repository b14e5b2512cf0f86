use std::sync::Arc;

use crate::config::SchedulingConfig;
use crate::domain::compliance::ComplianceEngine;
use crate::domain::forecaster::ForecastService;
use crate::domain::labor::LaborPlanner;
use crate::domain::lifecycle::ShiftLifecycleService;
use crate::domain::optimizer::ScheduleOptimizer;
use crate::domain::swap::SwapService;

/// Shared application state for the scheduling service axum router.
pub struct SchedulingAppState {
    pub forecasts: Arc<ForecastService>,
    pub labor: Arc<LaborPlanner>,
    pub compliance: Arc<ComplianceEngine>,
    pub optimizer: Arc<ScheduleOptimizer>,
    pub lifecycle: Arc<ShiftLifecycleService>,
    pub swaps: Arc<SwapService>,
    pub config: SchedulingConfig,
}
