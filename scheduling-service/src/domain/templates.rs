use chrono::NaiveTime;
use serde::Serialize;
use utoipa::ToSchema;

/// One of the eight shift patterns the optimizer may assign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct ShiftTemplate {
    pub start_hour: i16,
    pub end_hour: i16,
    pub break_minutes: i32,
}

impl ShiftTemplate {
    pub fn duration_hours(&self) -> f64 {
        f64::from(self.end_hour as i32 - self.start_hour as i32)
    }

    pub fn working_hours(&self) -> f64 {
        self.duration_hours() - f64::from(self.break_minutes) / 60.0
    }

    pub fn start_time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.start_hour as u32, 0, 0).expect("template hour in range")
    }

    pub fn end_time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.end_hour as u32, 0, 0).expect("template hour in range")
    }

    /// Whether the template covers the given hour slot.
    pub fn covers(&self, hour: i16) -> bool {
        self.start_hour <= hour && hour < self.end_hour
    }
}

/// The fixed shift catalog: six 8-hour-elapsed templates with a 30-minute
/// break and two 9-hour-elapsed templates with a full hour. Template index
/// is the stable identifier used by locks and overrides.
pub const SHIFT_TEMPLATES: [ShiftTemplate; 8] = [
    ShiftTemplate { start_hour: 8, end_hour: 16, break_minutes: 30 },
    ShiftTemplate { start_hour: 9, end_hour: 17, break_minutes: 30 },
    ShiftTemplate { start_hour: 10, end_hour: 18, break_minutes: 30 },
    ShiftTemplate { start_hour: 11, end_hour: 19, break_minutes: 30 },
    ShiftTemplate { start_hour: 12, end_hour: 20, break_minutes: 30 },
    ShiftTemplate { start_hour: 14, end_hour: 22, break_minutes: 30 },
    ShiftTemplate { start_hour: 8, end_hour: 17, break_minutes: 60 },
    ShiftTemplate { start_hour: 13, end_hour: 22, break_minutes: 60 },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_expected_working_hours() {
        for template in &SHIFT_TEMPLATES[..6] {
            assert_eq!(template.duration_hours(), 8.0);
            assert_eq!(template.working_hours(), 7.5);
        }
        for template in &SHIFT_TEMPLATES[6..] {
            assert_eq!(template.duration_hours(), 9.0);
            assert_eq!(template.working_hours(), 8.0);
        }
    }

    #[test]
    fn coverage_is_half_open() {
        let template = SHIFT_TEMPLATES[0];
        assert!(template.covers(8));
        assert!(template.covers(15));
        assert!(!template.covers(16));
        assert!(!template.covers(7));
    }
}
