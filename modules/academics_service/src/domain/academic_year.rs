//! Active academic year derived from the clock

use super::clock::Clock;
use crate::contract::model::DEFAULT_START_MONTH;
use crate::contract::AcademicYear;

/// Current academic year label, e.g. "2025-2026", using the August boundary
pub fn current_academic_year(clock: &dyn Clock) -> String {
    AcademicYear::containing(clock.now(), DEFAULT_START_MONTH).to_string()
}
