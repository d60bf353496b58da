//! Input validation for academics operations

use crate::contract::AcademicsError;
use rust_decimal::Decimal;
use std::collections::HashSet;
use uuid::Uuid;

/// Upper bound for a submission grade and for grade book marks
pub const MAX_SCORE: u8 = 100;

/// Validate a required, non-blank name field with a maximum length
pub fn validate_name(field: &str, value: &str, max_len: usize) -> Result<(), AcademicsError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AcademicsError::validation(format!("{} cannot be empty", field)));
    }
    if trimmed.chars().count() > max_len {
        return Err(AcademicsError::validation(format!(
            "{} '{}' exceeds {} characters",
            field, trimmed, max_len
        )));
    }
    Ok(())
}

/// Validate a submission grade
pub fn validate_score(value: u8) -> Result<(), AcademicsError> {
    if value > MAX_SCORE {
        return Err(AcademicsError::validation(format!(
            "grade {} is outside 0..={}",
            value, MAX_SCORE
        )));
    }
    Ok(())
}

/// Validate grade book marks: 0.00 to 100.00 with at most two decimal places
pub fn validate_marks(marks: Decimal) -> Result<(), AcademicsError> {
    if marks < Decimal::ZERO || marks > Decimal::from(MAX_SCORE) {
        return Err(AcademicsError::validation(format!(
            "marks {} are outside 0..={}",
            marks, MAX_SCORE
        )));
    }
    if marks.round_dp(2) != marks {
        return Err(AcademicsError::validation(format!(
            "marks {} have more than two decimal places",
            marks
        )));
    }
    Ok(())
}

/// Validate assignment points against the configured maximum
pub fn validate_points(points: u32, max_points: u32) -> Result<(), AcademicsError> {
    if points > max_points {
        return Err(AcademicsError::validation(format!(
            "points {} exceed the maximum of {}",
            points, max_points
        )));
    }
    Ok(())
}

/// Reject repeated identifiers in an input list
pub fn ensure_distinct(resource: &str, ids: &[Uuid]) -> Result<(), AcademicsError> {
    let mut seen = HashSet::with_capacity(ids.len());
    for id in ids {
        if !seen.insert(*id) {
            return Err(AcademicsError::duplicate(resource, id));
        }
    }
    Ok(())
}
