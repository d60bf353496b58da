//! Contract models for academics service
//!
//! These models are transport-agnostic and used for inter-module communication.
//! NO serde derives - these are pure domain models.

use super::AcademicsError;
use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Month (1-based) in which a new academic year begins unless configured otherwise
pub const DEFAULT_START_MONTH: u32 = 8;

/// Academic year, identified by the calendar year it starts in and rendered
/// as `"YYYY-YYYY"`.
///
/// Stored subject labels may still use the legacy plain `"YYYY"` form, which
/// denotes the academic year starting in that calendar year. Every comparison
/// goes through [`AcademicYear::matches`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AcademicYear {
    start: i32,
}

impl AcademicYear {
    /// Academic year beginning in the given calendar year
    pub const fn starting(start: i32) -> Self {
        Self { start }
    }

    pub fn end_year(&self) -> i32 {
        self.start + 1
    }

    /// Academic year containing `instant` for a year that begins in `start_month`
    pub fn containing(instant: DateTime<Utc>, start_month: u32) -> Self {
        if instant.month() >= start_month {
            Self::starting(instant.year())
        } else {
            Self::starting(instant.year() - 1)
        }
    }

    /// Parse a canonical `"YYYY-YYYY"` label or a legacy `"YYYY"` label
    pub fn parse(label: &str) -> Result<Self, AcademicsError> {
        let label = label.trim();
        match label.split_once('-') {
            Some((start, end)) => {
                let start = parse_year(start, label)?;
                let end = parse_year(end, label)?;
                if end != start + 1 {
                    return Err(AcademicsError::validation(format!(
                        "academic year '{}' must span two consecutive years",
                        label
                    )));
                }
                Ok(Self::starting(start))
            }
            None => Ok(Self::starting(parse_year(label, label)?)),
        }
    }

    /// Whether a stored label denotes this academic year. Unparseable labels never match.
    pub fn matches(&self, stored: &str) -> bool {
        Self::parse(stored).is_ok_and(|year| year == *self)
    }

    /// Canonical rendering of any accepted label
    pub fn canonicalize(label: &str) -> Result<String, AcademicsError> {
        Self::parse(label).map(|year| year.to_string())
    }
}

fn parse_year(part: &str, label: &str) -> Result<i32, AcademicsError> {
    if part.len() != 4 || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AcademicsError::validation(format!(
            "invalid academic year '{}': expected YYYY-YYYY",
            label
        )));
    }
    part.parse::<i32>().map_err(|_| {
        AcademicsError::validation(format!("invalid academic year '{}'", label))
    })
}

impl fmt::Display for AcademicYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:04}", self.start, self.end_year())
    }
}

impl FromStr for AcademicYear {
    type Err = AcademicsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A school class (e.g. "10A")
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Class {
    pub id: Uuid,
    /// Unique class name
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Teacher profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Teacher {
    pub id: Uuid,
    /// Unique employee code
    pub employee_code: String,
    pub full_name: String,
    /// Marked by administration as a class (form) teacher
    pub is_class_teacher: bool,
}

/// Student profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Student {
    pub id: Uuid,
    /// Unique admission number
    pub admission_number: String,
    pub full_name: String,
    /// Class the student is currently enrolled in
    pub current_class_id: Option<Uuid>,
    /// Guardian responsible for the student
    pub guardian_id: Option<Uuid>,
}

/// Subject taught in a given term and academic year.
///
/// `direct_class_id` and `direct_teacher_id` are legacy links kept for reads
/// until they are backfilled into the teaching and subject-assignment
/// junctions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub id: Uuid,
    pub name: String,
    /// Legacy direct class link
    pub direct_class_id: Option<Uuid>,
    /// Legacy direct teacher link
    pub direct_teacher_id: Option<Uuid>,
    pub term: String,
    /// Stored academic year label ("YYYY-YYYY", or "YYYY" on legacy rows)
    pub academic_year: String,
}

/// Class x Teacher junction with the subjects the teacher teaches there
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeachingAssignment {
    pub id: Uuid,
    pub class_id: Uuid,
    pub teacher_id: Uuid,
    /// At most one row per class carries this flag
    pub is_primary: bool,
    /// Reset every time the class roster is replaced
    pub date_assigned: DateTime<Utc>,
    pub subject_ids: Vec<Uuid>,
}

/// A resolved (teacher, class, subject) triple valid for one academic year
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TeachingBinding {
    pub teacher_id: Uuid,
    pub class_id: Uuid,
    pub subject_id: Uuid,
    pub is_primary: bool,
}

/// Teacher x Subject x Academic year junction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectAssignment {
    pub id: Uuid,
    pub teacher_id: Uuid,
    pub subject_id: Uuid,
    /// Canonical "YYYY-YYYY" label
    pub academic_year: String,
    pub assigned_at: DateTime<Utc>,
}

/// Publication state of an assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Publication {
    Draft,
    Published,
}

/// Deadline state of an assignment, always computed against a clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deadline {
    Open,
    PastDue,
}

/// Academic task set by a teacher for one subject in one class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub subject_id: Uuid,
    pub class_id: Uuid,
    /// Authoring teacher
    pub teacher_id: Uuid,
    pub due_at: DateTime<Utc>,
    pub points: u32,
    pub publication: Publication,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Assignment {
    pub fn is_past_due(&self, now: DateTime<Utc>) -> bool {
        now > self.due_at
    }

    pub fn deadline(&self, now: DateTime<Utc>) -> Deadline {
        if self.is_past_due(now) {
            Deadline::PastDue
        } else {
            Deadline::Open
        }
    }

    pub fn is_published(&self) -> bool {
        self.publication == Publication::Published
    }
}

/// Input for creating an assignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAssignment {
    pub title: String,
    pub description: String,
    pub subject_id: Uuid,
    pub class_id: Uuid,
    pub due_at: DateTime<Utc>,
    pub points: u32,
    /// Publish immediately instead of creating a draft
    pub publish: bool,
}

/// A student's submission for an assignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentSubmission {
    pub id: Uuid,
    pub assignment_id: Uuid,
    pub student_id: Uuid,
    pub submitted_at: DateTime<Utc>,
    /// Reference to the stored file (storage itself is external)
    pub file_ref: String,
    pub comments: String,
    /// Score in [0, 100], once graded
    pub grade: Option<u8>,
    pub feedback: String,
    /// Frozen at creation time
    pub is_late: bool,
}

/// Input for a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubmission {
    pub file_ref: String,
    pub comments: String,
}

/// Grade book entry: one per (student, subject)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grade {
    pub id: Uuid,
    pub student_id: Uuid,
    pub subject_id: Uuid,
    /// Marks in [0, 100] with at most two decimal places
    pub marks: Decimal,
    pub remarks: String,
    pub recorded_at: DateTime<Utc>,
}

/// Input for creating a subject
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubject {
    pub name: String,
    pub term: String,
    /// Any accepted academic year label; stored canonically
    pub academic_year: String,
    pub direct_class_id: Option<Uuid>,
    pub direct_teacher_id: Option<Uuid>,
}

/// Outcome of migrating legacy direct links into the junction tables
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackfillReport {
    /// (teaching assignment, subject) links added
    pub roster_links_added: usize,
    /// Subject assignments created from legacy direct teachers
    pub subject_assignments_created: usize,
    /// Subjects whose legacy year label was rewritten
    pub academic_years_normalized: usize,
    /// Subjects whose direct class has no teaching assignment to attach to
    pub skipped_subjects: Vec<Uuid>,
}

/// User role as stored on the account record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Teacher,
    Student,
    Guardian,
}

impl FromStr for Role {
    type Err = super::AcademicsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "teacher" => Ok(Self::Teacher),
            "student" => Ok(Self::Student),
            "guardian" => Ok(Self::Guardian),
            other => Err(super::AcademicsError::Validation {
                message: format!("unknown role '{}'", other),
            }),
        }
    }
}

/// Authenticated actor, resolved once per session from the account role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Admin { user_id: Uuid },
    Teacher { teacher_id: Uuid },
    Student { student_id: Uuid },
    Guardian { guardian_id: Uuid },
}

impl Actor {
    /// Build an actor from the stored role string and the id of the matching profile
    pub fn from_role(role: &str, profile_id: Uuid) -> Result<Self, super::AcademicsError> {
        Ok(match role.parse::<Role>()? {
            Role::Admin => Self::Admin { user_id: profile_id },
            Role::Teacher => Self::Teacher { teacher_id: profile_id },
            Role::Student => Self::Student { student_id: profile_id },
            Role::Guardian => Self::Guardian { guardian_id: profile_id },
        })
    }

    pub fn role(&self) -> Role {
        match self {
            Self::Admin { .. } => Role::Admin,
            Self::Teacher { .. } => Role::Teacher,
            Self::Student { .. } => Role::Student,
            Self::Guardian { .. } => Role::Guardian,
        }
    }

    pub fn teacher_id(&self) -> Option<Uuid> {
        match self {
            Self::Teacher { teacher_id } => Some(*teacher_id),
            _ => None,
        }
    }

    pub fn student_id(&self) -> Option<Uuid> {
        match self {
            Self::Student { student_id } => Some(*student_id),
            _ => None,
        }
    }

    /// Whether this actor may read the given student's records
    pub fn can_view_student(&self, student: &Student) -> bool {
        match self {
            Self::Admin { .. } | Self::Teacher { .. } => true,
            Self::Student { student_id } => *student_id == student.id,
            Self::Guardian { guardian_id } => student.guardian_id == Some(*guardian_id),
        }
    }
}
