//! Native client trait for inter-module communication
//!
//! This trait defines the API that the web layer and other modules use to
//! interact with the academics service. NO HTTP - direct function calls.

use super::{
    error::AcademicsError,
    model::{
        AcademicYear, Assignment, AssignmentSubmission, BackfillReport, Class, Grade, NewAssignment,
        NewSubject, NewSubmission, Student, Subject, SubjectAssignment, Teacher,
        TeachingAssignment, TeachingBinding,
    },
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use uuid::Uuid;

/// Academics service API for inter-module communication
#[async_trait]
pub trait AcademicsApi: Send + Sync {
    // ===== Resolution queries =====

    /// Academic year the service currently considers active
    fn current_academic_year(&self) -> AcademicYear;

    /// Bindings of a teacher valid in the given academic year
    async fn resolve_current_teaching(
        &self,
        teacher_id: Uuid,
        as_of_year: AcademicYear,
    ) -> Result<BTreeSet<TeachingBinding>, AcademicsError>;

    /// Bindings of a class valid in the given academic year
    async fn resolve_class_roster(
        &self,
        class_id: Uuid,
        as_of_year: AcademicYear,
    ) -> Result<BTreeSet<TeachingBinding>, AcademicsError>;

    /// All bindings of a teacher regardless of academic year
    async fn teaching_history(
        &self,
        teacher_id: Uuid,
    ) -> Result<BTreeSet<TeachingBinding>, AcademicsError>;

    /// Classes a subject belongs to through any path
    async fn classes_for_subject(&self, subject_id: Uuid) -> Result<Vec<Class>, AcademicsError>;

    /// Subjects taught in a class through any path
    async fn subjects_for_class(&self, class_id: Uuid) -> Result<Vec<Subject>, AcademicsError>;

    /// Teacher responsible for a subject (direct over inherited)
    async fn effective_teacher_for_subject(
        &self,
        subject_id: Uuid,
    ) -> Result<Option<Teacher>, AcademicsError>;

    /// Primary teacher of a class
    async fn primary_teacher(&self, class_id: Uuid) -> Result<Option<Teacher>, AcademicsError>;

    /// Classes where the teacher is primary in the given academic year
    async fn primary_classes(
        &self,
        teacher_id: Uuid,
        year: AcademicYear,
    ) -> Result<Vec<Class>, AcademicsError>;

    // ===== Directory =====

    async fn create_class(&self, name: &str) -> Result<Class, AcademicsError>;

    async fn create_teacher(
        &self,
        employee_code: &str,
        full_name: &str,
        is_class_teacher: bool,
    ) -> Result<Teacher, AcademicsError>;

    async fn create_student(
        &self,
        admission_number: &str,
        full_name: &str,
        current_class_id: Option<Uuid>,
        guardian_id: Option<Uuid>,
    ) -> Result<Student, AcademicsError>;

    /// Create a subject; the year label is stored in canonical form
    async fn create_subject(&self, input: NewSubject) -> Result<Subject, AcademicsError>;

    /// Record that a teacher teaches a subject in an academic year
    async fn assign_teacher_to_subject(
        &self,
        teacher_id: Uuid,
        subject_id: Uuid,
        academic_year: AcademicYear,
    ) -> Result<SubjectAssignment, AcademicsError>;

    // ===== Mutations =====

    /// Replace a class roster; the first teacher becomes primary
    async fn set_teacher_roster(
        &self,
        class_id: Uuid,
        ordered_teachers: &[Uuid],
    ) -> Result<Vec<TeachingAssignment>, AcademicsError>;

    /// Replace the subject set of each listed teaching assignment
    async fn assign_subjects_to_assignment(
        &self,
        teaching_assignment_ids: &[Uuid],
        subject_ids: &[Uuid],
    ) -> Result<(), AcademicsError>;

    /// Set the subjects of every teaching assignment of a class
    async fn assign_subjects_to_class(
        &self,
        class_id: Uuid,
        subject_ids: &[Uuid],
    ) -> Result<(), AcademicsError>;

    /// Create an assignment authored by a teacher
    async fn create_assignment(
        &self,
        teacher_id: Uuid,
        input: NewAssignment,
    ) -> Result<Assignment, AcademicsError>;

    /// Publish a draft assignment
    async fn publish_assignment(&self, assignment_id: Uuid) -> Result<Assignment, AcademicsError>;

    /// Move the due date of an assignment
    async fn update_assignment_due(
        &self,
        assignment_id: Uuid,
        due_at: DateTime<Utc>,
    ) -> Result<Assignment, AcademicsError>;

    /// Submit work for an assignment
    async fn submit(
        &self,
        assignment_id: Uuid,
        student_id: Uuid,
        input: NewSubmission,
        submitted_at: DateTime<Utc>,
    ) -> Result<AssignmentSubmission, AcademicsError>;

    /// Grade a submission (overwrites an existing grade)
    async fn grade(
        &self,
        submission_id: Uuid,
        value: u8,
        feedback: &str,
    ) -> Result<AssignmentSubmission, AcademicsError>;

    /// Record a grade book entry
    async fn record_grade(
        &self,
        student_id: Uuid,
        subject_id: Uuid,
        marks: Decimal,
        remarks: &str,
    ) -> Result<Grade, AcademicsError>;

    /// Correct a grade book entry
    async fn update_grade(
        &self,
        grade_id: Uuid,
        marks: Decimal,
        remarks: &str,
    ) -> Result<Grade, AcademicsError>;

    /// Move legacy direct links into the junction tables
    async fn backfill_legacy_links(&self) -> Result<BackfillReport, AcademicsError>;
}
