//! Repository traits for data access
//!
//! These traits define the interface for data access operations.
//! Implementations are in infra/storage/repositories.rs

use super::backfill::BackfillPlan;
use crate::contract::{
    Assignment, AssignmentSubmission, Class, Grade, Student, Subject, SubjectAssignment, Teacher,
    TeachingAssignment,
};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

/// Storage failures the domain needs to tell apart from generic errors.
///
/// Repositories wrap these in their `anyhow::Error` so the service can
/// downcast them.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),
}

/// Classes, teachers and students
#[async_trait]
pub trait DirectoryRepository: Send + Sync {
    async fn create_class(&self, class: &Class) -> Result<Class>;

    async fn find_class(&self, id: Uuid) -> Result<Option<Class>>;

    async fn find_classes(&self, ids: &[Uuid]) -> Result<Vec<Class>>;

    async fn create_teacher(&self, teacher: &Teacher) -> Result<Teacher>;

    async fn find_teacher(&self, id: Uuid) -> Result<Option<Teacher>>;

    async fn find_teachers(&self, ids: &[Uuid]) -> Result<Vec<Teacher>>;

    async fn create_student(&self, student: &Student) -> Result<Student>;

    async fn find_student(&self, id: Uuid) -> Result<Option<Student>>;

    /// Students whose current class is `class_id`
    async fn find_students_in_class(&self, class_id: Uuid) -> Result<Vec<Student>>;
}

/// Subjects and the teacher/subject/year junction
#[async_trait]
pub trait SubjectRepository: Send + Sync {
    async fn create(&self, subject: &Subject) -> Result<Subject>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Subject>>;

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Subject>>;

    /// Subjects whose legacy direct class is `class_id`
    async fn find_by_direct_class(&self, class_id: Uuid) -> Result<Vec<Subject>>;

    async fn list_all(&self) -> Result<Vec<Subject>>;

    async fn create_subject_assignment(
        &self,
        assignment: &SubjectAssignment,
    ) -> Result<SubjectAssignment>;

    /// Subject assignments of a teacher, optionally restricted to one canonical year label
    async fn find_subject_assignments(
        &self,
        teacher_id: Uuid,
        academic_year: Option<&str>,
    ) -> Result<Vec<SubjectAssignment>>;

    /// Apply a legacy backfill plan in a single transaction
    async fn apply_backfill(&self, plan: &BackfillPlan) -> Result<()>;
}

/// Class x Teacher junction and its subject sets
#[async_trait]
pub trait TeachingRepository: Send + Sync {
    async fn find_by_teacher(&self, teacher_id: Uuid) -> Result<Vec<TeachingAssignment>>;

    async fn find_by_class(&self, class_id: Uuid) -> Result<Vec<TeachingAssignment>>;

    /// Assignments whose subject set contains `subject_id`
    async fn find_by_subject(&self, subject_id: Uuid) -> Result<Vec<TeachingAssignment>>;

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<TeachingAssignment>>;

    /// Delete every assignment of the class and insert `roster`, atomically
    async fn replace_roster(
        &self,
        class_id: Uuid,
        roster: &[TeachingAssignment],
    ) -> Result<Vec<TeachingAssignment>>;

    /// Replace the subject set of each listed assignment, atomically
    async fn set_subjects(&self, teaching_ids: &[Uuid], subject_ids: &[Uuid]) -> Result<()>;

    /// Set the subject set of every assignment of the class and move the legacy
    /// direct class link of subjects to match, atomically
    async fn reassign_class_subjects(&self, class_id: Uuid, subject_ids: &[Uuid]) -> Result<()>;
}

/// Assignments, submissions and the grade book
#[async_trait]
pub trait CourseworkRepository: Send + Sync {
    async fn create_assignment(&self, assignment: &Assignment) -> Result<Assignment>;

    async fn find_assignment(&self, id: Uuid) -> Result<Option<Assignment>>;

    async fn update_assignment(&self, assignment: &Assignment) -> Result<Assignment>;

    async fn create_submission(
        &self,
        submission: &AssignmentSubmission,
    ) -> Result<AssignmentSubmission>;

    async fn find_submission_for(
        &self,
        assignment_id: Uuid,
        student_id: Uuid,
    ) -> Result<Option<AssignmentSubmission>>;

    /// Store grade and feedback; everything else on the row is left untouched
    async fn update_submission_grade(
        &self,
        id: Uuid,
        grade: u8,
        feedback: &str,
    ) -> Result<Option<AssignmentSubmission>>;

    async fn create_grade(&self, grade: &Grade) -> Result<Grade>;

    async fn find_grade(&self, id: Uuid) -> Result<Option<Grade>>;

    async fn find_grade_for(&self, student_id: Uuid, subject_id: Uuid) -> Result<Option<Grade>>;

    async fn find_grades_for_student(&self, student_id: Uuid) -> Result<Vec<Grade>>;

    async fn update_grade(&self, grade: &Grade) -> Result<Grade>;
}

/// Repository set handed to the domain service
#[derive(Clone)]
pub struct Repositories {
    pub directory: Arc<dyn DirectoryRepository>,
    pub subjects: Arc<dyn SubjectRepository>,
    pub teaching: Arc<dyn TeachingRepository>,
    pub coursework: Arc<dyn CourseworkRepository>,
}
