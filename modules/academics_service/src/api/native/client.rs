//! Native client implementation - wraps domain service for in-process calls

use crate::contract::{
    AcademicYear, AcademicsApi, AcademicsError, Assignment, AssignmentSubmission, BackfillReport,
    Class, Grade, NewAssignment, NewSubject, NewSubmission, Student, Subject, SubjectAssignment,
    Teacher, TeachingAssignment, TeachingBinding,
};
use crate::domain::Service;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::sync::Arc;
use uuid::Uuid;

/// Native client implementation that directly calls the domain service
///
/// This client is used for in-process communication without a transport in
/// between. Callers hold it as `Arc<dyn AcademicsApi>`.
#[derive(Clone)]
pub struct NativeClient {
    service: Arc<Service>,
}

impl NativeClient {
    /// Create a new native client
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl AcademicsApi for NativeClient {
    fn current_academic_year(&self) -> AcademicYear {
        self.service.current_academic_year()
    }

    async fn resolve_current_teaching(
        &self,
        teacher_id: Uuid,
        as_of_year: AcademicYear,
    ) -> Result<BTreeSet<TeachingBinding>, AcademicsError> {
        self.service
            .resolve_current_teaching(teacher_id, as_of_year)
            .await
    }

    async fn resolve_class_roster(
        &self,
        class_id: Uuid,
        as_of_year: AcademicYear,
    ) -> Result<BTreeSet<TeachingBinding>, AcademicsError> {
        self.service.resolve_class_roster(class_id, as_of_year).await
    }

    async fn teaching_history(
        &self,
        teacher_id: Uuid,
    ) -> Result<BTreeSet<TeachingBinding>, AcademicsError> {
        self.service.teaching_history(teacher_id).await
    }

    async fn classes_for_subject(&self, subject_id: Uuid) -> Result<Vec<Class>, AcademicsError> {
        self.service.classes_for_subject(subject_id).await
    }

    async fn subjects_for_class(&self, class_id: Uuid) -> Result<Vec<Subject>, AcademicsError> {
        self.service.subjects_for_class(class_id).await
    }

    async fn effective_teacher_for_subject(
        &self,
        subject_id: Uuid,
    ) -> Result<Option<Teacher>, AcademicsError> {
        self.service.effective_teacher_for_subject(subject_id).await
    }

    async fn primary_teacher(&self, class_id: Uuid) -> Result<Option<Teacher>, AcademicsError> {
        self.service.primary_teacher(class_id).await
    }

    async fn primary_classes(
        &self,
        teacher_id: Uuid,
        year: AcademicYear,
    ) -> Result<Vec<Class>, AcademicsError> {
        self.service.primary_classes(teacher_id, year).await
    }

    async fn create_class(&self, name: &str) -> Result<Class, AcademicsError> {
        self.service.create_class(name).await
    }

    async fn create_teacher(
        &self,
        employee_code: &str,
        full_name: &str,
        is_class_teacher: bool,
    ) -> Result<Teacher, AcademicsError> {
        self.service
            .create_teacher(employee_code, full_name, is_class_teacher)
            .await
    }

    async fn create_student(
        &self,
        admission_number: &str,
        full_name: &str,
        current_class_id: Option<Uuid>,
        guardian_id: Option<Uuid>,
    ) -> Result<Student, AcademicsError> {
        self.service
            .create_student(admission_number, full_name, current_class_id, guardian_id)
            .await
    }

    async fn create_subject(&self, input: NewSubject) -> Result<Subject, AcademicsError> {
        self.service.create_subject(input).await
    }

    async fn assign_teacher_to_subject(
        &self,
        teacher_id: Uuid,
        subject_id: Uuid,
        academic_year: AcademicYear,
    ) -> Result<SubjectAssignment, AcademicsError> {
        self.service
            .assign_teacher_to_subject(teacher_id, subject_id, academic_year)
            .await
    }

    async fn set_teacher_roster(
        &self,
        class_id: Uuid,
        ordered_teachers: &[Uuid],
    ) -> Result<Vec<TeachingAssignment>, AcademicsError> {
        self.service
            .set_teacher_roster(class_id, ordered_teachers)
            .await
    }

    async fn assign_subjects_to_assignment(
        &self,
        teaching_assignment_ids: &[Uuid],
        subject_ids: &[Uuid],
    ) -> Result<(), AcademicsError> {
        self.service
            .assign_subjects_to_assignment(teaching_assignment_ids, subject_ids)
            .await
    }

    async fn assign_subjects_to_class(
        &self,
        class_id: Uuid,
        subject_ids: &[Uuid],
    ) -> Result<(), AcademicsError> {
        self.service.assign_subjects_to_class(class_id, subject_ids).await
    }

    async fn create_assignment(
        &self,
        teacher_id: Uuid,
        input: NewAssignment,
    ) -> Result<Assignment, AcademicsError> {
        self.service.create_assignment(teacher_id, input).await
    }

    async fn publish_assignment(&self, assignment_id: Uuid) -> Result<Assignment, AcademicsError> {
        self.service.publish_assignment(assignment_id).await
    }

    async fn update_assignment_due(
        &self,
        assignment_id: Uuid,
        due_at: DateTime<Utc>,
    ) -> Result<Assignment, AcademicsError> {
        self.service.update_assignment_due(assignment_id, due_at).await
    }

    async fn submit(
        &self,
        assignment_id: Uuid,
        student_id: Uuid,
        input: NewSubmission,
        submitted_at: DateTime<Utc>,
    ) -> Result<AssignmentSubmission, AcademicsError> {
        self.service
            .submit(assignment_id, student_id, input, submitted_at)
            .await
    }

    async fn grade(
        &self,
        submission_id: Uuid,
        value: u8,
        feedback: &str,
    ) -> Result<AssignmentSubmission, AcademicsError> {
        self.service.grade(submission_id, value, feedback).await
    }

    async fn record_grade(
        &self,
        student_id: Uuid,
        subject_id: Uuid,
        marks: Decimal,
        remarks: &str,
    ) -> Result<Grade, AcademicsError> {
        self.service
            .record_grade(student_id, subject_id, marks, remarks)
            .await
    }

    async fn update_grade(
        &self,
        grade_id: Uuid,
        marks: Decimal,
        remarks: &str,
    ) -> Result<Grade, AcademicsError> {
        self.service.update_grade(grade_id, marks, remarks).await
    }

    async fn backfill_legacy_links(&self) -> Result<BackfillReport, AcademicsError> {
        self.service.backfill_legacy_links().await
    }
}
