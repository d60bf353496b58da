//! Assignment lifecycle, submissions and the grade book

use super::events::{
    AcademicEvent, AssignmentCreatedEvent, AssignmentPublishedEvent, SubmissionGradedEvent,
    SubmissionReceivedEvent,
};
use super::service::{internal, store_error, Service};
use super::validation::{validate_marks, validate_name, validate_points, validate_score};
use crate::contract::{
    AcademicsError, Actor, Assignment, AssignmentSubmission, Grade, NewAssignment, NewSubmission,
    Publication,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

const MAX_TITLE_LEN: usize = 200;
const MAX_FILE_REF_LEN: usize = 255;

/// Mean of grade book marks rounded to two decimal places
pub fn average_marks(grades: &[Grade]) -> Option<Decimal> {
    if grades.is_empty() {
        return None;
    }
    let total: Decimal = grades.iter().map(|g| g.marks).sum();
    Some((total / Decimal::from(grades.len())).round_dp(2))
}

impl Service {
    // ===== Assignments =====

    /// Create an assignment. The teacher must hold a binding for the class and
    /// subject in the academic year in effect on the service clock.
    pub async fn create_assignment(
        &self,
        teacher_id: Uuid,
        input: NewAssignment,
    ) -> Result<Assignment, AcademicsError> {
        self.get_teacher(teacher_id).await?;
        self.get_subject(input.subject_id).await?;
        self.get_class(input.class_id).await?;

        validate_name("assignment title", &input.title, MAX_TITLE_LEN)?;
        validate_points(input.points, self.policy.max_assignment_points)?;

        let now = self.clock.now();
        if input.due_at < now && !self.policy.allow_past_due_dates {
            return Err(AcademicsError::validation(format!(
                "due date {} is in the past",
                input.due_at
            )));
        }

        let year = self.current_academic_year();
        if !self
            .is_bound(teacher_id, input.class_id, input.subject_id, year)
            .await?
        {
            return Err(AcademicsError::authorization(format!(
                "teacher {} does not teach subject {} in class {} during {}",
                teacher_id, input.subject_id, input.class_id, year
            )));
        }

        let assignment = Assignment {
            id: Uuid::new_v4(),
            title: input.title.trim().to_string(),
            description: input.description,
            subject_id: input.subject_id,
            class_id: input.class_id,
            teacher_id,
            due_at: input.due_at,
            points: input.points,
            publication: if input.publish {
                Publication::Published
            } else {
                Publication::Draft
            },
            created_at: now,
            updated_at: now,
        };

        let created = self
            .repos
            .coursework
            .create_assignment(&assignment)
            .await
            .map_err(store_error("assignment", assignment.id))?;

        tracing::info!(
            assignment_id = %created.id,
            teacher_id = %teacher_id,
            class_id = %created.class_id,
            subject_id = %created.subject_id,
            published = created.is_published(),
            "assignment created"
        );
        self.publish(AcademicEvent::AssignmentCreated(AssignmentCreatedEvent {
            assignment_id: created.id,
            teacher_id,
            class_id: created.class_id,
            subject_id: created.subject_id,
            published: created.is_published(),
            timestamp: now,
        }))
        .await;

        Ok(created)
    }

    pub async fn get_assignment(&self, id: Uuid) -> Result<Assignment, AcademicsError> {
        self.repos
            .coursework
            .find_assignment(id)
            .await
            .map_err(internal)?
            .ok_or_else(|| AcademicsError::not_found("assignment", id))
    }

    /// Flip a draft to published. Publishing twice is a no-op.
    pub async fn publish_assignment(&self, assignment_id: Uuid) -> Result<Assignment, AcademicsError> {
        let mut assignment = self.get_assignment(assignment_id).await?;
        if assignment.is_published() {
            return Ok(assignment);
        }

        assignment.publication = Publication::Published;
        assignment.updated_at = self.clock.now();
        let updated = self
            .repos
            .coursework
            .update_assignment(&assignment)
            .await
            .map_err(internal)?;

        tracing::info!(assignment_id = %assignment_id, "assignment published");
        self.publish(AcademicEvent::AssignmentPublished(AssignmentPublishedEvent {
            assignment_id,
            timestamp: updated.updated_at,
        }))
        .await;

        Ok(updated)
    }

    /// Move the due date. Lateness already recorded on submissions is kept.
    pub async fn update_assignment_due(
        &self,
        assignment_id: Uuid,
        due_at: DateTime<Utc>,
    ) -> Result<Assignment, AcademicsError> {
        let mut assignment = self.get_assignment(assignment_id).await?;
        let previous = assignment.due_at;
        assignment.due_at = due_at;
        assignment.updated_at = self.clock.now();

        let updated = self
            .repos
            .coursework
            .update_assignment(&assignment)
            .await
            .map_err(internal)?;

        tracing::debug!(
            assignment_id = %assignment_id,
            previous = %previous,
            due_at = %due_at,
            "assignment due date moved"
        );
        Ok(updated)
    }

    // ===== Submissions =====

    /// Record a student's submission. Lateness is frozen from `submitted_at`.
    pub async fn submit(
        &self,
        assignment_id: Uuid,
        student_id: Uuid,
        input: NewSubmission,
        submitted_at: DateTime<Utc>,
    ) -> Result<AssignmentSubmission, AcademicsError> {
        let assignment = self.get_assignment(assignment_id).await?;
        let student = self.get_student(student_id).await?;
        validate_name("submission file", &input.file_ref, MAX_FILE_REF_LEN)?;

        if student.current_class_id != Some(assignment.class_id) {
            return Err(AcademicsError::authorization(format!(
                "student {} is not enrolled in class {}",
                student_id, assignment.class_id
            )));
        }

        let key = format!("{}/{}", assignment_id, student_id);
        let existing = self
            .repos
            .coursework
            .find_submission_for(assignment_id, student_id)
            .await
            .map_err(internal)?;
        if existing.is_some() {
            return Err(AcademicsError::duplicate("submission", key));
        }

        let submission = AssignmentSubmission {
            id: Uuid::new_v4(),
            assignment_id,
            student_id,
            submitted_at,
            file_ref: input.file_ref.trim().to_string(),
            comments: input.comments,
            grade: None,
            feedback: String::new(),
            is_late: assignment.is_past_due(submitted_at),
        };

        let created = self
            .repos
            .coursework
            .create_submission(&submission)
            .await
            .map_err(store_error("submission", key))?;

        tracing::info!(
            submission_id = %created.id,
            assignment_id = %assignment_id,
            student_id = %student_id,
            is_late = created.is_late,
            "submission received"
        );
        self.publish(AcademicEvent::SubmissionReceived(SubmissionReceivedEvent {
            submission_id: created.id,
            assignment_id,
            student_id,
            is_late: created.is_late,
            timestamp: self.clock.now(),
        }))
        .await;

        Ok(created)
    }

    /// Grade a submission, replacing any previous grade and feedback
    pub async fn grade(
        &self,
        submission_id: Uuid,
        value: u8,
        feedback: &str,
    ) -> Result<AssignmentSubmission, AcademicsError> {
        validate_score(value)?;

        let graded = self
            .repos
            .coursework
            .update_submission_grade(submission_id, value, feedback)
            .await
            .map_err(internal)?
            .ok_or_else(|| AcademicsError::not_found("submission", submission_id))?;

        tracing::info!(submission_id = %submission_id, grade = value, "submission graded");
        self.publish(AcademicEvent::SubmissionGraded(SubmissionGradedEvent {
            submission_id,
            grade: value,
            timestamp: self.clock.now(),
        }))
        .await;

        Ok(graded)
    }

    // ===== Grade book =====

    /// Record the grade book entry for (student, subject)
    pub async fn record_grade(
        &self,
        student_id: Uuid,
        subject_id: Uuid,
        marks: Decimal,
        remarks: &str,
    ) -> Result<Grade, AcademicsError> {
        self.get_student(student_id).await?;
        self.get_subject(subject_id).await?;
        validate_marks(marks)?;

        let key = format!("{}/{}", student_id, subject_id);
        let existing = self
            .repos
            .coursework
            .find_grade_for(student_id, subject_id)
            .await
            .map_err(internal)?;
        if existing.is_some() {
            return Err(AcademicsError::duplicate("grade", key));
        }

        let grade = Grade {
            id: Uuid::new_v4(),
            student_id,
            subject_id,
            marks,
            remarks: remarks.to_string(),
            recorded_at: self.clock.now(),
        };

        self.repos
            .coursework
            .create_grade(&grade)
            .await
            .map_err(store_error("grade", key))
    }

    pub async fn update_grade(
        &self,
        grade_id: Uuid,
        marks: Decimal,
        remarks: &str,
    ) -> Result<Grade, AcademicsError> {
        validate_marks(marks)?;
        let mut grade = self
            .repos
            .coursework
            .find_grade(grade_id)
            .await
            .map_err(internal)?
            .ok_or_else(|| AcademicsError::not_found("grade", grade_id))?;

        grade.marks = marks;
        grade.remarks = remarks.to_string();
        grade.recorded_at = self.clock.now();

        self.repos
            .coursework
            .update_grade(&grade)
            .await
            .map_err(internal)
    }

    /// Average marks of a student across subjects; `None` without grades
    pub async fn student_average(&self, student_id: Uuid) -> Result<Option<Decimal>, AcademicsError> {
        self.get_student(student_id).await?;
        let grades = self
            .repos
            .coursework
            .find_grades_for_student(student_id)
            .await
            .map_err(internal)?;
        Ok(average_marks(&grades))
    }

    // ===== Role dispatch =====

    /// Create an assignment on behalf of an actor; only teachers author
    pub async fn create_assignment_as(
        &self,
        actor: &Actor,
        input: NewAssignment,
    ) -> Result<Assignment, AcademicsError> {
        let Some(teacher_id) = actor.teacher_id() else {
            return Err(AcademicsError::authorization(format!(
                "{:?} cannot create assignments",
                actor.role()
            )));
        };
        self.create_assignment(teacher_id, input).await
    }

    /// Submit on behalf of an actor at the current clock time; only students submit
    pub async fn submit_as(
        &self,
        actor: &Actor,
        assignment_id: Uuid,
        input: NewSubmission,
    ) -> Result<AssignmentSubmission, AcademicsError> {
        let Some(student_id) = actor.student_id() else {
            return Err(AcademicsError::authorization(format!(
                "{:?} cannot submit assignments",
                actor.role()
            )));
        };
        self.submit(assignment_id, student_id, input, self.clock.now())
            .await
    }

    /// Grade book of a student as seen by an actor
    pub async fn grades_visible_to(
        &self,
        actor: &Actor,
        student_id: Uuid,
    ) -> Result<Vec<Grade>, AcademicsError> {
        let student = self.get_student(student_id).await?;
        if !actor.can_view_student(&student) {
            return Err(AcademicsError::authorization(format!(
                "{:?} may not view grades of student {}",
                actor.role(),
                student_id
            )));
        }

        self.repos
            .coursework
            .find_grades_for_student(student_id)
            .await
            .map_err(internal)
    }
}
