//! Domain service - business logic orchestration
//!
//! `Service` owns the repositories, the clock and the event publisher. The
//! resolution rules live in sibling modules (`resolver`, `binding`, `roster`,
//! `coursework`, `backfill`), each adding an `impl Service` block.

use super::clock::Clock;
use super::events::{AcademicEvent, EventPublisher};
use super::repository::{Repositories, StorageError};
use super::validation::validate_name;
use crate::config::Config;
use crate::contract::model::DEFAULT_START_MONTH;
use crate::contract::{
    AcademicYear, AcademicsError, Class, NewSubject, Student, Subject, SubjectAssignment, Teacher,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

const MAX_CLASS_NAME_LEN: usize = 20;
const MAX_CODE_LEN: usize = 20;
const MAX_PERSON_NAME_LEN: usize = 150;
const MAX_SUBJECT_NAME_LEN: usize = 100;
const MAX_TERM_LEN: usize = 20;

/// Tunables that change domain decisions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServicePolicy {
    /// Month in which a new academic year begins
    pub academic_year_start_month: u32,
    /// Upper bound for assignment points
    pub max_assignment_points: u32,
    /// Accept assignments whose due date has already passed
    pub allow_past_due_dates: bool,
}

impl Default for ServicePolicy {
    fn default() -> Self {
        Self {
            academic_year_start_month: DEFAULT_START_MONTH,
            max_assignment_points: 1000,
            allow_past_due_dates: false,
        }
    }
}

impl From<&Config> for ServicePolicy {
    fn from(config: &Config) -> Self {
        Self {
            academic_year_start_month: config.academic_year_start_month,
            max_assignment_points: config.max_assignment_points,
            allow_past_due_dates: config.allow_past_due_dates,
        }
    }
}

/// Domain service for academic relationship resolution
pub struct Service {
    pub(super) repos: Repositories,
    pub(super) clock: Arc<dyn Clock>,
    pub(super) events: Arc<dyn EventPublisher>,
    pub(super) policy: ServicePolicy,
}

impl Service {
    /// Create a new service instance with the default policy
    pub fn new(
        repos: Repositories,
        clock: Arc<dyn Clock>,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            repos,
            clock,
            events,
            policy: ServicePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ServicePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &ServicePolicy {
        &self.policy
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Academic year in effect on the service clock
    pub fn current_academic_year(&self) -> AcademicYear {
        AcademicYear::containing(self.clock.now(), self.policy.academic_year_start_month)
    }

    // ===== Directory Operations =====

    pub async fn create_class(&self, name: &str) -> Result<Class, AcademicsError> {
        validate_name("class name", name, MAX_CLASS_NAME_LEN)?;
        let name = name.trim().to_string();

        let class = Class {
            id: Uuid::new_v4(),
            name: name.clone(),
            created_at: self.clock.now(),
        };

        self.repos
            .directory
            .create_class(&class)
            .await
            .map_err(store_error("class", name))
    }

    pub async fn create_teacher(
        &self,
        employee_code: &str,
        full_name: &str,
        is_class_teacher: bool,
    ) -> Result<Teacher, AcademicsError> {
        validate_name("employee code", employee_code, MAX_CODE_LEN)?;
        validate_name("teacher name", full_name, MAX_PERSON_NAME_LEN)?;
        let employee_code = employee_code.trim().to_string();

        let teacher = Teacher {
            id: Uuid::new_v4(),
            employee_code: employee_code.clone(),
            full_name: full_name.trim().to_string(),
            is_class_teacher,
        };

        self.repos
            .directory
            .create_teacher(&teacher)
            .await
            .map_err(store_error("teacher", employee_code))
    }

    pub async fn create_student(
        &self,
        admission_number: &str,
        full_name: &str,
        current_class_id: Option<Uuid>,
        guardian_id: Option<Uuid>,
    ) -> Result<Student, AcademicsError> {
        validate_name("admission number", admission_number, 50)?;
        validate_name("student name", full_name, MAX_PERSON_NAME_LEN)?;
        if let Some(class_id) = current_class_id {
            self.get_class(class_id).await?;
        }
        let admission_number = admission_number.trim().to_string();

        let student = Student {
            id: Uuid::new_v4(),
            admission_number: admission_number.clone(),
            full_name: full_name.trim().to_string(),
            current_class_id,
            guardian_id,
        };

        self.repos
            .directory
            .create_student(&student)
            .await
            .map_err(store_error("student", admission_number))
    }

    /// Create a subject; the academic year label is stored canonically
    pub async fn create_subject(&self, input: NewSubject) -> Result<Subject, AcademicsError> {
        validate_name("subject name", &input.name, MAX_SUBJECT_NAME_LEN)?;
        validate_name("term", &input.term, MAX_TERM_LEN)?;
        let academic_year = AcademicYear::canonicalize(&input.academic_year)?;
        if let Some(class_id) = input.direct_class_id {
            self.get_class(class_id).await?;
        }
        if let Some(teacher_id) = input.direct_teacher_id {
            self.get_teacher(teacher_id).await?;
        }

        let subject = Subject {
            id: Uuid::new_v4(),
            name: input.name.trim().to_string(),
            direct_class_id: input.direct_class_id,
            direct_teacher_id: input.direct_teacher_id,
            term: input.term.trim().to_string(),
            academic_year,
        };

        self.repos
            .subjects
            .create(&subject)
            .await
            .map_err(store_error("subject", subject.id))
    }

    /// Record that a teacher teaches a subject in an academic year
    pub async fn assign_teacher_to_subject(
        &self,
        teacher_id: Uuid,
        subject_id: Uuid,
        academic_year: AcademicYear,
    ) -> Result<SubjectAssignment, AcademicsError> {
        self.get_teacher(teacher_id).await?;
        self.get_subject(subject_id).await?;

        let assignment = SubjectAssignment {
            id: Uuid::new_v4(),
            teacher_id,
            subject_id,
            academic_year: academic_year.to_string(),
            assigned_at: self.clock.now(),
        };

        self.repos
            .subjects
            .create_subject_assignment(&assignment)
            .await
            .map_err(store_error(
                "subject_assignment",
                format!("{}/{}/{}", teacher_id, subject_id, academic_year),
            ))
    }

    pub async fn subject_assignments_for(
        &self,
        teacher_id: Uuid,
        academic_year: Option<AcademicYear>,
    ) -> Result<Vec<SubjectAssignment>, AcademicsError> {
        self.get_teacher(teacher_id).await?;
        let label = academic_year.map(|year| year.to_string());

        self.repos
            .subjects
            .find_subject_assignments(teacher_id, label.as_deref())
            .await
            .map_err(internal)
    }

    /// Students currently enrolled in a class
    pub async fn students_in_class(&self, class_id: Uuid) -> Result<Vec<Student>, AcademicsError> {
        self.get_class(class_id).await?;

        self.repos
            .directory
            .find_students_in_class(class_id)
            .await
            .map_err(internal)
    }

    // ===== Lookups =====

    pub async fn get_class(&self, id: Uuid) -> Result<Class, AcademicsError> {
        self.repos
            .directory
            .find_class(id)
            .await
            .map_err(internal)?
            .ok_or_else(|| AcademicsError::not_found("class", id))
    }

    pub async fn get_teacher(&self, id: Uuid) -> Result<Teacher, AcademicsError> {
        self.repos
            .directory
            .find_teacher(id)
            .await
            .map_err(internal)?
            .ok_or_else(|| AcademicsError::not_found("teacher", id))
    }

    pub async fn get_student(&self, id: Uuid) -> Result<Student, AcademicsError> {
        self.repos
            .directory
            .find_student(id)
            .await
            .map_err(internal)?
            .ok_or_else(|| AcademicsError::not_found("student", id))
    }

    pub async fn get_subject(&self, id: Uuid) -> Result<Subject, AcademicsError> {
        self.repos
            .subjects
            .find_by_id(id)
            .await
            .map_err(internal)?
            .ok_or_else(|| AcademicsError::not_found("subject", id))
    }

    // ===== Helper Methods =====

    /// Publish an event; failures are logged and never fail the operation
    pub(super) async fn publish(&self, event: AcademicEvent) {
        let kind = event.kind();
        if let Err(e) = self.events.publish(event).await {
            tracing::warn!(event = kind, error = %e, "failed to publish academic event");
        }
    }
}

/// Map a storage failure to `Internal`, logging the cause
pub(super) fn internal(err: anyhow::Error) -> AcademicsError {
    tracing::error!(error = ?err, "academics storage failure");
    AcademicsError::Internal
}

/// Map a storage failure on a write, turning unique violations into `Duplicate`
pub(super) fn store_error(
    resource: &'static str,
    key: impl std::fmt::Display,
) -> impl FnOnce(anyhow::Error) -> AcademicsError {
    let key = key.to_string();
    move |err| {
        if let Some(StorageError::UniqueViolation(detail)) = err.downcast_ref::<StorageError>() {
            tracing::debug!(resource, key = %key, detail = %detail, "unique constraint rejected write");
            return AcademicsError::duplicate(resource, key);
        }
        internal(err)
    }
}
