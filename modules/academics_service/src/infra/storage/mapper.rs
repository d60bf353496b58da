//! Entity to model mappers
//!
//! Conversions between SeaORM entities and contract models

use super::entity::{
    assignment, assignment_submission, class, grade, student, subject, subject_assignment,
    teacher, teaching_assignment,
};
use crate::contract::{
    Assignment, AssignmentSubmission, Class, Grade, Publication, Student, Subject,
    SubjectAssignment, Teacher, TeachingAssignment,
};
use anyhow::{anyhow, Context};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sea_orm::ActiveValue::Set;
use uuid::Uuid;

// ===== Directory Conversions =====

impl From<class::Model> for Class {
    fn from(entity: class::Model) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            created_at: entity.created_at,
        }
    }
}

impl From<&Class> for class::ActiveModel {
    fn from(model: &Class) -> Self {
        Self {
            id: Set(model.id),
            name: Set(model.name.clone()),
            created_at: Set(model.created_at),
        }
    }
}

impl From<teacher::Model> for Teacher {
    fn from(entity: teacher::Model) -> Self {
        Self {
            id: entity.id,
            employee_code: entity.employee_code,
            full_name: entity.full_name,
            is_class_teacher: entity.is_class_teacher,
        }
    }
}

impl From<&Teacher> for teacher::ActiveModel {
    fn from(model: &Teacher) -> Self {
        Self {
            id: Set(model.id),
            employee_code: Set(model.employee_code.clone()),
            full_name: Set(model.full_name.clone()),
            is_class_teacher: Set(model.is_class_teacher),
        }
    }
}

impl From<student::Model> for Student {
    fn from(entity: student::Model) -> Self {
        Self {
            id: entity.id,
            admission_number: entity.admission_number,
            full_name: entity.full_name,
            current_class_id: entity.current_class_id,
            guardian_id: entity.guardian_id,
        }
    }
}

impl From<&Student> for student::ActiveModel {
    fn from(model: &Student) -> Self {
        Self {
            id: Set(model.id),
            admission_number: Set(model.admission_number.clone()),
            full_name: Set(model.full_name.clone()),
            current_class_id: Set(model.current_class_id),
            guardian_id: Set(model.guardian_id),
        }
    }
}

// ===== Subject Conversions =====

impl From<subject::Model> for Subject {
    fn from(entity: subject::Model) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            direct_class_id: entity.direct_class_id,
            direct_teacher_id: entity.direct_teacher_id,
            term: entity.term,
            academic_year: entity.academic_year,
        }
    }
}

impl From<&Subject> for subject::ActiveModel {
    fn from(model: &Subject) -> Self {
        Self {
            id: Set(model.id),
            name: Set(model.name.clone()),
            direct_class_id: Set(model.direct_class_id),
            direct_teacher_id: Set(model.direct_teacher_id),
            term: Set(model.term.clone()),
            academic_year: Set(model.academic_year.clone()),
        }
    }
}

impl From<subject_assignment::Model> for SubjectAssignment {
    fn from(entity: subject_assignment::Model) -> Self {
        Self {
            id: entity.id,
            teacher_id: entity.teacher_id,
            subject_id: entity.subject_id,
            academic_year: entity.academic_year,
            assigned_at: entity.assigned_at,
        }
    }
}

impl From<&SubjectAssignment> for subject_assignment::ActiveModel {
    fn from(model: &SubjectAssignment) -> Self {
        Self {
            id: Set(model.id),
            teacher_id: Set(model.teacher_id),
            subject_id: Set(model.subject_id),
            academic_year: Set(model.academic_year.clone()),
            assigned_at: Set(model.assigned_at),
        }
    }
}

// ===== Teaching Conversions =====

/// Attach a subject set loaded from the junction table
pub fn to_teaching_assignment(entity: teaching_assignment::Model, subject_ids: Vec<Uuid>) -> TeachingAssignment {
    TeachingAssignment {
        id: entity.id,
        class_id: entity.class_id,
        teacher_id: entity.teacher_id,
        is_primary: entity.is_primary,
        date_assigned: entity.date_assigned,
        subject_ids,
    }
}

impl From<&TeachingAssignment> for teaching_assignment::ActiveModel {
    fn from(model: &TeachingAssignment) -> Self {
        Self {
            id: Set(model.id),
            class_id: Set(model.class_id),
            teacher_id: Set(model.teacher_id),
            is_primary: Set(model.is_primary),
            date_assigned: Set(model.date_assigned),
        }
    }
}

// ===== Coursework Conversions =====

impl TryFrom<assignment::Model> for Assignment {
    type Error = anyhow::Error;

    fn try_from(entity: assignment::Model) -> Result<Self, Self::Error> {
        let points = u32::try_from(entity.points)
            .with_context(|| format!("assignment {} has invalid points {}", entity.id, entity.points))?;

        Ok(Self {
            id: entity.id,
            title: entity.title,
            description: entity.description,
            subject_id: entity.subject_id,
            class_id: entity.class_id,
            teacher_id: entity.teacher_id,
            due_at: entity.due_at,
            points,
            publication: if entity.is_published {
                Publication::Published
            } else {
                Publication::Draft
            },
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        })
    }
}

impl From<&Assignment> for assignment::ActiveModel {
    fn from(model: &Assignment) -> Self {
        Self {
            id: Set(model.id),
            title: Set(model.title.clone()),
            description: Set(model.description.clone()),
            subject_id: Set(model.subject_id),
            class_id: Set(model.class_id),
            teacher_id: Set(model.teacher_id),
            due_at: Set(model.due_at),
            points: Set(i64::from(model.points)),
            is_published: Set(model.is_published()),
            created_at: Set(model.created_at),
            updated_at: Set(model.updated_at),
        }
    }
}

impl TryFrom<assignment_submission::Model> for AssignmentSubmission {
    type Error = anyhow::Error;

    fn try_from(entity: assignment_submission::Model) -> Result<Self, Self::Error> {
        let grade = entity
            .grade
            .map(u8::try_from)
            .transpose()
            .with_context(|| format!("submission {} has an out-of-range grade", entity.id))?;

        Ok(Self {
            id: entity.id,
            assignment_id: entity.assignment_id,
            student_id: entity.student_id,
            submitted_at: entity.submitted_at,
            file_ref: entity.file_ref,
            comments: entity.comments,
            grade,
            feedback: entity.feedback,
            is_late: entity.is_late,
        })
    }
}

impl From<&AssignmentSubmission> for assignment_submission::ActiveModel {
    fn from(model: &AssignmentSubmission) -> Self {
        Self {
            id: Set(model.id),
            assignment_id: Set(model.assignment_id),
            student_id: Set(model.student_id),
            submitted_at: Set(model.submitted_at),
            file_ref: Set(model.file_ref.clone()),
            comments: Set(model.comments.clone()),
            grade: Set(model.grade.map(i16::from)),
            feedback: Set(model.feedback.clone()),
            is_late: Set(model.is_late),
        }
    }
}

// ===== Grade Book Conversions =====

/// Marks are stored as an integer number of hundredths
pub fn marks_to_hundredths(marks: Decimal) -> anyhow::Result<i32> {
    (marks * Decimal::ONE_HUNDRED)
        .round()
        .to_i32()
        .ok_or_else(|| anyhow!("marks {} do not fit the storage column", marks))
}

pub fn hundredths_to_marks(hundredths: i32) -> Decimal {
    Decimal::new(i64::from(hundredths), 2)
}

impl From<grade::Model> for Grade {
    fn from(entity: grade::Model) -> Self {
        Self {
            id: entity.id,
            student_id: entity.student_id,
            subject_id: entity.subject_id,
            marks: hundredths_to_marks(entity.marks_hundredths),
            remarks: entity.remarks,
            recorded_at: entity.recorded_at,
        }
    }
}

impl TryFrom<&Grade> for grade::ActiveModel {
    type Error = anyhow::Error;

    fn try_from(model: &Grade) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Set(model.id),
            student_id: Set(model.student_id),
            subject_id: Set(model.subject_id),
            marks_hundredths: Set(marks_to_hundredths(model.marks)?),
            remarks: Set(model.remarks.clone()),
            recorded_at: Set(model.recorded_at),
        })
    }
}
