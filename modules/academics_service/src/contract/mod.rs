//! Contract layer - public API for inter-module communication
//!
//! This layer contains transport-agnostic models and the native client trait.
//! NO serde derives on models - these are pure domain types.

pub mod client;
pub mod error;
pub mod model;

pub use client::AcademicsApi;
pub use error::AcademicsError;
pub use model::{
    AcademicYear, Actor, Assignment, AssignmentSubmission, BackfillReport, Class, Deadline, Grade,
    NewAssignment, NewSubject, NewSubmission, Publication, Role, Student, Subject,
    SubjectAssignment, Teacher, TeachingAssignment, TeachingBinding,
};
