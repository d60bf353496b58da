//! Academics Service Module
//!
//! Resolution core of a school-management system: which teacher teaches
//! which subject to which class in a given academic year, who the primary
//! teacher of a class is, and the assignment/submission/grade lifecycle
//! built on top of those bindings.

// Public exports
pub mod contract;
pub use contract::{
    client::AcademicsApi, error::AcademicsError, AcademicYear, Actor, Assignment,
    AssignmentSubmission, BackfillReport, Class, Grade, NewAssignment, NewSubject, NewSubmission,
    Student, Subject, Teacher, TeachingAssignment, TeachingBinding,
};

pub mod module;
pub use module::AcademicsServiceModule;

pub mod config;
pub use config::Config;

// Internal modules (hidden from public API)
#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;
