//! SeaORM entities for database tables

pub mod assignment;
pub mod assignment_submission;
pub mod class;
pub mod grade;
pub mod student;
pub mod subject;
pub mod subject_assignment;
pub mod teacher;
pub mod teaching_assignment;
pub mod teaching_assignment_subject;
