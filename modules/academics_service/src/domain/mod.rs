//! Domain layer - business logic and services

pub mod academic_year;
pub mod backfill;
pub mod binding;
pub mod clock;
pub mod coursework;
pub mod events;
pub mod repository;
pub mod resolver;
pub mod roster;
pub mod service;
pub mod validation;

pub use academic_year::current_academic_year;
pub use backfill::BackfillPlan;
pub use clock::{Clock, FixedClock, SystemClock};
pub use events::{AcademicEvent, EventPublisher, NoOpEventPublisher};
pub use repository::{
    CourseworkRepository, DirectoryRepository, Repositories, StorageError, SubjectRepository,
    TeachingRepository,
};
pub use service::{Service, ServicePolicy};
