//! Domain events for academics service
//!
//! Events are emitted after a mutation has been committed. Publishing is
//! best-effort: a failed publish is logged and never rolls back the mutation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Domain event types for academics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AcademicEvent {
    /// Class roster was cleared and recreated
    RosterReplaced(RosterReplacedEvent),
    /// Subject sets of teaching assignments were replaced
    SubjectsReassigned(SubjectsReassignedEvent),
    /// Assignment was authored
    AssignmentCreated(AssignmentCreatedEvent),
    /// Draft assignment was published
    AssignmentPublished(AssignmentPublishedEvent),
    /// Student submitted work
    SubmissionReceived(SubmissionReceivedEvent),
    /// Submission was graded or regraded
    SubmissionGraded(SubmissionGradedEvent),
    /// Legacy direct links were copied into the junctions
    LegacyLinksBackfilled(LegacyLinksBackfilledEvent),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterReplacedEvent {
    pub class_id: Uuid,
    /// Teachers in roster order
    pub teacher_ids: Vec<Uuid>,
    pub primary_teacher_id: Option<Uuid>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectsReassignedEvent {
    /// Set when the whole class was reassigned
    pub class_id: Option<Uuid>,
    pub teaching_assignment_ids: Vec<Uuid>,
    pub subject_ids: Vec<Uuid>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentCreatedEvent {
    pub assignment_id: Uuid,
    pub teacher_id: Uuid,
    pub class_id: Uuid,
    pub subject_id: Uuid,
    pub published: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentPublishedEvent {
    pub assignment_id: Uuid,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceivedEvent {
    pub submission_id: Uuid,
    pub assignment_id: Uuid,
    pub student_id: Uuid,
    pub is_late: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionGradedEvent {
    pub submission_id: Uuid,
    pub grade: u8,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyLinksBackfilledEvent {
    pub roster_links_added: usize,
    pub subject_assignments_created: usize,
    pub academic_years_normalized: usize,
    pub timestamp: DateTime<Utc>,
}

/// Event publisher trait for publishing domain events
#[async_trait::async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: AcademicEvent) -> anyhow::Result<()>;
}

/// No-op event publisher for testing or when events are disabled
pub struct NoOpEventPublisher;

#[async_trait::async_trait]
impl EventPublisher for NoOpEventPublisher {
    async fn publish(&self, _event: AcademicEvent) -> anyhow::Result<()> {
        Ok(())
    }
}

impl AcademicEvent {
    pub fn roster_replaced(class_id: Uuid, teacher_ids: &[Uuid], timestamp: DateTime<Utc>) -> Self {
        Self::RosterReplaced(RosterReplacedEvent {
            class_id,
            teacher_ids: teacher_ids.to_vec(),
            primary_teacher_id: teacher_ids.first().copied(),
            timestamp,
        })
    }

    pub fn subjects_reassigned(
        class_id: Option<Uuid>,
        teaching_assignment_ids: &[Uuid],
        subject_ids: &[Uuid],
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self::SubjectsReassigned(SubjectsReassignedEvent {
            class_id,
            teaching_assignment_ids: teaching_assignment_ids.to_vec(),
            subject_ids: subject_ids.to_vec(),
            timestamp,
        })
    }

    /// Short name used in log lines
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RosterReplaced(_) => "roster_replaced",
            Self::SubjectsReassigned(_) => "subjects_reassigned",
            Self::AssignmentCreated(_) => "assignment_created",
            Self::AssignmentPublished(_) => "assignment_published",
            Self::SubmissionReceived(_) => "submission_received",
            Self::SubmissionGraded(_) => "submission_graded",
            Self::LegacyLinksBackfilled(_) => "legacy_links_backfilled",
        }
    }
}
