//! Subject-class binding
//!
//! A subject reaches a class either through its legacy direct class link or
//! through the subject set of one of the class's teaching assignments. Reads
//! take the union of both; writes go to the junction.

use super::events::AcademicEvent;
use super::service::{internal, store_error, Service};
use super::validation::ensure_distinct;
use crate::contract::{AcademicsError, Class, Subject, Teacher, TeachingAssignment};
use std::collections::HashSet;
use uuid::Uuid;

/// Class ids reachable from a subject, sorted and deduplicated
pub fn linked_class_ids(subject: &Subject, via_teaching: &[TeachingAssignment]) -> Vec<Uuid> {
    let mut ids: Vec<Uuid> = subject
        .direct_class_id
        .into_iter()
        .chain(
            via_teaching
                .iter()
                .filter(|a| a.subject_ids.contains(&subject.id))
                .map(|a| a.class_id),
        )
        .collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Subject ids reachable from a class, sorted and deduplicated
pub fn linked_subject_ids(direct: &[Subject], class_teaching: &[TeachingAssignment]) -> Vec<Uuid> {
    let mut ids: Vec<Uuid> = direct
        .iter()
        .map(|s| s.id)
        .chain(class_teaching.iter().flat_map(|a| a.subject_ids.iter().copied()))
        .collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

impl Service {
    /// Classes a subject is taught in, ordered by class name
    pub async fn classes_for_subject(&self, subject_id: Uuid) -> Result<Vec<Class>, AcademicsError> {
        let subject = self.get_subject(subject_id).await?;
        let teaching = self
            .repos
            .teaching
            .find_by_subject(subject_id)
            .await
            .map_err(internal)?;

        let ids = linked_class_ids(&subject, &teaching);
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut classes = self
            .repos
            .directory
            .find_classes(&ids)
            .await
            .map_err(internal)?;
        classes.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(classes)
    }

    /// Subjects taught in a class, ordered by subject name
    pub async fn subjects_for_class(&self, class_id: Uuid) -> Result<Vec<Subject>, AcademicsError> {
        self.get_class(class_id).await?;

        let direct = self
            .repos
            .subjects
            .find_by_direct_class(class_id)
            .await
            .map_err(internal)?;
        let teaching = self
            .repos
            .teaching
            .find_by_class(class_id)
            .await
            .map_err(internal)?;

        let ids = linked_subject_ids(&direct, &teaching);
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut subjects = self
            .repos
            .subjects
            .find_many(&ids)
            .await
            .map_err(internal)?;
        subjects.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(subjects)
    }

    /// Teacher responsible for a subject: the direct teacher if set, otherwise
    /// the primary teacher of the direct class
    pub async fn effective_teacher_for_subject(
        &self,
        subject_id: Uuid,
    ) -> Result<Option<Teacher>, AcademicsError> {
        let subject = self.get_subject(subject_id).await?;

        if let Some(teacher_id) = subject.direct_teacher_id {
            let teacher = self
                .repos
                .directory
                .find_teacher(teacher_id)
                .await
                .map_err(internal)?;
            return match teacher {
                Some(teacher) => Ok(Some(teacher)),
                None => {
                    let err = AcademicsError::Consistency {
                        details: format!(
                            "subject {} references missing teacher {}",
                            subject_id, teacher_id
                        ),
                    };
                    tracing::error!(subject_id = %subject_id, error = %err, "dangling direct teacher");
                    Err(err)
                }
            };
        }

        match subject.direct_class_id {
            Some(class_id) => self.primary_teacher(class_id).await,
            None => Ok(None),
        }
    }

    /// Replace the subject set of every listed teaching assignment
    pub async fn assign_subjects_to_assignment(
        &self,
        teaching_ids: &[Uuid],
        subject_ids: &[Uuid],
    ) -> Result<(), AcademicsError> {
        ensure_distinct("teaching_assignment", teaching_ids)?;
        ensure_distinct("subject", subject_ids)?;
        if teaching_ids.is_empty() {
            return Ok(());
        }

        let found: HashSet<Uuid> = self
            .repos
            .teaching
            .find_many(teaching_ids)
            .await
            .map_err(internal)?
            .into_iter()
            .map(|a| a.id)
            .collect();
        if let Some(missing) = teaching_ids.iter().find(|id| !found.contains(id)) {
            return Err(AcademicsError::not_found("teaching_assignment", missing));
        }
        self.ensure_subjects_exist(subject_ids).await?;

        self.repos
            .teaching
            .set_subjects(teaching_ids, subject_ids)
            .await
            .map_err(store_error("teaching_subject", format!("{:?}", teaching_ids)))?;

        tracing::info!(
            assignments = teaching_ids.len(),
            subjects = subject_ids.len(),
            "teaching subject sets replaced"
        );
        self.publish(AcademicEvent::subjects_reassigned(
            None,
            teaching_ids,
            subject_ids,
            self.clock.now(),
        ))
        .await;

        Ok(())
    }

    /// Set the subjects of every teaching assignment of a class and move the
    /// legacy direct class links to match
    pub async fn assign_subjects_to_class(
        &self,
        class_id: Uuid,
        subject_ids: &[Uuid],
    ) -> Result<(), AcademicsError> {
        self.get_class(class_id).await?;
        ensure_distinct("subject", subject_ids)?;
        self.ensure_subjects_exist(subject_ids).await?;

        let teaching = self
            .repos
            .teaching
            .find_by_class(class_id)
            .await
            .map_err(internal)?;
        if teaching.is_empty() {
            return Err(AcademicsError::validation(format!(
                "class {} has no teaching assignments; assign teachers first",
                class_id
            )));
        }

        self.repos
            .teaching
            .reassign_class_subjects(class_id, subject_ids)
            .await
            .map_err(store_error("teaching_subject", class_id))?;

        let teaching_ids: Vec<Uuid> = teaching.iter().map(|a| a.id).collect();
        tracing::info!(
            class_id = %class_id,
            assignments = teaching_ids.len(),
            subjects = subject_ids.len(),
            "class subjects reassigned"
        );
        self.publish(AcademicEvent::subjects_reassigned(
            Some(class_id),
            &teaching_ids,
            subject_ids,
            self.clock.now(),
        ))
        .await;

        Ok(())
    }

    async fn ensure_subjects_exist(&self, ids: &[Uuid]) -> Result<(), AcademicsError> {
        if ids.is_empty() {
            return Ok(());
        }
        let found: HashSet<Uuid> = self
            .repos
            .subjects
            .find_many(ids)
            .await
            .map_err(internal)?
            .into_iter()
            .map(|s| s.id)
            .collect();

        match ids.iter().find(|id| !found.contains(id)) {
            Some(missing) => Err(AcademicsError::not_found("subject", missing)),
            None => Ok(()),
        }
    }
}
