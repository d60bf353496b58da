//! Primary teacher selection and class roster replacement

use super::events::AcademicEvent;
use super::service::{internal, store_error, Service};
use super::validation::ensure_distinct;
use crate::contract::{AcademicYear, AcademicsError, Class, Teacher, TeachingAssignment};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use uuid::Uuid;

/// Build the rows that replace a class roster. The first teacher is primary.
///
/// Subject sets start empty: a roster edit clears and recreates every row.
pub fn build_roster(
    class_id: Uuid,
    ordered_teachers: &[Uuid],
    assigned_at: DateTime<Utc>,
) -> Vec<TeachingAssignment> {
    ordered_teachers
        .iter()
        .enumerate()
        .map(|(position, teacher_id)| TeachingAssignment {
            id: Uuid::new_v4(),
            class_id,
            teacher_id: *teacher_id,
            is_primary: position == 0,
            date_assigned: assigned_at,
            subject_ids: Vec::new(),
        })
        .collect()
}

/// The unique primary row of a class roster.
///
/// More than one primary row is an invariant violation and is reported as
/// `Consistency`, never repaired.
pub fn select_primary(
    class_id: Uuid,
    roster: &[TeachingAssignment],
) -> Result<Option<&TeachingAssignment>, AcademicsError> {
    let mut primaries = roster.iter().filter(|row| row.is_primary);
    let first = primaries.next();
    let extra = primaries.count();
    if extra > 0 {
        return Err(AcademicsError::Consistency {
            details: format!(
                "class {} has {} primary teaching assignments",
                class_id,
                extra + 1
            ),
        });
    }
    Ok(first)
}

impl Service {
    /// Primary teacher of a class, if any
    pub async fn primary_teacher(&self, class_id: Uuid) -> Result<Option<Teacher>, AcademicsError> {
        self.get_class(class_id).await?;

        let roster = self
            .repos
            .teaching
            .find_by_class(class_id)
            .await
            .map_err(internal)?;

        let primary = match select_primary(class_id, &roster) {
            Ok(primary) => primary,
            Err(err) => {
                tracing::error!(class_id = %class_id, error = %err, "primary teacher invariant violated");
                return Err(err);
            }
        };
        let Some(row) = primary else {
            return Ok(None);
        };

        let teacher = self
            .repos
            .directory
            .find_teacher(row.teacher_id)
            .await
            .map_err(internal)?;

        match teacher {
            Some(teacher) => Ok(Some(teacher)),
            None => {
                let err = AcademicsError::Consistency {
                    details: format!(
                        "primary teaching assignment {} references missing teacher {}",
                        row.id, row.teacher_id
                    ),
                };
                tracing::error!(class_id = %class_id, error = %err, "dangling primary teacher");
                Err(err)
            }
        }
    }

    /// Replace the class roster. The first teacher becomes primary; an empty
    /// list leaves the class without teachers.
    pub async fn set_teacher_roster(
        &self,
        class_id: Uuid,
        ordered_teachers: &[Uuid],
    ) -> Result<Vec<TeachingAssignment>, AcademicsError> {
        self.get_class(class_id).await?;
        ensure_distinct("roster_entry", ordered_teachers)?;
        self.ensure_teachers_exist(ordered_teachers).await?;

        let roster = build_roster(class_id, ordered_teachers, self.clock.now());
        let saved = self
            .repos
            .teaching
            .replace_roster(class_id, &roster)
            .await
            .map_err(store_error("roster_entry", class_id))?;

        tracing::info!(
            class_id = %class_id,
            teachers = saved.len(),
            primary = ?ordered_teachers.first(),
            "class roster replaced"
        );
        self.publish(AcademicEvent::roster_replaced(
            class_id,
            ordered_teachers,
            self.clock.now(),
        ))
        .await;

        Ok(saved)
    }

    /// Classes in which the teacher holds a primary binding for the year
    pub async fn primary_classes(
        &self,
        teacher_id: Uuid,
        year: AcademicYear,
    ) -> Result<Vec<Class>, AcademicsError> {
        let bindings = self.resolve_current_teaching(teacher_id, year).await?;
        let mut class_ids: Vec<Uuid> = bindings
            .iter()
            .filter(|b| b.is_primary)
            .map(|b| b.class_id)
            .collect();
        class_ids.sort_unstable();
        class_ids.dedup();
        if class_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut classes = self
            .repos
            .directory
            .find_classes(&class_ids)
            .await
            .map_err(internal)?;
        classes.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(classes)
    }

    /// Class-wide operations (e.g. attendance) are reserved to the primary teacher
    pub async fn authorize_class_wide(
        &self,
        teacher_id: Uuid,
        class_id: Uuid,
    ) -> Result<(), AcademicsError> {
        match self.primary_teacher(class_id).await? {
            Some(primary) if primary.id == teacher_id => Ok(()),
            _ => Err(AcademicsError::authorization(format!(
                "teacher {} is not the primary teacher of class {}",
                teacher_id, class_id
            ))),
        }
    }

    async fn ensure_teachers_exist(&self, ids: &[Uuid]) -> Result<(), AcademicsError> {
        if ids.is_empty() {
            return Ok(());
        }
        let found: HashSet<Uuid> = self
            .repos
            .directory
            .find_teachers(ids)
            .await
            .map_err(internal)?
            .into_iter()
            .map(|t| t.id)
            .collect();

        match ids.iter().find(|id| !found.contains(id)) {
            Some(missing) => Err(AcademicsError::not_found("teacher", missing)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_teacher_is_the_only_primary() {
        let class_id = Uuid::new_v4();
        let teachers = [Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];

        let roster = build_roster(class_id, &teachers, Utc::now());

        assert_eq!(roster.len(), 3);
        assert_eq!(roster.iter().filter(|r| r.is_primary).count(), 1);
        assert!(roster[0].is_primary);
        assert_eq!(roster[0].teacher_id, teachers[0]);
        assert!(roster.iter().all(|r| r.class_id == class_id && r.subject_ids.is_empty()));
    }

    #[test]
    fn empty_roster_has_no_primary() {
        let class_id = Uuid::new_v4();
        let roster = build_roster(class_id, &[], Utc::now());

        assert!(roster.is_empty());
        assert!(select_primary(class_id, &roster).unwrap().is_none());
    }

    #[test]
    fn two_primaries_is_a_consistency_error() {
        let class_id = Uuid::new_v4();
        let mut roster = build_roster(class_id, &[Uuid::new_v4(), Uuid::new_v4()], Utc::now());
        roster[1].is_primary = true;

        assert!(matches!(
            select_primary(class_id, &roster),
            Err(AcademicsError::Consistency { .. })
        ));
    }
}
