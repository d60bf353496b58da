//! Teaching assignment resolver
//!
//! Derives the authoritative (teacher, class, subject) bindings for an
//! academic year from the class x teacher junction and the subject sets
//! attached to it. An empty result is returned as-is; falling back to other
//! years is a caller decision (see [`Service::teaching_history`]).

use super::service::{internal, Service};
use crate::contract::{AcademicYear, AcademicsError, Subject, TeachingAssignment, TeachingBinding};
use std::collections::{BTreeSet, HashMap};
use uuid::Uuid;

/// Reconcile teaching assignments with their subjects.
///
/// With `year` set, only subjects whose stored label denotes that year
/// survive. Subject ids missing from `subjects` are ignored.
pub fn resolve_bindings(
    assignments: &[TeachingAssignment],
    subjects: &HashMap<Uuid, Subject>,
    year: Option<AcademicYear>,
) -> BTreeSet<TeachingBinding> {
    assignments
        .iter()
        .flat_map(move |assignment| {
            assignment.subject_ids.iter().filter_map(move |subject_id| {
                let subject = subjects.get(subject_id)?;
                if let Some(year) = year {
                    if !year.matches(&subject.academic_year) {
                        return None;
                    }
                }
                Some(TeachingBinding {
                    teacher_id: assignment.teacher_id,
                    class_id: assignment.class_id,
                    subject_id: subject.id,
                    is_primary: assignment.is_primary,
                })
            })
        })
        .collect()
}

impl Service {
    /// Bindings of a teacher valid in `as_of_year`
    pub async fn resolve_current_teaching(
        &self,
        teacher_id: Uuid,
        as_of_year: AcademicYear,
    ) -> Result<BTreeSet<TeachingBinding>, AcademicsError> {
        self.get_teacher(teacher_id).await?;

        let assignments = self
            .repos
            .teaching
            .find_by_teacher(teacher_id)
            .await
            .map_err(internal)?;
        let subjects = self.load_subjects(&assignments).await?;
        let bindings = resolve_bindings(&assignments, &subjects, Some(as_of_year));

        if bindings.is_empty() && !assignments.is_empty() {
            tracing::debug!(
                teacher_id = %teacher_id,
                year = %as_of_year,
                assignments = assignments.len(),
                "teacher has no current assignments for year"
            );
        }

        Ok(bindings)
    }

    /// Bindings of a class valid in `as_of_year`
    pub async fn resolve_class_roster(
        &self,
        class_id: Uuid,
        as_of_year: AcademicYear,
    ) -> Result<BTreeSet<TeachingBinding>, AcademicsError> {
        self.get_class(class_id).await?;

        let assignments = self
            .repos
            .teaching
            .find_by_class(class_id)
            .await
            .map_err(internal)?;
        let subjects = self.load_subjects(&assignments).await?;

        Ok(resolve_bindings(&assignments, &subjects, Some(as_of_year)))
    }

    /// Bindings of a teacher across every academic year
    pub async fn teaching_history(
        &self,
        teacher_id: Uuid,
    ) -> Result<BTreeSet<TeachingBinding>, AcademicsError> {
        self.get_teacher(teacher_id).await?;

        let assignments = self
            .repos
            .teaching
            .find_by_teacher(teacher_id)
            .await
            .map_err(internal)?;
        let subjects = self.load_subjects(&assignments).await?;

        Ok(resolve_bindings(&assignments, &subjects, None))
    }

    /// Whether the teacher holds a binding for (class, subject) in the year
    pub async fn is_bound(
        &self,
        teacher_id: Uuid,
        class_id: Uuid,
        subject_id: Uuid,
        year: AcademicYear,
    ) -> Result<bool, AcademicsError> {
        let bindings = self.resolve_current_teaching(teacher_id, year).await?;
        Ok(bindings
            .iter()
            .any(|b| b.class_id == class_id && b.subject_id == subject_id))
    }

    async fn load_subjects(
        &self,
        assignments: &[TeachingAssignment],
    ) -> Result<HashMap<Uuid, Subject>, AcademicsError> {
        let mut ids: Vec<Uuid> = assignments
            .iter()
            .flat_map(|a| a.subject_ids.iter().copied())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let subjects = self
            .repos
            .subjects
            .find_many(&ids)
            .await
            .map_err(internal)?;

        Ok(subjects.into_iter().map(|s| (s.id, s)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn subject(name: &str, year: &str) -> Subject {
        Subject {
            id: Uuid::new_v4(),
            name: name.to_string(),
            direct_class_id: None,
            direct_teacher_id: None,
            term: "Term 1".to_string(),
            academic_year: year.to_string(),
        }
    }

    fn assignment(class_id: Uuid, teacher_id: Uuid, primary: bool, subjects: &[&Subject]) -> TeachingAssignment {
        TeachingAssignment {
            id: Uuid::new_v4(),
            class_id,
            teacher_id,
            is_primary: primary,
            date_assigned: Utc::now(),
            subject_ids: subjects.iter().map(|s| s.id).collect(),
        }
    }

    #[test]
    fn keeps_only_subjects_of_the_requested_year() {
        let teacher = Uuid::new_v4();
        let class_a = Uuid::new_v4();
        let class_b = Uuid::new_v4();
        let math = subject("Math", "2025-2026");
        let legacy_physics = subject("Physics", "2025");
        let old_history = subject("History", "2024-2025");

        let assignments = vec![
            assignment(class_a, teacher, true, &[&math, &old_history]),
            assignment(class_b, teacher, false, &[&legacy_physics]),
        ];
        let subjects: HashMap<_, _> = [&math, &legacy_physics, &old_history]
            .into_iter()
            .map(|s| (s.id, s.clone()))
            .collect();

        let bindings = resolve_bindings(&assignments, &subjects, Some(AcademicYear::starting(2025)));

        assert_eq!(bindings.len(), 2);
        assert!(bindings.contains(&TeachingBinding {
            teacher_id: teacher,
            class_id: class_a,
            subject_id: math.id,
            is_primary: true,
        }));
        assert!(bindings.contains(&TeachingBinding {
            teacher_id: teacher,
            class_id: class_b,
            subject_id: legacy_physics.id,
            is_primary: false,
        }));
    }

    #[test]
    fn empty_intersection_yields_empty_set() {
        let old = subject("Latin", "2019-2020");
        let assignments = vec![assignment(Uuid::new_v4(), Uuid::new_v4(), true, &[&old])];
        let subjects = HashMap::from([(old.id, old.clone())]);

        assert!(resolve_bindings(&assignments, &subjects, Some(AcademicYear::starting(2025))).is_empty());
        assert_eq!(resolve_bindings(&assignments, &subjects, None).len(), 1);
    }

    #[test]
    fn dangling_subject_ids_are_ignored() {
        let mut a = assignment(Uuid::new_v4(), Uuid::new_v4(), false, &[]);
        a.subject_ids.push(Uuid::new_v4());

        assert!(resolve_bindings(&[a], &HashMap::new(), None).is_empty());
    }
}
