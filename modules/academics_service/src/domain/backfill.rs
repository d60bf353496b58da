//! Migration of legacy direct subject links into the junction tables
//!
//! Planning is pure; the repository applies a plan in one transaction. Running
//! the backfill again on a migrated store yields an empty plan.

use super::events::{AcademicEvent, LegacyLinksBackfilledEvent};
use super::service::{internal, store_error, Service};
use crate::contract::{
    AcademicYear, AcademicsError, BackfillReport, Subject, SubjectAssignment, TeachingAssignment,
};
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap, HashSet};
use uuid::Uuid;

/// Writes needed to retire the legacy direct links
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackfillPlan {
    /// (teaching assignment, subject) pairs to add to subject sets
    pub links: Vec<(Uuid, Uuid)>,
    pub subject_assignments: Vec<SubjectAssignment>,
    /// (subject, canonical label) for subjects stored with a legacy year label
    pub year_rewrites: Vec<(Uuid, String)>,
    /// Subjects whose direct class has no teaching assignment, or whose year
    /// label cannot be parsed
    pub skipped: Vec<Uuid>,
}

impl BackfillPlan {
    pub fn is_empty(&self) -> bool {
        self.links.is_empty() && self.subject_assignments.is_empty() && self.year_rewrites.is_empty()
    }

    pub fn report(&self) -> BackfillReport {
        BackfillReport {
            roster_links_added: self.links.len(),
            subject_assignments_created: self.subject_assignments.len(),
            academic_years_normalized: self.year_rewrites.len(),
            skipped_subjects: self.skipped.clone(),
        }
    }
}

/// Compute the backfill for `subjects`.
///
/// `teaching_by_class` holds the teaching assignments of every direct class
/// referenced by the subjects; `existing` holds (teacher, subject, canonical
/// year) keys already present in the subject-assignment junction.
pub fn plan_backfill(
    subjects: &[Subject],
    teaching_by_class: &HashMap<Uuid, Vec<TeachingAssignment>>,
    existing: &HashSet<(Uuid, Uuid, String)>,
    now: DateTime<Utc>,
) -> BackfillPlan {
    let mut plan = BackfillPlan::default();
    let mut skipped = BTreeSet::new();

    for subject in subjects {
        if let Some(class_id) = subject.direct_class_id {
            match teaching_by_class.get(&class_id) {
                Some(rows) if !rows.is_empty() => plan.links.extend(
                    rows.iter()
                        .filter(|row| !row.subject_ids.contains(&subject.id))
                        .map(|row| (row.id, subject.id)),
                ),
                _ => {
                    skipped.insert(subject.id);
                }
            }
        }

        let year = match AcademicYear::parse(&subject.academic_year) {
            Ok(year) => year,
            Err(_) => {
                tracing::warn!(
                    subject_id = %subject.id,
                    label = %subject.academic_year,
                    "subject has an unparseable academic year"
                );
                skipped.insert(subject.id);
                continue;
            }
        };
        let canonical = year.to_string();
        if canonical != subject.academic_year {
            plan.year_rewrites.push((subject.id, canonical.clone()));
        }

        if let Some(teacher_id) = subject.direct_teacher_id {
            if !existing.contains(&(teacher_id, subject.id, canonical.clone())) {
                plan.subject_assignments.push(SubjectAssignment {
                    id: Uuid::new_v4(),
                    teacher_id,
                    subject_id: subject.id,
                    academic_year: canonical,
                    assigned_at: now,
                });
            }
        }
    }

    plan.skipped = skipped.into_iter().collect();
    plan
}

impl Service {
    /// Copy legacy direct links into the junctions and canonicalize year labels
    pub async fn backfill_legacy_links(&self) -> Result<BackfillReport, AcademicsError> {
        let subjects = self.repos.subjects.list_all().await.map_err(internal)?;

        let class_ids: BTreeSet<Uuid> = subjects.iter().filter_map(|s| s.direct_class_id).collect();
        let mut teaching_by_class = HashMap::with_capacity(class_ids.len());
        for class_id in class_ids {
            let rows = self
                .repos
                .teaching
                .find_by_class(class_id)
                .await
                .map_err(internal)?;
            teaching_by_class.insert(class_id, rows);
        }

        let teacher_ids: BTreeSet<Uuid> =
            subjects.iter().filter_map(|s| s.direct_teacher_id).collect();
        let mut existing = HashSet::new();
        for teacher_id in teacher_ids {
            let rows = self
                .repos
                .subjects
                .find_subject_assignments(teacher_id, None)
                .await
                .map_err(internal)?;
            existing.extend(
                rows.into_iter()
                    .map(|sa| (sa.teacher_id, sa.subject_id, sa.academic_year)),
            );
        }

        let plan = plan_backfill(&subjects, &teaching_by_class, &existing, self.clock.now());
        let report = plan.report();

        if !plan.skipped.is_empty() {
            tracing::warn!(
                skipped = plan.skipped.len(),
                "some legacy subject links could not be backfilled"
            );
        }
        if plan.is_empty() {
            tracing::debug!("legacy links already backfilled");
            return Ok(report);
        }

        self.repos
            .subjects
            .apply_backfill(&plan)
            .await
            .map_err(store_error("subject_assignment", "legacy backfill"))?;

        tracing::info!(
            roster_links_added = report.roster_links_added,
            subject_assignments_created = report.subject_assignments_created,
            academic_years_normalized = report.academic_years_normalized,
            "legacy links backfilled"
        );
        self.publish(AcademicEvent::LegacyLinksBackfilled(LegacyLinksBackfilledEvent {
            roster_links_added: report.roster_links_added,
            subject_assignments_created: report.subject_assignments_created,
            academic_years_normalized: report.academic_years_normalized,
            timestamp: self.clock.now(),
        }))
        .await;

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject(class_id: Option<Uuid>, teacher_id: Option<Uuid>, year: &str) -> Subject {
        Subject {
            id: Uuid::new_v4(),
            name: "Physics".to_string(),
            direct_class_id: class_id,
            direct_teacher_id: teacher_id,
            term: "Term 2".to_string(),
            academic_year: year.to_string(),
        }
    }

    fn row(class_id: Uuid, subject_ids: Vec<Uuid>) -> TeachingAssignment {
        TeachingAssignment {
            id: Uuid::new_v4(),
            class_id,
            teacher_id: Uuid::new_v4(),
            is_primary: true,
            date_assigned: Utc::now(),
            subject_ids,
        }
    }

    #[test]
    fn plans_links_assignments_and_year_rewrites() {
        let class_id = Uuid::new_v4();
        let teacher_id = Uuid::new_v4();
        let physics = subject(Some(class_id), Some(teacher_id), "2024");
        let rows = vec![row(class_id, vec![]), row(class_id, vec![physics.id])];
        let by_class = HashMap::from([(class_id, rows.clone())]);

        let plan = plan_backfill(std::slice::from_ref(&physics), &by_class, &HashSet::new(), Utc::now());

        assert_eq!(plan.links, vec![(rows[0].id, physics.id)]);
        assert_eq!(plan.year_rewrites, vec![(physics.id, "2024-2025".to_string())]);
        assert_eq!(plan.subject_assignments.len(), 1);
        assert_eq!(plan.subject_assignments[0].academic_year, "2024-2025");
        assert!(plan.skipped.is_empty());
    }

    #[test]
    fn migrated_subject_yields_empty_plan() {
        let class_id = Uuid::new_v4();
        let teacher_id = Uuid::new_v4();
        let physics = subject(Some(class_id), Some(teacher_id), "2024-2025");
        let by_class = HashMap::from([(class_id, vec![row(class_id, vec![physics.id])])]);
        let existing = HashSet::from([(teacher_id, physics.id, "2024-2025".to_string())]);

        let plan = plan_backfill(&[physics], &by_class, &existing, Utc::now());

        assert!(plan.is_empty());
        assert_eq!(plan.report(), BackfillReport::default());
    }

    #[test]
    fn class_without_teaching_rows_is_skipped() {
        let orphan = subject(Some(Uuid::new_v4()), None, "2024-2025");

        let plan = plan_backfill(std::slice::from_ref(&orphan), &HashMap::new(), &HashSet::new(), Utc::now());

        assert!(plan.is_empty());
        assert_eq!(plan.skipped, vec![orphan.id]);
    }
}
