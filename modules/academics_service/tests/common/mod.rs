//! Common test utilities: in-memory repositories and a small school fixture

#![allow(dead_code)]

use academics_service::contract::*;
use academics_service::domain::backfill::BackfillPlan;
use academics_service::domain::repository::{
    CourseworkRepository, DirectoryRepository, Repositories, StorageError, SubjectRepository,
    TeachingRepository,
};
use academics_service::domain::{AcademicEvent, EventPublisher, FixedClock, Service};
use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

pub fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

fn unique(what: &str) -> anyhow::Error {
    StorageError::UniqueViolation(what.to_string()).into()
}

// ===== In-memory store =====

#[derive(Default)]
struct State {
    classes: HashMap<Uuid, Class>,
    teachers: HashMap<Uuid, Teacher>,
    students: HashMap<Uuid, Student>,
    subjects: HashMap<Uuid, Subject>,
    teaching: Vec<TeachingAssignment>,
    subject_assignments: Vec<SubjectAssignment>,
    assignments: HashMap<Uuid, Assignment>,
    submissions: HashMap<Uuid, AssignmentSubmission>,
    grades: HashMap<Uuid, Grade>,
}

/// Repository doubles sharing one state, enforcing the same unique keys as
/// the migrations
#[derive(Clone, Default)]
pub struct MockStore {
    state: Arc<RwLock<State>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn repositories(&self) -> Repositories {
        Repositories {
            directory: Arc::new(self.clone()),
            subjects: Arc::new(self.clone()),
            teaching: Arc::new(self.clone()),
            coursework: Arc::new(self.clone()),
        }
    }

    /// Insert a teaching row directly, bypassing the roster rules
    pub fn insert_teaching_row(&self, row: TeachingAssignment) {
        self.state.write().teaching.push(row);
    }

    /// Insert a subject directly, e.g. with a legacy year label
    pub fn insert_subject(&self, subject: Subject) {
        self.state.write().subjects.insert(subject.id, subject);
    }

    pub fn subject(&self, id: Uuid) -> Option<Subject> {
        self.state.read().subjects.get(&id).cloned()
    }

    pub fn teaching_rows(&self, class_id: Uuid) -> Vec<TeachingAssignment> {
        sorted(
            self.state
                .read()
                .teaching
                .iter()
                .filter(|t| t.class_id == class_id)
                .cloned()
                .collect(),
        )
    }

    pub fn print_state(&self, context: &str) {
        let state = self.state.read();
        println!("\n========== Store State: {} ==========", context);
        println!(
            "classes={} teachers={} subjects={} teaching_rows={} submissions={}",
            state.classes.len(),
            state.teachers.len(),
            state.subjects.len(),
            state.teaching.len(),
            state.submissions.len()
        );
        for row in &state.teaching {
            println!(
                "  class={} teacher={} primary={} subjects={}",
                row.class_id,
                row.teacher_id,
                row.is_primary,
                row.subject_ids.len()
            );
        }
    }
}

fn sorted(mut rows: Vec<TeachingAssignment>) -> Vec<TeachingAssignment> {
    rows.sort_by(|a, b| {
        b.is_primary
            .cmp(&a.is_primary)
            .then(a.date_assigned.cmp(&b.date_assigned))
            .then(a.id.cmp(&b.id))
    });
    rows
}

#[async_trait]
impl DirectoryRepository for MockStore {
    async fn create_class(&self, class: &Class) -> Result<Class> {
        let mut state = self.state.write();
        if state.classes.values().any(|c| c.name == class.name) {
            return Err(unique("classes.name"));
        }
        state.classes.insert(class.id, class.clone());
        Ok(class.clone())
    }

    async fn find_class(&self, id: Uuid) -> Result<Option<Class>> {
        Ok(self.state.read().classes.get(&id).cloned())
    }

    async fn find_classes(&self, ids: &[Uuid]) -> Result<Vec<Class>> {
        let state = self.state.read();
        let mut classes: Vec<Class> = ids.iter().filter_map(|id| state.classes.get(id).cloned()).collect();
        classes.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(classes)
    }

    async fn create_teacher(&self, teacher: &Teacher) -> Result<Teacher> {
        let mut state = self.state.write();
        if state.teachers.values().any(|t| t.employee_code == teacher.employee_code) {
            return Err(unique("teachers.employee_code"));
        }
        state.teachers.insert(teacher.id, teacher.clone());
        Ok(teacher.clone())
    }

    async fn find_teacher(&self, id: Uuid) -> Result<Option<Teacher>> {
        Ok(self.state.read().teachers.get(&id).cloned())
    }

    async fn find_teachers(&self, ids: &[Uuid]) -> Result<Vec<Teacher>> {
        let state = self.state.read();
        Ok(ids.iter().filter_map(|id| state.teachers.get(id).cloned()).collect())
    }

    async fn create_student(&self, student: &Student) -> Result<Student> {
        let mut state = self.state.write();
        if state
            .students
            .values()
            .any(|s| s.admission_number == student.admission_number)
        {
            return Err(unique("students.admission_number"));
        }
        state.students.insert(student.id, student.clone());
        Ok(student.clone())
    }

    async fn find_student(&self, id: Uuid) -> Result<Option<Student>> {
        Ok(self.state.read().students.get(&id).cloned())
    }

    async fn find_students_in_class(&self, class_id: Uuid) -> Result<Vec<Student>> {
        let mut students: Vec<Student> = self
            .state
            .read()
            .students
            .values()
            .filter(|s| s.current_class_id == Some(class_id))
            .cloned()
            .collect();
        students.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        Ok(students)
    }
}

#[async_trait]
impl SubjectRepository for MockStore {
    async fn create(&self, subject: &Subject) -> Result<Subject> {
        self.state.write().subjects.insert(subject.id, subject.clone());
        Ok(subject.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Subject>> {
        Ok(self.state.read().subjects.get(&id).cloned())
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Subject>> {
        let state = self.state.read();
        let mut subjects: Vec<Subject> = ids.iter().filter_map(|id| state.subjects.get(id).cloned()).collect();
        subjects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(subjects)
    }

    async fn find_by_direct_class(&self, class_id: Uuid) -> Result<Vec<Subject>> {
        let mut subjects: Vec<Subject> = self
            .state
            .read()
            .subjects
            .values()
            .filter(|s| s.direct_class_id == Some(class_id))
            .cloned()
            .collect();
        subjects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(subjects)
    }

    async fn list_all(&self) -> Result<Vec<Subject>> {
        let mut subjects: Vec<Subject> = self.state.read().subjects.values().cloned().collect();
        subjects.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(subjects)
    }

    async fn create_subject_assignment(
        &self,
        assignment: &SubjectAssignment,
    ) -> Result<SubjectAssignment> {
        let mut state = self.state.write();
        if state.subject_assignments.iter().any(|sa| {
            sa.teacher_id == assignment.teacher_id
                && sa.subject_id == assignment.subject_id
                && sa.academic_year == assignment.academic_year
        }) {
            return Err(unique("subject_assignments.teacher_subject_year"));
        }
        state.subject_assignments.push(assignment.clone());
        Ok(assignment.clone())
    }

    async fn find_subject_assignments(
        &self,
        teacher_id: Uuid,
        academic_year: Option<&str>,
    ) -> Result<Vec<SubjectAssignment>> {
        Ok(self
            .state
            .read()
            .subject_assignments
            .iter()
            .filter(|sa| sa.teacher_id == teacher_id)
            .filter(|sa| academic_year.map_or(true, |year| sa.academic_year == year))
            .cloned()
            .collect())
    }

    async fn apply_backfill(&self, plan: &BackfillPlan) -> Result<()> {
        let mut state = self.state.write();
        for (teaching_id, subject_id) in &plan.links {
            let Some(row) = state.teaching.iter_mut().find(|t| t.id == *teaching_id) else {
                bail!("teaching assignment {} vanished", teaching_id);
            };
            if !row.subject_ids.contains(subject_id) {
                row.subject_ids.push(*subject_id);
            }
        }
        state
            .subject_assignments
            .extend(plan.subject_assignments.iter().cloned());
        for (subject_id, label) in &plan.year_rewrites {
            if let Some(subject) = state.subjects.get_mut(subject_id) {
                subject.academic_year = label.clone();
            }
        }
        Ok(())
    }
}

#[async_trait]
impl TeachingRepository for MockStore {
    async fn find_by_teacher(&self, teacher_id: Uuid) -> Result<Vec<TeachingAssignment>> {
        Ok(sorted(
            self.state
                .read()
                .teaching
                .iter()
                .filter(|t| t.teacher_id == teacher_id)
                .cloned()
                .collect(),
        ))
    }

    async fn find_by_class(&self, class_id: Uuid) -> Result<Vec<TeachingAssignment>> {
        Ok(self.teaching_rows(class_id))
    }

    async fn find_by_subject(&self, subject_id: Uuid) -> Result<Vec<TeachingAssignment>> {
        Ok(self
            .state
            .read()
            .teaching
            .iter()
            .filter(|t| t.subject_ids.contains(&subject_id))
            .cloned()
            .collect())
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<TeachingAssignment>> {
        Ok(self
            .state
            .read()
            .teaching
            .iter()
            .filter(|t| ids.contains(&t.id))
            .cloned()
            .collect())
    }

    async fn replace_roster(
        &self,
        class_id: Uuid,
        roster: &[TeachingAssignment],
    ) -> Result<Vec<TeachingAssignment>> {
        {
            let mut state = self.state.write();
            for (i, row) in roster.iter().enumerate() {
                if roster[..i].iter().any(|r| r.teacher_id == row.teacher_id) {
                    return Err(unique("teaching_assignments.class_teacher"));
                }
            }
            state.teaching.retain(|t| t.class_id != class_id);
            state.teaching.extend(roster.iter().cloned());
        }
        Ok(self.teaching_rows(class_id))
    }

    async fn set_subjects(&self, teaching_ids: &[Uuid], subject_ids: &[Uuid]) -> Result<()> {
        let mut state = self.state.write();
        for row in state.teaching.iter_mut().filter(|t| teaching_ids.contains(&t.id)) {
            row.subject_ids = subject_ids.to_vec();
        }
        Ok(())
    }

    async fn reassign_class_subjects(&self, class_id: Uuid, subject_ids: &[Uuid]) -> Result<()> {
        let mut state = self.state.write();
        for row in state.teaching.iter_mut().filter(|t| t.class_id == class_id) {
            row.subject_ids = subject_ids.to_vec();
        }
        for subject in state.subjects.values_mut() {
            if subject_ids.contains(&subject.id) {
                subject.direct_class_id = Some(class_id);
            } else if subject.direct_class_id == Some(class_id) {
                subject.direct_class_id = None;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CourseworkRepository for MockStore {
    async fn create_assignment(&self, assignment: &Assignment) -> Result<Assignment> {
        self.state
            .write()
            .assignments
            .insert(assignment.id, assignment.clone());
        Ok(assignment.clone())
    }

    async fn find_assignment(&self, id: Uuid) -> Result<Option<Assignment>> {
        Ok(self.state.read().assignments.get(&id).cloned())
    }

    async fn update_assignment(&self, assignment: &Assignment) -> Result<Assignment> {
        let mut state = self.state.write();
        if !state.assignments.contains_key(&assignment.id) {
            bail!("assignment {} does not exist", assignment.id);
        }
        state.assignments.insert(assignment.id, assignment.clone());
        Ok(assignment.clone())
    }

    async fn create_submission(
        &self,
        submission: &AssignmentSubmission,
    ) -> Result<AssignmentSubmission> {
        let mut state = self.state.write();
        if state.submissions.values().any(|s| {
            s.assignment_id == submission.assignment_id && s.student_id == submission.student_id
        }) {
            return Err(unique("assignment_submissions.assignment_student"));
        }
        state.submissions.insert(submission.id, submission.clone());
        Ok(submission.clone())
    }

    async fn find_submission_for(
        &self,
        assignment_id: Uuid,
        student_id: Uuid,
    ) -> Result<Option<AssignmentSubmission>> {
        Ok(self
            .state
            .read()
            .submissions
            .values()
            .find(|s| s.assignment_id == assignment_id && s.student_id == student_id)
            .cloned())
    }

    async fn update_submission_grade(
        &self,
        id: Uuid,
        grade: u8,
        feedback: &str,
    ) -> Result<Option<AssignmentSubmission>> {
        let mut state = self.state.write();
        Ok(state.submissions.get_mut(&id).map(|s| {
            s.grade = Some(grade);
            s.feedback = feedback.to_string();
            s.clone()
        }))
    }

    async fn create_grade(&self, grade: &Grade) -> Result<Grade> {
        let mut state = self.state.write();
        if state
            .grades
            .values()
            .any(|g| g.student_id == grade.student_id && g.subject_id == grade.subject_id)
        {
            return Err(unique("grades.student_subject"));
        }
        state.grades.insert(grade.id, grade.clone());
        Ok(grade.clone())
    }

    async fn find_grade(&self, id: Uuid) -> Result<Option<Grade>> {
        Ok(self.state.read().grades.get(&id).cloned())
    }

    async fn find_grade_for(&self, student_id: Uuid, subject_id: Uuid) -> Result<Option<Grade>> {
        Ok(self
            .state
            .read()
            .grades
            .values()
            .find(|g| g.student_id == student_id && g.subject_id == subject_id)
            .cloned())
    }

    async fn find_grades_for_student(&self, student_id: Uuid) -> Result<Vec<Grade>> {
        let mut grades: Vec<Grade> = self
            .state
            .read()
            .grades
            .values()
            .filter(|g| g.student_id == student_id)
            .cloned()
            .collect();
        grades.sort_by(|a, b| a.recorded_at.cmp(&b.recorded_at).then(a.id.cmp(&b.id)));
        Ok(grades)
    }

    async fn update_grade(&self, grade: &Grade) -> Result<Grade> {
        self.state.write().grades.insert(grade.id, grade.clone());
        Ok(grade.clone())
    }
}

// ===== Event publishers =====

#[derive(Default)]
pub struct RecordingPublisher {
    events: RwLock<Vec<AcademicEvent>>,
}

impl RecordingPublisher {
    pub fn events(&self) -> Vec<AcademicEvent> {
        self.events.read().clone()
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.events.read().iter().map(|e| e.kind()).collect()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, event: AcademicEvent) -> Result<()> {
        self.events.write().push(event);
        Ok(())
    }
}

pub struct FailingPublisher;

#[async_trait]
impl EventPublisher for FailingPublisher {
    async fn publish(&self, _event: AcademicEvent) -> Result<()> {
        bail!("event bus unavailable")
    }
}

// ===== School fixture =====

/// Service over the in-memory store with the clock inside academic year 2025-2026
pub struct School {
    pub store: MockStore,
    pub clock: Arc<FixedClock>,
    pub events: Arc<RecordingPublisher>,
    pub service: Service,
}

impl School {
    pub fn new() -> Self {
        Self::starting_at(at(2025, 9, 15))
    }

    pub fn starting_at(now: DateTime<Utc>) -> Self {
        init_tracing();
        let store = MockStore::new();
        let clock = Arc::new(FixedClock::new(now));
        let events = Arc::new(RecordingPublisher::default());
        let service = Service::new(store.repositories(), clock.clone(), events.clone());
        Self {
            store,
            clock,
            events,
            service,
        }
    }

    pub async fn class(&self, name: &str) -> Class {
        self.service.create_class(name).await.unwrap()
    }

    pub async fn teacher(&self, code: &str) -> Teacher {
        self.service
            .create_teacher(code, &format!("Teacher {}", code), false)
            .await
            .unwrap()
    }

    pub async fn student(&self, admission_number: &str, class: &Class) -> Student {
        self.service
            .create_student(
                admission_number,
                &format!("Student {}", admission_number),
                Some(class.id),
                None,
            )
            .await
            .unwrap()
    }

    pub async fn subject(&self, name: &str, year: &str) -> Subject {
        self.subject_with(name, year, None, None).await
    }

    pub async fn subject_with(
        &self,
        name: &str,
        year: &str,
        direct_class: Option<&Class>,
        direct_teacher: Option<&Teacher>,
    ) -> Subject {
        self.service
            .create_subject(NewSubject {
                name: name.to_string(),
                term: "Term 1".to_string(),
                academic_year: year.to_string(),
                direct_class_id: direct_class.map(|c| c.id),
                direct_teacher_id: direct_teacher.map(|t| t.id),
            })
            .await
            .unwrap()
    }

    /// Put `teachers` on the class roster and give every row `subjects`
    pub async fn teach(&self, class: &Class, teachers: &[&Teacher], subjects: &[&Subject]) -> Vec<TeachingAssignment> {
        let ids: Vec<Uuid> = teachers.iter().map(|t| t.id).collect();
        let rows = self.service.set_teacher_roster(class.id, &ids).await.unwrap();
        let row_ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let subject_ids: Vec<Uuid> = subjects.iter().map(|s| s.id).collect();
        self.service
            .assign_subjects_to_assignment(&row_ids, &subject_ids)
            .await
            .unwrap();
        self.store.teaching_rows(class.id)
    }
}

impl Default for School {
    fn default() -> Self {
        Self::new()
    }
}
