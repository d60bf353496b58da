//! SeaORM repository implementations

use crate::contract::{
    Assignment, AssignmentSubmission, Class, Grade, Student, Subject, SubjectAssignment, Teacher,
    TeachingAssignment,
};
use crate::domain::backfill::BackfillPlan;
use crate::domain::repository::{
    CourseworkRepository, DirectoryRepository, Repositories, StorageError, SubjectRepository,
    TeachingRepository,
};
use anyhow::Result;
use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, SqlErr, TransactionTrait,
};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use super::entity::{
    assignment, assignment_submission, class, grade, student, subject, subject_assignment,
    teacher, teaching_assignment, teaching_assignment_subject,
};
use super::mapper;

/// Build the full repository set over one connection
pub fn sea_orm_repositories(db: Arc<DatabaseConnection>) -> Repositories {
    Repositories {
        directory: Arc::new(SeaOrmDirectoryRepository::new(db.clone())),
        subjects: Arc::new(SeaOrmSubjectRepository::new(db.clone())),
        teaching: Arc::new(SeaOrmTeachingRepository::new(db.clone())),
        coursework: Arc::new(SeaOrmCourseworkRepository::new(db)),
    }
}

/// Surface unique constraint violations as `StorageError` so the domain can
/// report them as duplicates
fn classify(err: DbErr) -> anyhow::Error {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            anyhow::Error::new(StorageError::UniqueViolation(detail))
        }
        _ => err.into(),
    }
}

/// Subject ids of each teaching assignment, in subject id order
async fn load_subject_ids<C: ConnectionTrait>(
    conn: &C,
    teaching_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<Uuid>>> {
    if teaching_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let links = teaching_assignment_subject::Entity::find()
        .filter(
            teaching_assignment_subject::Column::TeachingAssignmentId
                .is_in(teaching_ids.iter().copied()),
        )
        .order_by_asc(teaching_assignment_subject::Column::SubjectId)
        .all(conn)
        .await?;

    let mut by_assignment: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for link in links {
        by_assignment
            .entry(link.teaching_assignment_id)
            .or_default()
            .push(link.subject_id);
    }
    Ok(by_assignment)
}

async fn with_subjects<C: ConnectionTrait>(
    conn: &C,
    rows: Vec<teaching_assignment::Model>,
) -> Result<Vec<TeachingAssignment>> {
    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let mut subjects = load_subject_ids(conn, &ids).await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let subject_ids = subjects.remove(&row.id).unwrap_or_default();
            mapper::to_teaching_assignment(row, subject_ids)
        })
        .collect())
}

async fn insert_links<C: ConnectionTrait>(conn: &C, links: &[(Uuid, Uuid)]) -> Result<()> {
    if links.is_empty() {
        return Ok(());
    }

    let models = links
        .iter()
        .map(|(teaching_id, subject_id)| teaching_assignment_subject::ActiveModel {
            teaching_assignment_id: Set(*teaching_id),
            subject_id: Set(*subject_id),
        });
    teaching_assignment_subject::Entity::insert_many(models)
        .exec_without_returning(conn)
        .await
        .map_err(classify)?;
    Ok(())
}

async fn clear_links<C: ConnectionTrait>(conn: &C, teaching_ids: &[Uuid]) -> Result<()> {
    if teaching_ids.is_empty() {
        return Ok(());
    }

    teaching_assignment_subject::Entity::delete_many()
        .filter(
            teaching_assignment_subject::Column::TeachingAssignmentId
                .is_in(teaching_ids.iter().copied()),
        )
        .exec(conn)
        .await?;
    Ok(())
}

/// Serialize roster edits of one class. SQLite has no row locks and relies on
/// its single writer.
async fn lock_class<C: ConnectionTrait>(conn: &C, class_id: Uuid) -> Result<()> {
    class_lock_query(class_id)
        .one(conn)
        .await?
        .ok_or_else(|| anyhow::anyhow!("class {} not found", class_id))?;
    Ok(())
}

fn class_lock_query(class_id: Uuid) -> Select<class::Entity> {
    class::Entity::find_by_id(class_id).lock_exclusive()
}

fn cross(teaching_ids: &[Uuid], subject_ids: &[Uuid]) -> Vec<(Uuid, Uuid)> {
    teaching_ids
        .iter()
        .flat_map(|t| subject_ids.iter().map(move |s| (*t, *s)))
        .collect()
}

// ===== Directory Repository =====

pub struct SeaOrmDirectoryRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmDirectoryRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DirectoryRepository for SeaOrmDirectoryRepository {
    async fn create_class(&self, class: &Class) -> Result<Class> {
        let active: class::ActiveModel = class.into();
        class::Entity::insert(active)
            .exec(&*self.db)
            .await
            .map_err(classify)?;
        Ok(class.clone())
    }

    async fn find_class(&self, id: Uuid) -> Result<Option<Class>> {
        let result = class::Entity::find_by_id(id).one(&*self.db).await?;
        Ok(result.map(Into::into))
    }

    async fn find_classes(&self, ids: &[Uuid]) -> Result<Vec<Class>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let results = class::Entity::find()
            .filter(class::Column::Id.is_in(ids.iter().copied()))
            .order_by_asc(class::Column::Name)
            .all(&*self.db)
            .await?;
        Ok(results.into_iter().map(Into::into).collect())
    }

    async fn create_teacher(&self, teacher: &Teacher) -> Result<Teacher> {
        let active: teacher::ActiveModel = teacher.into();
        teacher::Entity::insert(active)
            .exec(&*self.db)
            .await
            .map_err(classify)?;
        Ok(teacher.clone())
    }

    async fn find_teacher(&self, id: Uuid) -> Result<Option<Teacher>> {
        let result = teacher::Entity::find_by_id(id).one(&*self.db).await?;
        Ok(result.map(Into::into))
    }

    async fn find_teachers(&self, ids: &[Uuid]) -> Result<Vec<Teacher>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let results = teacher::Entity::find()
            .filter(teacher::Column::Id.is_in(ids.iter().copied()))
            .all(&*self.db)
            .await?;
        Ok(results.into_iter().map(Into::into).collect())
    }

    async fn create_student(&self, student: &Student) -> Result<Student> {
        let active: student::ActiveModel = student.into();
        student::Entity::insert(active)
            .exec(&*self.db)
            .await
            .map_err(classify)?;
        Ok(student.clone())
    }

    async fn find_student(&self, id: Uuid) -> Result<Option<Student>> {
        let result = student::Entity::find_by_id(id).one(&*self.db).await?;
        Ok(result.map(Into::into))
    }

    async fn find_students_in_class(&self, class_id: Uuid) -> Result<Vec<Student>> {
        let results = student::Entity::find()
            .filter(student::Column::CurrentClassId.eq(class_id))
            .order_by_asc(student::Column::FullName)
            .all(&*self.db)
            .await?;
        Ok(results.into_iter().map(Into::into).collect())
    }
}

// ===== Subject Repository =====

pub struct SeaOrmSubjectRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmSubjectRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SubjectRepository for SeaOrmSubjectRepository {
    async fn create(&self, subject: &Subject) -> Result<Subject> {
        let active: subject::ActiveModel = subject.into();
        subject::Entity::insert(active)
            .exec(&*self.db)
            .await
            .map_err(classify)?;
        Ok(subject.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Subject>> {
        let result = subject::Entity::find_by_id(id).one(&*self.db).await?;
        Ok(result.map(Into::into))
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Subject>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let results = subject::Entity::find()
            .filter(subject::Column::Id.is_in(ids.iter().copied()))
            .order_by_asc(subject::Column::Name)
            .all(&*self.db)
            .await?;
        Ok(results.into_iter().map(Into::into).collect())
    }

    async fn find_by_direct_class(&self, class_id: Uuid) -> Result<Vec<Subject>> {
        let results = subject::Entity::find()
            .filter(subject::Column::DirectClassId.eq(class_id))
            .order_by_asc(subject::Column::Name)
            .all(&*self.db)
            .await?;
        Ok(results.into_iter().map(Into::into).collect())
    }

    async fn list_all(&self) -> Result<Vec<Subject>> {
        let results = subject::Entity::find()
            .order_by_asc(subject::Column::Name)
            .order_by_asc(subject::Column::Id)
            .all(&*self.db)
            .await?;
        Ok(results.into_iter().map(Into::into).collect())
    }

    async fn create_subject_assignment(
        &self,
        assignment: &SubjectAssignment,
    ) -> Result<SubjectAssignment> {
        let active: subject_assignment::ActiveModel = assignment.into();
        subject_assignment::Entity::insert(active)
            .exec(&*self.db)
            .await
            .map_err(classify)?;
        Ok(assignment.clone())
    }

    async fn find_subject_assignments(
        &self,
        teacher_id: Uuid,
        academic_year: Option<&str>,
    ) -> Result<Vec<SubjectAssignment>> {
        let mut query = subject_assignment::Entity::find()
            .filter(subject_assignment::Column::TeacherId.eq(teacher_id));

        if let Some(year) = academic_year {
            query = query.filter(subject_assignment::Column::AcademicYear.eq(year));
        }

        let results = query
            .order_by_asc(subject_assignment::Column::AcademicYear)
            .order_by_asc(subject_assignment::Column::AssignedAt)
            .all(&*self.db)
            .await?;
        Ok(results.into_iter().map(Into::into).collect())
    }

    async fn apply_backfill(&self, plan: &BackfillPlan) -> Result<()> {
        let txn = self.db.begin().await?;

        insert_links(&txn, &plan.links).await?;

        if !plan.subject_assignments.is_empty() {
            let models = plan
                .subject_assignments
                .iter()
                .map(subject_assignment::ActiveModel::from);
            subject_assignment::Entity::insert_many(models)
                .exec_without_returning(&txn)
                .await
                .map_err(classify)?;
        }

        for (subject_id, label) in &plan.year_rewrites {
            subject::Entity::update_many()
                .col_expr(subject::Column::AcademicYear, Expr::value(label.clone()))
                .filter(subject::Column::Id.eq(*subject_id))
                .exec(&txn)
                .await?;
        }

        txn.commit().await?;
        Ok(())
    }
}

// ===== Teaching Repository =====

pub struct SeaOrmTeachingRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmTeachingRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TeachingRepository for SeaOrmTeachingRepository {
    async fn find_by_teacher(&self, teacher_id: Uuid) -> Result<Vec<TeachingAssignment>> {
        let rows = teaching_assignment::Entity::find()
            .filter(teaching_assignment::Column::TeacherId.eq(teacher_id))
            .order_by_desc(teaching_assignment::Column::IsPrimary)
            .order_by_asc(teaching_assignment::Column::DateAssigned)
            .order_by_asc(teaching_assignment::Column::Id)
            .all(&*self.db)
            .await?;
        with_subjects(&*self.db, rows).await
    }

    async fn find_by_class(&self, class_id: Uuid) -> Result<Vec<TeachingAssignment>> {
        let rows = teaching_assignment::Entity::find()
            .filter(teaching_assignment::Column::ClassId.eq(class_id))
            .order_by_desc(teaching_assignment::Column::IsPrimary)
            .order_by_asc(teaching_assignment::Column::DateAssigned)
            .order_by_asc(teaching_assignment::Column::Id)
            .all(&*self.db)
            .await?;
        with_subjects(&*self.db, rows).await
    }

    async fn find_by_subject(&self, subject_id: Uuid) -> Result<Vec<TeachingAssignment>> {
        let teaching_ids: Vec<Uuid> = teaching_assignment_subject::Entity::find()
            .filter(teaching_assignment_subject::Column::SubjectId.eq(subject_id))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|link| link.teaching_assignment_id)
            .collect();

        self.find_many(&teaching_ids).await
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<TeachingAssignment>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = teaching_assignment::Entity::find()
            .filter(teaching_assignment::Column::Id.is_in(ids.iter().copied()))
            .order_by_asc(teaching_assignment::Column::ClassId)
            .order_by_desc(teaching_assignment::Column::IsPrimary)
            .order_by_asc(teaching_assignment::Column::Id)
            .all(&*self.db)
            .await?;
        with_subjects(&*self.db, rows).await
    }

    async fn replace_roster(
        &self,
        class_id: Uuid,
        roster: &[TeachingAssignment],
    ) -> Result<Vec<TeachingAssignment>> {
        let txn = self.db.begin().await?;
        lock_class(&txn, class_id).await?;

        let existing: Vec<Uuid> = teaching_assignment::Entity::find()
            .filter(teaching_assignment::Column::ClassId.eq(class_id))
            .all(&txn)
            .await?
            .into_iter()
            .map(|row| row.id)
            .collect();
        clear_links(&txn, &existing).await?;
        teaching_assignment::Entity::delete_many()
            .filter(teaching_assignment::Column::ClassId.eq(class_id))
            .exec(&txn)
            .await?;

        if !roster.is_empty() {
            let models = roster.iter().map(teaching_assignment::ActiveModel::from);
            teaching_assignment::Entity::insert_many(models)
                .exec_without_returning(&txn)
                .await
                .map_err(classify)?;

            let links: Vec<(Uuid, Uuid)> = roster
                .iter()
                .flat_map(|row| row.subject_ids.iter().map(move |s| (row.id, *s)))
                .collect();
            insert_links(&txn, &links).await?;
        }

        txn.commit().await?;
        self.find_by_class(class_id).await
    }

    async fn set_subjects(&self, teaching_ids: &[Uuid], subject_ids: &[Uuid]) -> Result<()> {
        let txn = self.db.begin().await?;

        clear_links(&txn, teaching_ids).await?;
        insert_links(&txn, &cross(teaching_ids, subject_ids)).await?;

        txn.commit().await?;
        Ok(())
    }

    async fn reassign_class_subjects(&self, class_id: Uuid, subject_ids: &[Uuid]) -> Result<()> {
        let txn = self.db.begin().await?;
        lock_class(&txn, class_id).await?;

        let teaching_ids: Vec<Uuid> = teaching_assignment::Entity::find()
            .filter(teaching_assignment::Column::ClassId.eq(class_id))
            .all(&txn)
            .await?
            .into_iter()
            .map(|row| row.id)
            .collect();
        clear_links(&txn, &teaching_ids).await?;
        insert_links(&txn, &cross(&teaching_ids, subject_ids)).await?;

        // Deselected subjects lose their legacy link to this class
        let mut deselect = subject::Entity::update_many()
            .col_expr(subject::Column::DirectClassId, Expr::value(Option::<Uuid>::None))
            .filter(subject::Column::DirectClassId.eq(class_id));
        if !subject_ids.is_empty() {
            deselect = deselect.filter(subject::Column::Id.is_not_in(subject_ids.iter().copied()));
        }
        deselect.exec(&txn).await?;

        if !subject_ids.is_empty() {
            subject::Entity::update_many()
                .col_expr(subject::Column::DirectClassId, Expr::value(Some(class_id)))
                .filter(subject::Column::Id.is_in(subject_ids.iter().copied()))
                .exec(&txn)
                .await?;
        }

        txn.commit().await?;
        Ok(())
    }
}

// ===== Coursework Repository =====

pub struct SeaOrmCourseworkRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmCourseworkRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CourseworkRepository for SeaOrmCourseworkRepository {
    async fn create_assignment(&self, assignment: &Assignment) -> Result<Assignment> {
        let active: assignment::ActiveModel = assignment.into();
        assignment::Entity::insert(active)
            .exec(&*self.db)
            .await
            .map_err(classify)?;
        Ok(assignment.clone())
    }

    async fn find_assignment(&self, id: Uuid) -> Result<Option<Assignment>> {
        assignment::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .map(Assignment::try_from)
            .transpose()
    }

    async fn update_assignment(&self, assignment: &Assignment) -> Result<Assignment> {
        let active: assignment::ActiveModel = assignment.into();
        let updated = assignment::Entity::update(active).exec(&*self.db).await?;
        Assignment::try_from(updated)
    }

    async fn create_submission(
        &self,
        submission: &AssignmentSubmission,
    ) -> Result<AssignmentSubmission> {
        let active: assignment_submission::ActiveModel = submission.into();
        assignment_submission::Entity::insert(active)
            .exec(&*self.db)
            .await
            .map_err(classify)?;
        Ok(submission.clone())
    }

    async fn find_submission_for(
        &self,
        assignment_id: Uuid,
        student_id: Uuid,
    ) -> Result<Option<AssignmentSubmission>> {
        assignment_submission::Entity::find()
            .filter(assignment_submission::Column::AssignmentId.eq(assignment_id))
            .filter(assignment_submission::Column::StudentId.eq(student_id))
            .one(&*self.db)
            .await?
            .map(AssignmentSubmission::try_from)
            .transpose()
    }

    async fn update_submission_grade(
        &self,
        id: Uuid,
        grade: u8,
        feedback: &str,
    ) -> Result<Option<AssignmentSubmission>> {
        let Some(existing) = assignment_submission::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
        else {
            return Ok(None);
        };

        let mut active: assignment_submission::ActiveModel = existing.into();
        active.grade = Set(Some(i16::from(grade)));
        active.feedback = Set(feedback.to_string());
        let updated = active.update(&*self.db).await?;

        AssignmentSubmission::try_from(updated).map(Some)
    }

    async fn create_grade(&self, grade: &Grade) -> Result<Grade> {
        let active = grade::ActiveModel::try_from(grade)?;
        grade::Entity::insert(active)
            .exec(&*self.db)
            .await
            .map_err(classify)?;
        Ok(grade.clone())
    }

    async fn find_grade(&self, id: Uuid) -> Result<Option<Grade>> {
        let result = grade::Entity::find_by_id(id).one(&*self.db).await?;
        Ok(result.map(Into::into))
    }

    async fn find_grade_for(&self, student_id: Uuid, subject_id: Uuid) -> Result<Option<Grade>> {
        let result = grade::Entity::find()
            .filter(grade::Column::StudentId.eq(student_id))
            .filter(grade::Column::SubjectId.eq(subject_id))
            .one(&*self.db)
            .await?;
        Ok(result.map(Into::into))
    }

    async fn find_grades_for_student(&self, student_id: Uuid) -> Result<Vec<Grade>> {
        let results = grade::Entity::find()
            .filter(grade::Column::StudentId.eq(student_id))
            .order_by_asc(grade::Column::RecordedAt)
            .order_by_asc(grade::Column::Id)
            .all(&*self.db)
            .await?;
        Ok(results.into_iter().map(Into::into).collect())
    }

    async fn update_grade(&self, grade: &Grade) -> Result<Grade> {
        let active = grade::ActiveModel::try_from(grade)?;
        let updated = grade::Entity::update(active).exec(&*self.db).await?;
        Ok(updated.into())
    }
}
