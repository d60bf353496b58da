//! Database migrations for academics service

use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250801_000001_create_directory::Migration),
            Box::new(m20250801_000002_create_teaching::Migration),
            Box::new(m20250801_000003_create_coursework::Migration),
        ]
    }
}

mod m20250801_000001_create_directory {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250801_000001_create_directory"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Classes::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Classes::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(Classes::Name).string_len(20).not_null().unique_key())
                        .col(
                            ColumnDef::new(Classes::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null()
                                .default(Expr::current_timestamp()),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Teachers::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Teachers::Id).uuid().not_null().primary_key())
                        .col(
                            ColumnDef::new(Teachers::EmployeeCode)
                                .string_len(20)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Teachers::FullName).string_len(150).not_null())
                        .col(
                            ColumnDef::new(Teachers::IsClassTeacher)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Students::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Students::Id).uuid().not_null().primary_key())
                        .col(
                            ColumnDef::new(Students::AdmissionNumber)
                                .string_len(50)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Students::FullName).string_len(150).not_null())
                        .col(ColumnDef::new(Students::CurrentClassId).uuid())
                        .col(ColumnDef::new(Students::GuardianId).uuid())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_students_current_class")
                                .from(Students::Table, Students::CurrentClassId)
                                .to(Classes::Table, Classes::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_students_current_class")
                        .table(Students::Table)
                        .col(Students::CurrentClassId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Subjects::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Subjects::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(Subjects::Name).string_len(100).not_null())
                        .col(ColumnDef::new(Subjects::DirectClassId).uuid())
                        .col(ColumnDef::new(Subjects::DirectTeacherId).uuid())
                        .col(ColumnDef::new(Subjects::Term).string_len(20).not_null())
                        .col(ColumnDef::new(Subjects::AcademicYear).string_len(9).not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_subjects_direct_class")
                                .from(Subjects::Table, Subjects::DirectClassId)
                                .to(Classes::Table, Classes::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_subjects_direct_teacher")
                                .from(Subjects::Table, Subjects::DirectTeacherId)
                                .to(Teachers::Table, Teachers::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_subjects_direct_class")
                        .table(Subjects::Table)
                        .col(Subjects::DirectClassId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Subjects::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Students::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Teachers::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Classes::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Classes {
        Table,
        Id,
        Name,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum Teachers {
        Table,
        Id,
        EmployeeCode,
        FullName,
        IsClassTeacher,
    }

    #[derive(DeriveIden)]
    enum Students {
        Table,
        Id,
        AdmissionNumber,
        FullName,
        CurrentClassId,
        GuardianId,
    }

    #[derive(DeriveIden)]
    enum Subjects {
        Table,
        Id,
        Name,
        DirectClassId,
        DirectTeacherId,
        Term,
        AcademicYear,
    }
}

mod m20250801_000002_create_teaching {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250801_000002_create_teaching"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(TeachingAssignments::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(TeachingAssignments::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(TeachingAssignments::ClassId).uuid().not_null())
                        .col(ColumnDef::new(TeachingAssignments::TeacherId).uuid().not_null())
                        .col(
                            ColumnDef::new(TeachingAssignments::IsPrimary)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(TeachingAssignments::DateAssigned)
                                .timestamp_with_time_zone()
                                .not_null()
                                .default(Expr::current_timestamp()),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_teaching_assignments_class")
                                .from(TeachingAssignments::Table, TeachingAssignments::ClassId)
                                .to(Classes::Table, Classes::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_teaching_assignments_teacher")
                                .from(TeachingAssignments::Table, TeachingAssignments::TeacherId)
                                .to(Teachers::Table, Teachers::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("uq_teaching_assignments_class_teacher")
                        .table(TeachingAssignments::Table)
                        .col(TeachingAssignments::ClassId)
                        .col(TeachingAssignments::TeacherId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_teaching_assignments_teacher")
                        .table(TeachingAssignments::Table)
                        .col(TeachingAssignments::TeacherId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(TeachingAssignmentSubjects::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(TeachingAssignmentSubjects::TeachingAssignmentId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(TeachingAssignmentSubjects::SubjectId)
                                .uuid()
                                .not_null(),
                        )
                        .primary_key(
                            Index::create()
                                .col(TeachingAssignmentSubjects::TeachingAssignmentId)
                                .col(TeachingAssignmentSubjects::SubjectId),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_teaching_assignment_subjects_assignment")
                                .from(
                                    TeachingAssignmentSubjects::Table,
                                    TeachingAssignmentSubjects::TeachingAssignmentId,
                                )
                                .to(TeachingAssignments::Table, TeachingAssignments::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_teaching_assignment_subjects_subject")
                                .from(
                                    TeachingAssignmentSubjects::Table,
                                    TeachingAssignmentSubjects::SubjectId,
                                )
                                .to(Subjects::Table, Subjects::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_teaching_assignment_subjects_subject")
                        .table(TeachingAssignmentSubjects::Table)
                        .col(TeachingAssignmentSubjects::SubjectId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(SubjectAssignments::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SubjectAssignments::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(SubjectAssignments::TeacherId).uuid().not_null())
                        .col(ColumnDef::new(SubjectAssignments::SubjectId).uuid().not_null())
                        .col(
                            ColumnDef::new(SubjectAssignments::AcademicYear)
                                .string_len(9)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SubjectAssignments::AssignedAt)
                                .timestamp_with_time_zone()
                                .not_null()
                                .default(Expr::current_timestamp()),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_subject_assignments_teacher")
                                .from(SubjectAssignments::Table, SubjectAssignments::TeacherId)
                                .to(Teachers::Table, Teachers::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_subject_assignments_subject")
                                .from(SubjectAssignments::Table, SubjectAssignments::SubjectId)
                                .to(Subjects::Table, Subjects::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("uq_subject_assignments_teacher_subject_year")
                        .table(SubjectAssignments::Table)
                        .col(SubjectAssignments::TeacherId)
                        .col(SubjectAssignments::SubjectId)
                        .col(SubjectAssignments::AcademicYear)
                        .unique()
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(SubjectAssignments::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(TeachingAssignmentSubjects::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(TeachingAssignments::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum TeachingAssignments {
        Table,
        Id,
        ClassId,
        TeacherId,
        IsPrimary,
        DateAssigned,
    }

    #[derive(DeriveIden)]
    enum TeachingAssignmentSubjects {
        Table,
        TeachingAssignmentId,
        SubjectId,
    }

    #[derive(DeriveIden)]
    enum SubjectAssignments {
        Table,
        Id,
        TeacherId,
        SubjectId,
        AcademicYear,
        AssignedAt,
    }

    #[derive(DeriveIden)]
    enum Classes {
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum Teachers {
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum Subjects {
        Table,
        Id,
    }
}

mod m20250801_000003_create_coursework {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250801_000003_create_coursework"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Assignments::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Assignments::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(Assignments::Title).string_len(200).not_null())
                        .col(ColumnDef::new(Assignments::Description).text().not_null())
                        .col(ColumnDef::new(Assignments::SubjectId).uuid().not_null())
                        .col(ColumnDef::new(Assignments::ClassId).uuid().not_null())
                        .col(ColumnDef::new(Assignments::TeacherId).uuid().not_null())
                        .col(
                            ColumnDef::new(Assignments::DueAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Assignments::Points).big_integer().not_null())
                        .col(
                            ColumnDef::new(Assignments::IsPublished)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Assignments::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null()
                                .default(Expr::current_timestamp()),
                        )
                        .col(
                            ColumnDef::new(Assignments::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null()
                                .default(Expr::current_timestamp()),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_assignments_subject")
                                .from(Assignments::Table, Assignments::SubjectId)
                                .to(Subjects::Table, Subjects::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_assignments_class")
                                .from(Assignments::Table, Assignments::ClassId)
                                .to(Classes::Table, Classes::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_assignments_teacher")
                                .from(Assignments::Table, Assignments::TeacherId)
                                .to(Teachers::Table, Teachers::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(AssignmentSubmissions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(AssignmentSubmissions::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(AssignmentSubmissions::AssignmentId).uuid().not_null())
                        .col(ColumnDef::new(AssignmentSubmissions::StudentId).uuid().not_null())
                        .col(
                            ColumnDef::new(AssignmentSubmissions::SubmittedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(AssignmentSubmissions::FileRef).string_len(255).not_null())
                        .col(ColumnDef::new(AssignmentSubmissions::Comments).text().not_null())
                        .col(ColumnDef::new(AssignmentSubmissions::Grade).small_integer())
                        .col(ColumnDef::new(AssignmentSubmissions::Feedback).text().not_null())
                        .col(
                            ColumnDef::new(AssignmentSubmissions::IsLate)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_assignment_submissions_assignment")
                                .from(AssignmentSubmissions::Table, AssignmentSubmissions::AssignmentId)
                                .to(Assignments::Table, Assignments::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_assignment_submissions_student")
                                .from(AssignmentSubmissions::Table, AssignmentSubmissions::StudentId)
                                .to(Students::Table, Students::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("uq_assignment_submissions_assignment_student")
                        .table(AssignmentSubmissions::Table)
                        .col(AssignmentSubmissions::AssignmentId)
                        .col(AssignmentSubmissions::StudentId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Grades::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Grades::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(Grades::StudentId).uuid().not_null())
                        .col(ColumnDef::new(Grades::SubjectId).uuid().not_null())
                        .col(ColumnDef::new(Grades::MarksHundredths).integer().not_null())
                        .col(ColumnDef::new(Grades::Remarks).text().not_null())
                        .col(
                            ColumnDef::new(Grades::RecordedAt)
                                .timestamp_with_time_zone()
                                .not_null()
                                .default(Expr::current_timestamp()),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_grades_student")
                                .from(Grades::Table, Grades::StudentId)
                                .to(Students::Table, Students::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_grades_subject")
                                .from(Grades::Table, Grades::SubjectId)
                                .to(Subjects::Table, Subjects::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("uq_grades_student_subject")
                        .table(Grades::Table)
                        .col(Grades::StudentId)
                        .col(Grades::SubjectId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Grades::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(AssignmentSubmissions::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Assignments::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Assignments {
        Table,
        Id,
        Title,
        Description,
        SubjectId,
        ClassId,
        TeacherId,
        DueAt,
        Points,
        IsPublished,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum AssignmentSubmissions {
        Table,
        Id,
        AssignmentId,
        StudentId,
        SubmittedAt,
        FileRef,
        Comments,
        Grade,
        Feedback,
        IsLate,
    }

    #[derive(DeriveIden)]
    enum Grades {
        Table,
        Id,
        StudentId,
        SubjectId,
        MarksHundredths,
        Remarks,
        RecordedAt,
    }

    #[derive(DeriveIden)]
    enum Classes {
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum Teachers {
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum Students {
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum Subjects {
        Table,
        Id,
    }
}
