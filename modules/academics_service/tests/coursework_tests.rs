//! Assignment lifecycle, submissions and the grade book

mod common;

use academics_service::contract::*;
use academics_service::domain::{Clock, ServicePolicy};
use chrono::Duration;
use common::{at, School};
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

/// A class with one bound teacher, one subject and one enrolled student,
/// with the clock on 2025-01-05 (academic year 2024-2025)
struct Setup {
    school: School,
    class: Class,
    teacher: Teacher,
    subject: Subject,
    student: Student,
}

async fn setup() -> Setup {
    let school = School::starting_at(at(2025, 1, 5));
    let class = school.class("10A").await;
    let teacher = school.teacher("T1").await;
    let subject = school.subject("English", "2024-2025").await;
    let student = school.student("S-001", &class).await;
    school.teach(&class, &[&teacher], &[&subject]).await;
    Setup {
        school,
        class,
        teacher,
        subject,
        student,
    }
}

fn essay(s: &Setup, due_day: u32) -> NewAssignment {
    NewAssignment {
        title: "Essay".to_string(),
        description: "Two pages".to_string(),
        subject_id: s.subject.id,
        class_id: s.class.id,
        due_at: at(2025, 1, due_day),
        points: 100,
        publish: true,
    }
}

fn upload(name: &str) -> NewSubmission {
    NewSubmission {
        file_ref: format!("uploads/{}.pdf", name),
        comments: String::new(),
    }
}

fn marks(value: &str) -> Decimal {
    Decimal::from_str(value).unwrap()
}

#[tokio::test]
async fn test_bound_teacher_creates_assignment() {
    let s = setup().await;

    let assignment = s
        .school
        .service
        .create_assignment(s.teacher.id, essay(&s, 10))
        .await
        .unwrap();

    assert!(assignment.is_published());
    assert_eq!(assignment.teacher_id, s.teacher.id);
    assert_eq!(assignment.deadline(s.school.clock.now()), Deadline::Open);
    assert_eq!(s.school.events.kinds().last(), Some(&"assignment_created"));
}

#[tokio::test]
async fn test_unbound_teacher_is_not_authorized() {
    let s = setup().await;
    let outsider = s.school.teacher("T2").await;

    let result = s.school.service.create_assignment(outsider.id, essay(&s, 10)).await;

    assert!(matches!(result, Err(AcademicsError::Authorization { .. })));
}

#[tokio::test]
async fn test_binding_from_another_year_is_not_enough() {
    let s = setup().await;
    s.school.clock.set(at(2025, 9, 1));

    let mut input = essay(&s, 10);
    input.due_at = at(2025, 9, 20);
    let result = s.school.service.create_assignment(s.teacher.id, input).await;

    assert!(matches!(result, Err(AcademicsError::Authorization { .. })));
}

#[tokio::test]
async fn test_assignment_input_validation() {
    let s = setup().await;
    let svc = &s.school.service;

    let mut blank = essay(&s, 10);
    blank.title = "   ".to_string();
    assert!(matches!(
        svc.create_assignment(s.teacher.id, blank).await,
        Err(AcademicsError::Validation { .. })
    ));

    let mut too_many_points = essay(&s, 10);
    too_many_points.points = 1001;
    assert!(matches!(
        svc.create_assignment(s.teacher.id, too_many_points).await,
        Err(AcademicsError::Validation { .. })
    ));

    let past_due = essay(&s, 1);
    assert!(matches!(
        svc.create_assignment(s.teacher.id, past_due).await,
        Err(AcademicsError::Validation { .. })
    ));

    let mut unknown_subject = essay(&s, 10);
    unknown_subject.subject_id = Uuid::new_v4();
    assert!(matches!(
        svc.create_assignment(s.teacher.id, unknown_subject).await,
        Err(AcademicsError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_past_due_dates_allowed_by_policy() {
    let s = setup().await;
    let service = s.school.service.with_policy(ServicePolicy {
        allow_past_due_dates: true,
        ..ServicePolicy::default()
    });

    let mut input = essay_input(s.subject.id, s.class.id);
    input.due_at = at(2025, 1, 1);
    let assignment = service.create_assignment(s.teacher.id, input).await.unwrap();

    assert!(assignment.is_past_due(at(2025, 1, 5)));
}

fn essay_input(subject_id: Uuid, class_id: Uuid) -> NewAssignment {
    NewAssignment {
        title: "Lab notes".to_string(),
        description: String::new(),
        subject_id,
        class_id,
        due_at: at(2025, 1, 10),
        points: 20,
        publish: false,
    }
}

#[tokio::test]
async fn test_draft_publication() {
    let s = setup().await;
    let draft = s
        .school
        .service
        .create_assignment(s.teacher.id, essay_input(s.subject.id, s.class.id))
        .await
        .unwrap();
    assert_eq!(draft.publication, Publication::Draft);

    let published = s.school.service.publish_assignment(draft.id).await.unwrap();
    assert!(published.is_published());

    let again = s.school.service.publish_assignment(draft.id).await.unwrap();
    assert!(again.is_published());
    let published_events = s
        .school
        .events
        .kinds()
        .into_iter()
        .filter(|k| *k == "assignment_published")
        .count();
    assert_eq!(published_events, 1);
}

#[tokio::test]
async fn test_second_submission_is_duplicate() {
    let s = setup().await;
    let assignment = s
        .school
        .service
        .create_assignment(s.teacher.id, essay(&s, 10))
        .await
        .unwrap();

    let first = s
        .school
        .service
        .submit(assignment.id, s.student.id, upload("first"), at(2025, 1, 8))
        .await;
    assert!(first.is_ok());

    let second = s
        .school
        .service
        .submit(assignment.id, s.student.id, upload("second"), at(2025, 1, 9))
        .await;
    match second {
        Err(AcademicsError::Duplicate { resource, .. }) => assert_eq!(resource, "submission"),
        other => panic!("Expected Duplicate error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_lateness_is_frozen_at_submission() {
    let s = setup().await;
    let assignment = s
        .school
        .service
        .create_assignment(s.teacher.id, essay(&s, 10))
        .await
        .unwrap();

    let submission = s
        .school
        .service
        .submit(assignment.id, s.student.id, upload("late"), at(2025, 1, 11))
        .await
        .unwrap();
    assert!(submission.is_late);

    let moved = s
        .school
        .service
        .update_assignment_due(assignment.id, at(2025, 1, 12))
        .await
        .unwrap();
    assert_eq!(moved.due_at, at(2025, 1, 12));

    let stored = s
        .school
        .service
        .grade(submission.id, 70, "late but solid")
        .await
        .unwrap();
    assert!(stored.is_late);
}

#[tokio::test]
async fn test_on_time_submission_is_not_late() {
    let s = setup().await;
    let assignment = s
        .school
        .service
        .create_assignment(s.teacher.id, essay(&s, 10))
        .await
        .unwrap();

    let submission = s
        .school
        .service
        .submit(assignment.id, s.student.id, upload("on-time"), at(2025, 1, 10))
        .await
        .unwrap();

    assert!(!submission.is_late);
    assert_eq!(submission.grade, None);
}

#[tokio::test]
async fn test_student_outside_class_cannot_submit() {
    let s = setup().await;
    let other_class = s.school.class("10B").await;
    let outsider = s.school.student("S-002", &other_class).await;
    let assignment = s
        .school
        .service
        .create_assignment(s.teacher.id, essay(&s, 10))
        .await
        .unwrap();

    let result = s
        .school
        .service
        .submit(assignment.id, outsider.id, upload("x"), at(2025, 1, 6))
        .await;

    assert!(matches!(result, Err(AcademicsError::Authorization { .. })));
}

#[tokio::test]
async fn test_grading_bounds_and_overwrite() {
    let s = setup().await;
    let assignment = s
        .school
        .service
        .create_assignment(s.teacher.id, essay(&s, 10))
        .await
        .unwrap();
    let submission = s
        .school
        .service
        .submit(assignment.id, s.student.id, upload("work"), at(2025, 1, 6))
        .await
        .unwrap();

    assert!(matches!(
        s.school.service.grade(submission.id, 101, "").await,
        Err(AcademicsError::Validation { .. })
    ));
    assert!(matches!(
        s.school.service.grade(Uuid::new_v4(), 50, "").await,
        Err(AcademicsError::NotFound { .. })
    ));

    s.school.service.grade(submission.id, 60, "draft mark").await.unwrap();
    let regraded = s.school.service.grade(submission.id, 85, "final").await.unwrap();

    assert_eq!(regraded.grade, Some(85));
    assert_eq!(regraded.feedback, "final");
}

#[tokio::test]
async fn test_grade_book() {
    let s = setup().await;
    let history = s.school.subject("History", "2024-2025").await;
    let svc = &s.school.service;

    assert_eq!(svc.student_average(s.student.id).await.unwrap(), None);

    svc.record_grade(s.student.id, s.subject.id, marks("90"), "").await.unwrap();
    let history_grade = svc
        .record_grade(s.student.id, history.id, marks("75.5"), "needs dates")
        .await
        .unwrap();

    assert!(matches!(
        svc.record_grade(s.student.id, s.subject.id, marks("10"), "").await,
        Err(AcademicsError::Duplicate { .. })
    ));
    assert!(matches!(
        svc.record_grade(s.student.id, history.id, marks("100.5"), "").await,
        Err(AcademicsError::Validation { .. })
    ));

    assert_eq!(svc.student_average(s.student.id).await.unwrap(), Some(marks("82.75")));

    let updated = svc
        .update_grade(history_grade.id, marks("80.5"), "improved")
        .await
        .unwrap();
    assert_eq!(updated.remarks, "improved");
    assert_eq!(svc.student_average(s.student.id).await.unwrap(), Some(marks("85.25")));
}

#[tokio::test]
async fn test_actor_dispatch() {
    let s = setup().await;
    let svc = &s.school.service;
    let teacher = Actor::from_role("teacher", s.teacher.id).unwrap();
    let student = Actor::from_role("student", s.student.id).unwrap();

    assert!(matches!(
        svc.create_assignment_as(&student, essay(&s, 10)).await,
        Err(AcademicsError::Authorization { .. })
    ));
    let assignment = svc.create_assignment_as(&teacher, essay(&s, 10)).await.unwrap();

    assert!(matches!(
        svc.submit_as(&teacher, assignment.id, upload("x")).await,
        Err(AcademicsError::Authorization { .. })
    ));

    s.school.clock.advance(Duration::days(10));
    let submission = svc.submit_as(&student, assignment.id, upload("x")).await.unwrap();
    assert_eq!(submission.submitted_at, at(2025, 1, 15));
    assert!(submission.is_late);
}

#[tokio::test]
async fn test_grade_visibility_by_role() {
    let s = setup().await;
    let svc = &s.school.service;
    let guardian_id = Uuid::new_v4();
    let ward = svc
        .create_student("S-100", "Ward", Some(s.class.id), Some(guardian_id))
        .await
        .unwrap();
    svc.record_grade(ward.id, s.subject.id, marks("66"), "").await.unwrap();

    let guardian = Actor::Guardian { guardian_id };
    let stranger = Actor::Guardian {
        guardian_id: Uuid::new_v4(),
    };
    let classmate = Actor::Student {
        student_id: s.student.id,
    };
    let admin = Actor::Admin {
        user_id: Uuid::new_v4(),
    };

    assert_eq!(svc.grades_visible_to(&guardian, ward.id).await.unwrap().len(), 1);
    assert_eq!(svc.grades_visible_to(&admin, ward.id).await.unwrap().len(), 1);
    assert!(matches!(
        svc.grades_visible_to(&stranger, ward.id).await,
        Err(AcademicsError::Authorization { .. })
    ));
    assert!(matches!(
        svc.grades_visible_to(&classmate, ward.id).await,
        Err(AcademicsError::Authorization { .. })
    ));
}
