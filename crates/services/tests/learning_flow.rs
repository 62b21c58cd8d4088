use lms_core::model::{
    CourseDraft, EnrollmentError, EnrollmentStatus, LessonDraft, MAX_SECS_PER_UPDATE, QuizDraft,
    QuizQuestion, Role, User,
};
use lms_core::points::Badge;
use lms_core::time::fixed_now;
use services::{
    AppServices, Clock, CourseServiceError, EnrollmentServiceError, QuizServiceError,
    ReviewServiceError,
};
use tempfile::TempDir;

async fn app(name: &str) -> AppServices {
    AppServices::new_sqlite(
        &format!("sqlite:file:{name}?mode=memory&cache=shared"),
        Clock::fixed(fixed_now()),
    )
    .await
    .expect("connect sqlite")
}

/// File-backed so concurrent requests hit real `SQLite` locking.
async fn file_app() -> (TempDir, AppServices) {
    let dir = TempDir::new().expect("failed to create temp dir");
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("lms.sqlite3").display());
    let app = AppServices::new_sqlite(&url, Clock::fixed(fixed_now()))
        .await
        .expect("open file database");
    (dir, app)
}

fn lesson(title: &str) -> LessonDraft {
    LessonDraft {
        title: title.into(),
        content: format!("# {title}"),
        video_url: None,
        duration_minutes: 5,
    }
}

fn quiz(title: &str, max_attempts: Option<u32>) -> QuizDraft {
    QuizDraft {
        title: title.into(),
        lesson_id: None,
        questions: vec![
            QuizQuestion {
                prompt: "Which keyword moves ownership into a closure?".into(),
                options: vec!["ref".into(), "move".into()],
                correct_option: 1,
            },
            QuizQuestion {
                prompt: "Is `String` heap allocated?".into(),
                options: vec!["yes".into(), "no".into()],
                correct_option: 0,
            },
        ],
        passing_percent: 60,
        max_attempts,
    }
}

async fn people(app: &AppServices) -> (User, User, User) {
    let users = app.users();
    let teacher = users
        .register("Grace", "grace@example.com", Role::Instructor)
        .await
        .unwrap();
    let learner = users
        .register("Sam", "sam@example.com", Role::Student)
        .await
        .unwrap();
    let outsider = users
        .register("Olu", "olu@example.com", Role::Student)
        .await
        .unwrap();
    (teacher, learner, outsider)
}

#[tokio::test]
async fn progress_tracks_lessons_and_quizzes_through_completion() {
    let app = app("memdb_learning_flow").await;
    let (teacher, learner, _) = people(&app).await;

    let course = app
        .courses()
        .create_course(
            &teacher,
            CourseDraft {
                title: "Rust Basics".into(),
                ..CourseDraft::default()
            },
        )
        .await
        .unwrap();

    let err = app.enrollments().enroll(&learner, course.id()).await.unwrap_err();
    assert!(matches!(err, EnrollmentServiceError::NotPublished));

    app.courses().set_published(&teacher, course.id(), true).await.unwrap();
    let l1 = app.lessons().add_lesson(&teacher, course.id(), lesson("One")).await.unwrap();
    let l2 = app.lessons().add_lesson(&teacher, course.id(), lesson("Two")).await.unwrap();
    let q = app.quizzes().create_quiz(&teacher, course.id(), quiz("Check", None)).await.unwrap();

    let enrollment = app.enrollments().enroll(&learner, course.id()).await.unwrap();
    assert_eq!(enrollment.progress_percent(), 0);
    let err = app.enrollments().enroll(&learner, course.id()).await.unwrap_err();
    assert!(matches!(err, EnrollmentServiceError::AlreadyEnrolled));

    let done = app.enrollments().complete_lesson(&learner, l1.id(), 120).await.unwrap();
    assert_eq!(done.enrollment.progress_percent(), 33);
    assert_eq!(done.progress.time_spent_secs, 120);

    let first = app
        .quizzes()
        .submit_attempt(&learner, q.id(), vec![Some(1), None])
        .await
        .unwrap();
    assert_eq!(first.attempt.attempt_number, 1);
    assert_eq!(first.attempt.score.percentage, 50);
    assert!(!first.attempt.score.passed);
    assert_eq!(first.total_points, 10);
    assert_eq!(first.enrollment.as_ref().unwrap().progress_percent(), 67);

    let done = app.enrollments().complete_lesson(&learner, l2.id(), 60).await.unwrap();
    assert_eq!(done.enrollment.progress_percent(), 100);
    assert_eq!(done.enrollment.status(), EnrollmentStatus::Completed);
    assert_eq!(done.enrollment.completed_at(), Some(fixed_now()));

    // New material reopens the course.
    let l3 = app.lessons().add_lesson(&teacher, course.id(), lesson("Three")).await.unwrap();
    let progress = app.enrollments().course_progress(learner.id(), course.id()).await.unwrap();
    assert_eq!(progress.enrollment.progress_percent(), 75);
    assert_eq!(progress.enrollment.status(), EnrollmentStatus::Active);
    assert_eq!(progress.enrollment.completed_at(), None);
    assert_eq!(progress.lessons.len(), 2);

    app.enrollments().complete_lesson(&learner, l3.id(), 0).await.unwrap();
    let second = app
        .quizzes()
        .submit_attempt(&learner, q.id(), vec![Some(1), Some(0)])
        .await
        .unwrap();
    assert_eq!(second.attempt.attempt_number, 2);
    assert!(second.attempt.score.passed);
    assert_eq!(second.attempt.points_awarded, 40);
    assert_eq!(second.total_points, 50);
    assert_eq!(second.badge, Badge::Newcomer);
    assert!(second.enrollment.unwrap().is_completed());

    let best = app.quizzes().best_attempt(learner.id(), q.id()).await.unwrap().unwrap();
    assert_eq!(best.attempt_number, 2);

    // Removing a lesson does not undo completion of the rest.
    app.lessons().delete_lesson(&teacher, l3.id()).await.unwrap();
    let progress = app.enrollments().course_progress(learner.id(), course.id()).await.unwrap();
    assert_eq!(progress.enrollment.progress_percent(), 100);
    assert_eq!(progress.counts.total_lessons, 2);
}

#[tokio::test]
async fn attempt_limits_and_enrollment_are_enforced() {
    let app = app("memdb_attempt_limits").await;
    let (teacher, learner, outsider) = people(&app).await;

    let course = app
        .courses()
        .create_course(
            &teacher,
            CourseDraft {
                title: "Limits".into(),
                ..CourseDraft::default()
            },
        )
        .await
        .unwrap();
    app.courses().set_published(&teacher, course.id(), true).await.unwrap();
    let q = app
        .quizzes()
        .create_quiz(&teacher, course.id(), quiz("Once", Some(1)))
        .await
        .unwrap();

    let err = app
        .quizzes()
        .submit_attempt(&outsider, q.id(), vec![Some(1), Some(0)])
        .await
        .unwrap_err();
    assert!(matches!(err, QuizServiceError::NotEnrolled));

    app.enrollments().enroll(&learner, course.id()).await.unwrap();
    let err = app
        .quizzes()
        .submit_attempt(&learner, q.id(), vec![Some(1)])
        .await
        .unwrap_err();
    assert!(matches!(err, QuizServiceError::Submission(_)));

    let outcome = app
        .quizzes()
        .submit_attempt(&learner, q.id(), vec![Some(1), Some(0)])
        .await
        .unwrap();
    assert!(outcome.enrollment.unwrap().is_completed());

    let err = app
        .quizzes()
        .submit_attempt(&learner, q.id(), vec![Some(1), Some(0)])
        .await
        .unwrap_err();
    assert!(matches!(err, QuizServiceError::AttemptsExhausted { limit: 1 }));
    assert_eq!(app.quizzes().list_attempts(learner.id(), q.id()).await.unwrap().len(), 1);

    let view = app.quizzes().get_quiz(&learner, q.id()).await.unwrap();
    assert!(!view.reveal_answers);
    let view = app.quizzes().get_quiz(&teacher, q.id()).await.unwrap();
    assert!(view.reveal_answers);
}

#[tokio::test]
async fn authoring_requires_ownership() {
    let app = app("memdb_authoring").await;
    let (teacher, learner, _) = people(&app).await;

    let err = app
        .courses()
        .create_course(
            &learner,
            CourseDraft {
                title: "Mine".into(),
                ..CourseDraft::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CourseServiceError::NotAnInstructor));

    let rival = app
        .users()
        .register("Rival", "rival@example.com", Role::Instructor)
        .await
        .unwrap();
    let course = app
        .courses()
        .create_course(
            &teacher,
            CourseDraft {
                title: "Owned".into(),
                ..CourseDraft::default()
            },
        )
        .await
        .unwrap();

    let err = app
        .lessons()
        .add_lesson(&rival, course.id(), lesson("Sneaky"))
        .await
        .unwrap_err();
    assert!(matches!(err, CourseServiceError::Forbidden));

    // Drafts look missing to everyone but their managers.
    let err = app.courses().get_course(Some(&learner), course.id()).await.unwrap_err();
    assert!(matches!(err, CourseServiceError::NotFound));
    assert!(app.courses().list_catalog(10, 0).await.unwrap().is_empty());

    let a = app.lessons().add_lesson(&teacher, course.id(), lesson("A")).await.unwrap();
    let b = app.lessons().add_lesson(&teacher, course.id(), lesson("B")).await.unwrap();
    let err = app
        .lessons()
        .reorder_lessons(&teacher, course.id(), &[b.id()])
        .await
        .unwrap_err();
    assert!(matches!(err, CourseServiceError::Lesson(_)));
    let ordered = app
        .lessons()
        .reorder_lessons(&teacher, course.id(), &[b.id(), a.id()])
        .await
        .unwrap();
    assert_eq!(ordered[0].id(), b.id());
    assert_eq!(ordered[0].position(), 1);

    app.courses().delete_course(&teacher, course.id()).await.unwrap();
    let err = app.courses().course_outline(Some(&teacher), course.id()).await.unwrap_err();
    assert!(matches!(err, CourseServiceError::NotFound));
}

#[tokio::test]
async fn reviews_and_dashboards() {
    let app = app("memdb_reviews_dashboards").await;
    let (teacher, learner, outsider) = people(&app).await;

    let course = app
        .courses()
        .create_course(
            &teacher,
            CourseDraft {
                title: "Reviewed".into(),
                ..CourseDraft::default()
            },
        )
        .await
        .unwrap();
    app.courses().set_published(&teacher, course.id(), true).await.unwrap();
    let only = app.lessons().add_lesson(&teacher, course.id(), lesson("Only")).await.unwrap();
    app.enrollments().enroll(&learner, course.id()).await.unwrap();

    let err = app
        .reviews()
        .submit_review(&outsider, course.id(), 5, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ReviewServiceError::NotEnrolled));

    let err = app
        .reviews()
        .submit_review(&learner, course.id(), 6, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ReviewServiceError::Review(_)));

    app.reviews().submit_review(&learner, course.id(), 3, None).await.unwrap();
    let updated = app
        .reviews()
        .submit_review(&learner, course.id(), 5, Some("  Loved it ".into()))
        .await
        .unwrap();
    assert_eq!(updated.comment.as_deref(), Some("Loved it"));

    let summary = app.reviews().rating_summary(course.id()).await.unwrap();
    assert_eq!(summary.count, 1);
    assert!((summary.average - 5.0).abs() < f64::EPSILON);

    let learner_view = app.dashboards().learner(learner.id()).await.unwrap();
    assert_eq!(learner_view.enrollments.len(), 1);
    assert_eq!(learner_view.enrollments[0].course_title, "Reviewed");
    assert_eq!(learner_view.next_badge.unwrap().badge, Badge::Bronze);

    let instructor_view = app.dashboards().instructor(&teacher).await.unwrap();
    assert_eq!(instructor_view.total_students, 1);
    let stats = &instructor_view.courses[0];
    assert_eq!(stats.enrolled, 1);
    assert_eq!(stats.completed, 0);
    assert_eq!(stats.lessons, 1);
    assert_eq!(stats.rating.count, 1);

    assert!(app.dashboards().instructor(&learner).await.is_err());

    // Leaving keeps progress, so coming back restores it.
    app.enrollments().complete_lesson(&learner, only.id(), 30).await.unwrap();
    app.enrollments().unenroll(&learner, course.id()).await.unwrap();
    let err = app.enrollments().unenroll(&learner, course.id()).await.unwrap_err();
    assert!(matches!(err, EnrollmentServiceError::NotEnrolled));

    let back = app.enrollments().enroll(&learner, course.id()).await.unwrap();
    assert_eq!(back.progress_percent(), 100);
    assert!(back.is_completed());
}

#[tokio::test]
async fn concurrent_learner_requests_are_not_lost() {
    let (_dir, app) = file_app().await;
    let (teacher, learner, _) = people(&app).await;
    let course = app
        .courses()
        .create_course(
            &teacher,
            CourseDraft {
                title: "Busy Course".into(),
                ..CourseDraft::default()
            },
        )
        .await
        .unwrap();
    app.courses().set_published(&teacher, course.id(), true).await.unwrap();
    let l = app.lessons().add_lesson(&teacher, course.id(), lesson("One")).await.unwrap();
    let q = app.quizzes().create_quiz(&teacher, course.id(), quiz("Check", None)).await.unwrap();
    app.enrollments().enroll(&learner, course.id()).await.unwrap();

    let submissions: Vec<_> = (0..8)
        .map(|_| {
            let quizzes = app.quizzes();
            let learner = learner.clone();
            let quiz_id = q.id();
            tokio::spawn(async move {
                quizzes
                    .submit_attempt(&learner, quiz_id, vec![Some(1), Some(0)])
                    .await
            })
        })
        .collect();
    let mut numbers = Vec::new();
    let mut awarded = 0;
    for handle in submissions {
        let outcome = handle.await.unwrap().unwrap();
        numbers.push(outcome.attempt.attempt_number);
        awarded += outcome.attempt.points_awarded;
    }
    numbers.sort_unstable();
    assert_eq!(numbers, (1..=8).collect::<Vec<u32>>());
    let user = app.users().get_user(learner.id()).await.unwrap();
    assert_eq!(user.points(), awarded);

    let timers: Vec<_> = (0..8)
        .map(|_| {
            let enrollments = app.enrollments();
            let learner = learner.clone();
            let lesson_id = l.id();
            tokio::spawn(async move { enrollments.record_time(&learner, lesson_id, 10).await })
        })
        .collect();
    for handle in timers {
        handle.await.unwrap().unwrap();
    }
    let progress = app.enrollments().course_progress(learner.id(), course.id()).await.unwrap();
    assert_eq!(progress.lessons[0].time_spent_secs, 80);
    assert!(!progress.lessons[0].completed);

    let err = app
        .enrollments()
        .record_time(&learner, l.id(), MAX_SECS_PER_UPDATE + 1)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EnrollmentServiceError::Enrollment(EnrollmentError::TimeOutOfRange(_))
    ));
    let err = app.enrollments().complete_lesson(&learner, l.id(), u64::MAX).await.unwrap_err();
    assert!(matches!(err, EnrollmentServiceError::Enrollment(_)));

    let done = app.enrollments().complete_lesson(&learner, l.id(), 5).await.unwrap();
    assert_eq!(done.progress.time_spent_secs, 85);
    assert!(done.enrollment.is_completed());
}
