use chrono::Duration;
use lms_core::model::{
    Course, CourseDraft, CourseId, Enrollment, EnrollmentStatus, LessonDraft, LessonId, NewUser,
    ProgressUpdate, QuizDraft, QuizId, QuizQuestion, Rating, Role, UserId,
};
use lms_core::points::Badge;
use lms_core::scoring::QuizScore;
use lms_core::time::fixed_now;
use storage::repository::{NewAttemptRecord, Storage, StorageError};
use storage::sqlite::SqliteRepository;
use tempfile::TempDir;

async fn storage(name: &str) -> Storage {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    Storage::from_repository(repo)
}

/// WAL and lock contention only show up with a real file and several pool connections.
async fn file_storage() -> (TempDir, Storage) {
    let dir = TempDir::new().expect("failed to create temp dir");
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("lms.sqlite3").display());
    let storage = Storage::sqlite(&url).await.expect("open file database");
    (dir, storage)
}

async fn user(storage: &Storage, email: &str, role: Role) -> UserId {
    let new = NewUser::new("Test User", email, role, fixed_now()).unwrap();
    storage.users.insert_user(&new).await.unwrap()
}

async fn course(storage: &Storage, instructor: UserId, title: &str, published: bool) -> CourseId {
    let details = CourseDraft {
        title: title.into(),
        ..CourseDraft::default()
    }
    .validate()
    .unwrap();
    let mut course = Course::new(CourseId::new(0), instructor, details, fixed_now());
    course.set_published(published, fixed_now());
    storage.courses.insert_course(&course).await.unwrap()
}

async fn lesson(storage: &Storage, course: CourseId, title: &str) -> LessonId {
    let details = LessonDraft {
        title: title.into(),
        ..LessonDraft::default()
    }
    .validate()
    .unwrap();
    storage
        .lessons
        .insert_lesson(course, &details, fixed_now())
        .await
        .unwrap()
        .id()
}

async fn quiz(storage: &Storage, course: CourseId, max_attempts: Option<u32>) -> QuizId {
    let quiz = QuizDraft {
        title: "Check".into(),
        lesson_id: None,
        questions: vec![QuizQuestion {
            prompt: "2 + 2".into(),
            options: vec!["3".into(), "4".into()],
            correct_option: 1,
        }],
        passing_percent: 60,
        max_attempts,
    }
    .validate(QuizId::new(0), course, &[], fixed_now())
    .unwrap();
    storage.quizzes.insert_quiz(&quiz).await.unwrap()
}

fn attempt(user: UserId, quiz: QuizId, correct: u32, points: u32) -> NewAttemptRecord {
    NewAttemptRecord {
        user_id: user,
        quiz_id: quiz,
        score: QuizScore::new(correct, 1, 60),
        answers: vec![Some(usize::try_from(correct).unwrap())],
        points_awarded: points,
        max_attempts: None,
        submitted_at: fixed_now(),
    }
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let storage = storage("memdb_dup_email").await;
    user(&storage, "ada@example.com", Role::Student).await;

    let again = NewUser::new("Ada", "ADA@example.com", Role::Student, fixed_now()).unwrap();
    let err = storage.users.insert_user(&again).await.unwrap_err();
    assert!(matches!(err, StorageError::Conflict));

    let found = storage
        .users
        .find_by_email(" Ada@Example.com ")
        .await
        .unwrap()
        .expect("user by email");
    assert_eq!(found.points(), 0);
}

#[tokio::test]
async fn catalog_lists_published_newest_first() {
    let storage = storage("memdb_catalog").await;
    let teacher = user(&storage, "t@example.com", Role::Instructor).await;
    let older = course(&storage, teacher, "Older", true).await;
    course(&storage, teacher, "Draft", false).await;

    let details = CourseDraft {
        title: "Newer".into(),
        ..CourseDraft::default()
    }
    .validate()
    .unwrap();
    let mut newer = Course::new(
        CourseId::new(0),
        teacher,
        details,
        fixed_now() + Duration::hours(1),
    );
    newer.set_published(true, fixed_now() + Duration::hours(1));
    let newer = storage.courses.insert_course(&newer).await.unwrap();

    let page = storage.courses.list_published(10, 0).await.unwrap();
    let ids: Vec<_> = page.iter().map(Course::id).collect();
    assert_eq!(ids, vec![newer, older]);

    let second_page = storage.courses.list_published(1, 1).await.unwrap();
    assert_eq!(second_page[0].id(), older);

    let mine = storage.courses.list_by_instructor(teacher).await.unwrap();
    assert_eq!(mine.len(), 3);
}

#[tokio::test]
async fn lessons_append_and_reorder() {
    let storage = storage("memdb_lessons").await;
    let teacher = user(&storage, "t@example.com", Role::Instructor).await;
    let c = course(&storage, teacher, "Rust", false).await;
    let a = lesson(&storage, c, "A").await;
    let b = lesson(&storage, c, "B").await;
    let d = lesson(&storage, c, "C").await;

    let listed = storage.lessons.list_lessons(c).await.unwrap();
    let positions: Vec<_> = listed.iter().map(|l| l.position()).collect();
    assert_eq!(positions, vec![1, 2, 3]);

    storage.lessons.reorder_lessons(c, &[d, a, b]).await.unwrap();
    let listed = storage.lessons.list_lessons(c).await.unwrap();
    let ids: Vec<_> = listed.iter().map(|l| l.id()).collect();
    assert_eq!(ids, vec![d, a, b]);

    let other = course(&storage, teacher, "Other", false).await;
    let foreign = lesson(&storage, other, "X").await;
    let err = storage
        .lessons
        .reorder_lessons(c, &[foreign, a, b])
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
    let ids: Vec<_> = storage
        .lessons
        .list_lessons(c)
        .await
        .unwrap()
        .iter()
        .map(|l| l.id())
        .collect();
    assert_eq!(ids, vec![d, a, b], "failed reorder must roll back");
}

#[tokio::test]
async fn progress_counts_lessons_and_distinct_quizzes() {
    let storage = storage("memdb_counts").await;
    let teacher = user(&storage, "t@example.com", Role::Instructor).await;
    let student = user(&storage, "s@example.com", Role::Student).await;
    let c = course(&storage, teacher, "Rust", true).await;
    let l1 = lesson(&storage, c, "One").await;
    lesson(&storage, c, "Two").await;
    let q = quiz(&storage, c, None).await;
    quiz(&storage, c, None).await;

    let done = ProgressUpdate::new(student, l1, 0, true, fixed_now()).unwrap();
    storage.progress.record_progress(&done).await.unwrap();

    storage.attempts.record_attempt(attempt(student, q, 0, 0)).await.unwrap();
    storage.attempts.record_attempt(attempt(student, q, 1, 30)).await.unwrap();

    let counts = storage.progress.progress_counts(student, c).await.unwrap();
    assert_eq!(counts.total_lessons, 2);
    assert_eq!(counts.completed_lessons, 1);
    assert_eq!(counts.total_quizzes, 2);
    assert_eq!(counts.attempted_quizzes, 1);
    assert_eq!(counts.percent(), 50);
}

#[tokio::test]
async fn attempts_are_numbered_and_update_points() {
    let storage = storage("memdb_attempts").await;
    let teacher = user(&storage, "t@example.com", Role::Instructor).await;
    let student = user(&storage, "s@example.com", Role::Student).await;
    let c = course(&storage, teacher, "Rust", true).await;
    let q = quiz(&storage, c, Some(2)).await;

    let first = storage
        .attempts
        .record_attempt(attempt(student, q, 1, 90))
        .await
        .unwrap();
    assert_eq!(first.attempt.attempt_number, 1);
    assert_eq!(first.total_points, 90);
    assert_eq!(first.badge_after, Badge::Newcomer);

    let mut second = attempt(student, q, 1, 30);
    second.max_attempts = Some(2);
    let second = storage.attempts.record_attempt(second).await.unwrap();
    assert_eq!(second.attempt.attempt_number, 2);
    assert_eq!(second.badge_before, Badge::Newcomer);
    assert_eq!(second.badge_after, Badge::Bronze);

    let mut third = attempt(student, q, 1, 30);
    third.max_attempts = Some(2);
    let err = storage.attempts.record_attempt(third).await.unwrap_err();
    assert!(matches!(err, StorageError::Conflict));

    assert_eq!(storage.attempts.count_attempts(student, q).await.unwrap(), 2);
    let user = storage.users.get_user(student).await.unwrap().unwrap();
    assert_eq!(user.points(), 120);
    assert_eq!(user.badge(), second.badge_after);
    let history = storage.users.point_history(student, 10).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history.iter().map(|e| e.amount).sum::<u32>(), 120);

    let listed = storage.attempts.list_attempts(student, q).await.unwrap();
    assert_eq!(listed[0].answers, vec![Some(1)]);
    assert!(listed[1].score.passed);
}

#[tokio::test]
async fn leaderboard_orders_by_points_then_id() {
    let storage = storage("memdb_leaderboard").await;
    let teacher = user(&storage, "t@example.com", Role::Instructor).await;
    let a = user(&storage, "a@example.com", Role::Student).await;
    let b = user(&storage, "b@example.com", Role::Student).await;
    let c = course(&storage, teacher, "Rust", true).await;
    let q = quiz(&storage, c, None).await;
    storage.attempts.record_attempt(attempt(b, q, 1, 30)).await.unwrap();

    let board = storage.users.leaderboard(3).await.unwrap();
    let ids: Vec<_> = board.iter().map(|u| u.id()).collect();
    assert_eq!(ids, vec![b, teacher, a]);
}

#[tokio::test]
async fn review_upsert_keeps_one_row() {
    let storage = storage("memdb_reviews").await;
    let teacher = user(&storage, "t@example.com", Role::Instructor).await;
    let student = user(&storage, "s@example.com", Role::Student).await;
    let c = course(&storage, teacher, "Rust", true).await;

    let first = storage
        .reviews
        .upsert_review(student, c, Rating::new(3).unwrap(), None, fixed_now())
        .await
        .unwrap();
    let later = fixed_now() + Duration::days(1);
    let second = storage
        .reviews
        .upsert_review(student, c, Rating::new(5).unwrap(), Some("Great".into()), later)
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.created_at, fixed_now());
    assert_eq!(second.updated_at, later);
    assert_eq!(storage.reviews.ratings(c).await.unwrap(), vec![Rating::new(5).unwrap()]);

    storage.reviews.delete_review(student, c).await.unwrap();
    let err = storage.reviews.delete_review(student, c).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}

#[tokio::test]
async fn deleting_a_course_cascades() {
    let storage = storage("memdb_cascade").await;
    let teacher = user(&storage, "t@example.com", Role::Instructor).await;
    let student = user(&storage, "s@example.com", Role::Student).await;
    let c = course(&storage, teacher, "Rust", true).await;
    let l = lesson(&storage, c, "One").await;
    let q = quiz(&storage, c, None).await;

    storage
        .enrollments
        .insert_enrollment(&Enrollment::new(student, c, fixed_now()))
        .await
        .unwrap();
    let err = storage
        .enrollments
        .insert_enrollment(&Enrollment::new(student, c, fixed_now()))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Conflict));

    storage.attempts.record_attempt(attempt(student, q, 1, 30)).await.unwrap();
    storage.courses.delete_course(c).await.unwrap();

    assert!(storage.courses.get_course(c).await.unwrap().is_none());
    assert!(storage.lessons.get_lesson(l).await.unwrap().is_none());
    assert!(storage.quizzes.get_quiz(q).await.unwrap().is_none());
    assert!(storage.enrollments.list_for_user(student).await.unwrap().is_empty());
    assert!(storage.attempts.recent_attempts(student, 5).await.unwrap().is_empty());

    // Points already earned stay on the account.
    let user = storage.users.get_user(student).await.unwrap().unwrap();
    assert_eq!(user.points(), 30);
}

#[tokio::test]
async fn enrollment_status_round_trips() {
    let storage = storage("memdb_enrollment").await;
    let teacher = user(&storage, "t@example.com", Role::Instructor).await;
    let student = user(&storage, "s@example.com", Role::Student).await;
    let c = course(&storage, teacher, "Rust", true).await;

    let mut enrollment = Enrollment::new(student, c, fixed_now());
    storage.enrollments.insert_enrollment(&enrollment).await.unwrap();
    enrollment.apply_progress(100, fixed_now()).unwrap();
    storage.enrollments.update_enrollment(&enrollment).await.unwrap();

    let stored = storage
        .enrollments
        .get_enrollment(student, c)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status(), EnrollmentStatus::Completed);
    assert_eq!(stored.completed_at(), Some(fixed_now()));
    assert_eq!(storage.enrollments.list_for_course(c).await.unwrap().len(), 1);
}

#[tokio::test]
async fn progress_accumulates_time_and_keeps_completion() {
    let storage = storage("memdb_progress_updates").await;
    let teacher = user(&storage, "t@example.com", Role::Instructor).await;
    let student = user(&storage, "s@example.com", Role::Student).await;
    let c = course(&storage, teacher, "Rust", true).await;
    let l = lesson(&storage, c, "One").await;
    let t1 = fixed_now();
    let t2 = t1 + Duration::minutes(5);

    let first = ProgressUpdate::new(student, l, 30, false, t1).unwrap();
    let row = storage.progress.record_progress(&first).await.unwrap();
    assert!(!row.completed);
    assert_eq!(row.time_spent_secs, 30);

    let done = ProgressUpdate::new(student, l, 15, true, t1).unwrap();
    let row = storage.progress.record_progress(&done).await.unwrap();
    assert!(row.completed);
    assert_eq!(row.completed_at, Some(t1));

    let later = ProgressUpdate::new(student, l, 45, false, t2).unwrap();
    let row = storage.progress.record_progress(&later).await.unwrap();
    assert!(row.completed);
    assert_eq!(row.time_spent_secs, 90);
    assert_eq!(row.completed_at, Some(t1));
    assert_eq!(row.updated_at, t2);

    let again = ProgressUpdate::new(student, l, 0, true, t2).unwrap();
    let row = storage.progress.record_progress(&again).await.unwrap();
    assert_eq!(row.completed_at, Some(t1));

    let missing = ProgressUpdate::new(student, LessonId::new(999), 5, false, t1).unwrap();
    let err = storage.progress.record_progress(&missing).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}

#[tokio::test]
async fn concurrent_attempts_are_all_recorded() {
    let (_dir, storage) = file_storage().await;
    let teacher = user(&storage, "t@example.com", Role::Instructor).await;
    let student = user(&storage, "s@example.com", Role::Student).await;
    let c = course(&storage, teacher, "Rust", true).await;
    let q = quiz(&storage, c, None).await;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let attempts = storage.attempts.clone();
            tokio::spawn(async move { attempts.record_attempt(attempt(student, q, 1, 10)).await })
        })
        .collect();
    let mut numbers = Vec::new();
    for handle in handles {
        numbers.push(handle.await.unwrap().unwrap().attempt.attempt_number);
    }
    numbers.sort_unstable();
    assert_eq!(numbers, (1..=8).collect::<Vec<u32>>());

    let user = storage.users.get_user(student).await.unwrap().unwrap();
    assert_eq!(user.points(), 80);
    assert_eq!(storage.users.point_history(student, 20).await.unwrap().len(), 8);
}

#[tokio::test]
async fn concurrent_lessons_get_distinct_positions() {
    let (_dir, storage) = file_storage().await;
    let teacher = user(&storage, "t@example.com", Role::Instructor).await;
    let c = course(&storage, teacher, "Rust", true).await;
    let details = LessonDraft {
        title: "Parallel".into(),
        ..LessonDraft::default()
    }
    .validate()
    .unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let lessons = storage.lessons.clone();
            let details = details.clone();
            tokio::spawn(async move { lessons.insert_lesson(c, &details, fixed_now()).await })
        })
        .collect();
    let mut positions = Vec::new();
    for handle in handles {
        positions.push(handle.await.unwrap().unwrap().position());
    }
    positions.sort_unstable();
    assert_eq!(positions, (1..=8).collect::<Vec<u32>>());
}

#[tokio::test]
async fn concurrent_time_updates_all_count() {
    let (_dir, storage) = file_storage().await;
    let teacher = user(&storage, "t@example.com", Role::Instructor).await;
    let student = user(&storage, "s@example.com", Role::Student).await;
    let c = course(&storage, teacher, "Rust", true).await;
    let l = lesson(&storage, c, "One").await;

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let progress = storage.progress.clone();
            let update = ProgressUpdate::new(student, l, 10, i == 3, fixed_now()).unwrap();
            tokio::spawn(async move { progress.record_progress(&update).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let rows = storage.progress.list_progress(student, c).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].time_spent_secs, 80);
    assert!(rows[0].completed);
}
