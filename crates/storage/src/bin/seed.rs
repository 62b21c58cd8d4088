use std::fmt;

use chrono::{DateTime, Utc};
use lms_core::model::{
    Course, CourseDetails, CourseDraft, CourseId, CourseLevel, DEFAULT_PASSING_PERCENT,
    Enrollment, LessonDraft, LessonId, NewUser, Quiz, QuizDraft, QuizId, QuizQuestion, Role,
    UserId,
};
use storage::repository::{Storage, StorageError};

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    courses: u32,
    lessons: u32,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidCourses { raw: String },
    InvalidLessons { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidCourses { raw } => write!(f, "invalid --courses value: {raw}"),
            ArgsError::InvalidLessons { raw } => write!(f, "invalid --lessons value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("LMS_DB_URL")
            .unwrap_or_else(|_| "sqlite://lms.sqlite3?mode=rwc".into());
        let mut courses = std::env::var("LMS_SEED_COURSES")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(2);
        let mut lessons = std::env::var("LMS_SEED_LESSONS")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(3);
        let mut now: Option<DateTime<Utc>> = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--courses" => {
                    let value = require_value(&mut args, "--courses")?;
                    courses = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidCourses { raw: value.clone() })?;
                }
                "--lessons" => {
                    let value = require_value(&mut args, "--lessons")?;
                    lessons = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidLessons { raw: value.clone() })?;
                }
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value.clone() })?
                        .with_timezone(&Utc);
                    now = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            courses,
            lessons,
            now,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite://lms.sqlite3?mode=rwc)");
    eprintln!("  --courses <n>             Number of published courses to create (default: 2)");
    eprintln!("  --lessons <n>             Lessons per course (default: 3)");
    eprintln!("  --now <rfc3339>           Fixed current time for deterministic seeding");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  LMS_DB_URL, LMS_SEED_COURSES, LMS_SEED_LESSONS");
}

async fn ensure_user(
    storage: &Storage,
    name: &str,
    email: &str,
    role: Role,
    now: DateTime<Utc>,
) -> Result<UserId, Box<dyn std::error::Error>> {
    if let Some(user) = storage.users.find_by_email(email).await? {
        return Ok(user.id());
    }
    let user = NewUser::new(name, email, role, now)?;
    Ok(storage.users.insert_user(&user).await?)
}

const TOPICS: [(&str, &str); 4] = [
    ("Ownership in Practice", "programming"),
    ("Async Services", "programming"),
    ("Relational Modeling", "databases"),
    ("Writing Clear Docs", "writing"),
];

fn sample_course(title: &str, category: &str, index: u32) -> Result<CourseDetails, lms_core::Error> {
    Ok(CourseDraft {
        title: format!("{title} #{}", index + 1),
        description: Some(format!("Sample course about {}.", title.to_lowercase())),
        category: Some(category.to_owned()),
        level: CourseLevel::Beginner,
        thumbnail_url: None,
    }
    .validate()?)
}

/// Two-question check-in attached to the last lesson.
fn sample_quiz(
    title: &str,
    course_id: CourseId,
    lesson_ids: &[LessonId],
    now: DateTime<Utc>,
) -> Result<Quiz, lms_core::Error> {
    Ok(QuizDraft {
        title: format!("{title} check-in"),
        lesson_id: lesson_ids.last().copied(),
        questions: vec![
            QuizQuestion {
                prompt: "Did you finish every lesson?".into(),
                options: vec!["Yes".into(), "No".into()],
                correct_option: 0,
            },
            QuizQuestion {
                prompt: "Which item closes out a course?".into(),
                options: vec!["The first lesson".into(), "This quiz".into()],
                correct_option: 1,
            },
        ],
        passing_percent: DEFAULT_PASSING_PERCENT,
        max_attempts: None,
    }
    .validate(QuizId::new(0), course_id, lesson_ids, now)?)
}

async fn seed_course(
    storage: &Storage,
    instructor: UserId,
    index: u32,
    lessons: u32,
    now: DateTime<Utc>,
) -> Result<CourseId, Box<dyn std::error::Error>> {
    let (title, category) = TOPICS[(index as usize) % TOPICS.len()];
    let details = sample_course(title, category, index)?;

    let mut course = Course::new(CourseId::new(0), instructor, details, now);
    course.set_published(true, now);
    let course_id = storage.courses.insert_course(&course).await?;

    let mut lesson_ids = Vec::new();
    for n in 1..=lessons {
        let details = LessonDraft {
            title: format!("Lesson {n}"),
            content: format!("# Lesson {n}\n\nRead, then try the exercise."),
            video_url: None,
            duration_minutes: 10,
        }
        .validate()?;
        let lesson = storage.lessons.insert_lesson(course_id, &details, now).await?;
        lesson_ids.push(lesson.id());
    }

    let quiz = sample_quiz(title, course_id, &lesson_ids, now)?;
    storage.quizzes.insert_quiz(&quiz).await?;

    Ok(course_id)
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let now = args.now.unwrap_or_else(Utc::now);

    let instructor = ensure_user(
        &storage,
        "Grace Instructor",
        "instructor@example.com",
        Role::Instructor,
        now,
    )
    .await?;
    let student = ensure_user(
        &storage,
        "Sam Student",
        "student@example.com",
        Role::Student,
        now,
    )
    .await?;

    for index in 0..args.courses {
        let course_id = seed_course(&storage, instructor, index, args.lessons, now).await?;
        match storage
            .enrollments
            .insert_enrollment(&Enrollment::new(student, course_id, now))
            .await
        {
            Ok(()) | Err(StorageError::Conflict) => {}
            Err(e) => return Err(e.into()),
        }
    }

    println!(
        "Seeded {} courses with {} lessons each into {} (instructor {}, student {})",
        args.courses,
        args.lessons,
        args.db_url,
        instructor.value(),
        student.value()
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
