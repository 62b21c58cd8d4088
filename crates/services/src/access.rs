use lms_core::model::{Course, Role, User};

/// Owners and admins may edit a course and everything inside it.
pub(crate) fn can_manage(actor: &User, course: &Course) -> bool {
    actor.role() == Role::Admin || course.is_owned_by(actor.id())
}

/// Drafts stay hidden from everyone but their managers.
pub(crate) fn can_view(viewer: Option<&User>, course: &Course) -> bool {
    course.is_published() || viewer.is_some_and(|user| can_manage(user, course))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lms_core::model::{CourseDraft, CourseId, UserId};
    use lms_core::time::fixed_now;

    fn user(id: u64, role: Role) -> User {
        User::from_persisted(
            UserId::new(id),
            "U".into(),
            format!("u{id}@example.com"),
            role,
            0,
            fixed_now(),
        )
    }

    fn course(owner: u64) -> Course {
        let details = CourseDraft {
            title: "Rust".into(),
            ..CourseDraft::default()
        }
        .validate()
        .unwrap();
        Course::new(CourseId::new(1), UserId::new(owner), details, fixed_now())
    }

    #[test]
    fn owner_and_admin_manage() {
        let c = course(1);
        assert!(can_manage(&user(1, Role::Instructor), &c));
        assert!(can_manage(&user(9, Role::Admin), &c));
        assert!(!can_manage(&user(2, Role::Instructor), &c));
    }

    #[test]
    fn drafts_are_hidden_from_learners() {
        let mut c = course(1);
        assert!(!can_view(Some(&user(2, Role::Student)), &c));
        assert!(!can_view(None, &c));
        assert!(can_view(Some(&user(1, Role::Instructor)), &c));
        c.set_published(true, fixed_now());
        assert!(can_view(None, &c));
    }
}
