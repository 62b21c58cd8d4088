use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::UserId;
use crate::points::Badge;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum UserError {
    #[error("user name cannot be empty")]
    EmptyName,

    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    #[error("unknown role: {0}")]
    UnknownRole(String),
}

//
// ─── ROLE ──────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Student,
    Instructor,
    Admin,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Instructor => "instructor",
            Role::Admin => "admin",
        }
    }

    /// Parses the storage representation produced by [`Role::as_str`].
    ///
    /// # Errors
    ///
    /// Returns `UserError::UnknownRole` for any other value.
    pub fn parse(value: &str) -> Result<Self, UserError> {
        match value {
            "student" => Ok(Role::Student),
            "instructor" => Ok(Role::Instructor),
            "admin" => Ok(Role::Admin),
            other => Err(UserError::UnknownRole(other.to_owned())),
        }
    }

    /// Instructors and admins may author courses.
    #[must_use]
    pub fn can_author(self) -> bool {
        matches!(self, Role::Instructor | Role::Admin)
    }
}

//
// ─── REGISTRATION ─────────────────────────────────────────────────────────────
//

/// Validated registration input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl NewUser {
    /// Trims the name and normalizes the email to lower case.
    ///
    /// # Errors
    ///
    /// Returns `UserError::EmptyName` or `UserError::InvalidEmail`.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        role: Role,
        created_at: DateTime<Utc>,
    ) -> Result<Self, UserError> {
        let name = name.into();
        let name = name.trim();
        if name.is_empty() {
            return Err(UserError::EmptyName);
        }
        let email = normalize_email(&email.into())?;
        Ok(Self {
            name: name.to_owned(),
            email,
            role,
            created_at,
        })
    }
}

fn normalize_email(raw: &str) -> Result<String, UserError> {
    let email = raw.trim().to_lowercase();
    let mut parts = email.split('@');
    let valid = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty() && !domain.is_empty() && !email.contains(char::is_whitespace)
        }
        _ => false,
    };
    if valid {
        Ok(email)
    } else {
        Err(UserError::InvalidEmail(raw.trim().to_owned()))
    }
}

//
// ─── USER ──────────────────────────────────────────────────────────────────────
//

/// A registered account with its accumulated points and current badge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    name: String,
    email: String,
    role: Role,
    points: u32,
    created_at: DateTime<Utc>,
}

impl User {
    #[must_use]
    pub fn from_persisted(
        id: UserId,
        name: String,
        email: String,
        role: Role,
        points: u32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            email,
            role,
            points,
            created_at,
        }
    }

    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn points(&self) -> u32 {
        self.points
    }

    /// Badge derived from the current point total.
    #[must_use]
    pub fn badge(&self) -> Badge {
        Badge::for_points(self.points)
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn new_user_normalizes_email_and_name() {
        let user = NewUser::new("  Ada  ", " Ada@Example.COM ", Role::Student, fixed_now()).unwrap();
        assert_eq!(user.name, "Ada");
        assert_eq!(user.email, "ada@example.com");
    }

    #[test]
    fn new_user_rejects_bad_emails() {
        for bad in ["", "ada", "@example.com", "ada@", "a@b@c", "ada lovelace@example.com"] {
            let err = NewUser::new("Ada", bad, Role::Student, fixed_now()).unwrap_err();
            assert!(matches!(err, UserError::InvalidEmail(_)), "accepted {bad:?}");
        }
    }

    #[test]
    fn new_user_rejects_blank_name() {
        let err = NewUser::new("  ", "a@b.c", Role::Student, fixed_now()).unwrap_err();
        assert_eq!(err, UserError::EmptyName);
    }

    #[test]
    fn role_round_trips_storage_names() {
        for role in [Role::Student, Role::Instructor, Role::Admin] {
            assert_eq!(Role::parse(role.as_str()).unwrap(), role);
        }
        assert!(Role::parse("teacher").is_err());
        assert!(Role::Instructor.can_author());
        assert!(!Role::Student.can_author());
    }
}
