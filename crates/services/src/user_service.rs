use std::sync::Arc;

use lms_core::model::{NewUser, PointEvent, Role, User, UserId};
use storage::repository::{StorageError, UserRepository};
use tracing::info;

use crate::Clock;
use crate::error::UserServiceError;

/// Registration, lookup and the points leaderboard.
#[derive(Clone)]
pub struct UserService {
    clock: Clock,
    users: Arc<dyn UserRepository>,
}

impl UserService {
    #[must_use]
    pub fn new(clock: Clock, users: Arc<dyn UserRepository>) -> Self {
        Self { clock, users }
    }

    /// Register a new account with zero points.
    ///
    /// # Errors
    ///
    /// Returns `UserServiceError::User` for invalid input and
    /// `UserServiceError::EmailTaken` when the email is already registered.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        role: Role,
    ) -> Result<User, UserServiceError> {
        let new_user = NewUser::new(name, email, role, self.clock.now())?;
        let id = match self.users.insert_user(&new_user).await {
            Ok(id) => id,
            Err(StorageError::Conflict) => return Err(UserServiceError::EmailTaken),
            Err(e) => return Err(e.into()),
        };
        info!(user_id = %id, role = role.as_str(), "user registered");

        Ok(User::from_persisted(
            id,
            new_user.name,
            new_user.email,
            new_user.role,
            0,
            new_user.created_at,
        ))
    }

    /// # Errors
    ///
    /// Returns `UserServiceError::NotFound` for unknown ids.
    pub async fn get_user(&self, id: UserId) -> Result<User, UserServiceError> {
        self.users
            .get_user(id)
            .await?
            .ok_or(UserServiceError::NotFound)
    }

    /// # Errors
    ///
    /// Returns `UserServiceError::Storage` if repository access fails.
    pub async fn leaderboard(&self, limit: u32) -> Result<Vec<User>, UserServiceError> {
        Ok(self.users.leaderboard(limit).await?)
    }

    /// # Errors
    ///
    /// Returns `UserServiceError::Storage` if repository access fails.
    pub async fn point_history(
        &self,
        user: UserId,
        limit: u32,
    ) -> Result<Vec<PointEvent>, UserServiceError> {
        Ok(self.users.point_history(user, limit).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lms_core::time::fixed_now;
    use storage::repository::Storage;

    async fn service(name: &str) -> UserService {
        let storage = Storage::sqlite(&format!("sqlite:file:{name}?mode=memory&cache=shared"))
            .await
            .unwrap();
        UserService::new(Clock::fixed(fixed_now()), storage.users)
    }

    #[tokio::test]
    async fn register_normalizes_and_rejects_duplicates() {
        let service = service("memdb_user_service_register").await;
        let user = service
            .register(" Ada ", "Ada@Example.com", Role::Student)
            .await
            .unwrap();
        assert_eq!(user.email(), "ada@example.com");
        assert_eq!(user.points(), 0);

        let err = service
            .register("Ada 2", "ada@example.com", Role::Student)
            .await
            .unwrap_err();
        assert!(matches!(err, UserServiceError::EmailTaken));
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let service = service("memdb_user_service_missing").await;
        let err = service.get_user(UserId::new(42)).await.unwrap_err();
        assert!(matches!(err, UserServiceError::NotFound));
    }
}
