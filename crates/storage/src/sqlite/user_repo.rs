use lms_core::model::{NewUser, PointEvent, User, UserId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{db, id_to_i64, map_user_row, ser, user_id_from_i64};
use crate::repository::{StorageError, UserRepository};

#[async_trait::async_trait]
impl UserRepository for SqliteRepository {
    async fn insert_user(&self, user: &NewUser) -> Result<UserId, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO users (name, email, role, points, created_at)
            VALUES (?1, ?2, ?3, 0, ?4)
            ",
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role.as_str())
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(db)?;

        user_id_from_i64(res.last_insert_rowid())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, name, email, role, points, created_at
            FROM users WHERE id = ?1
            ",
        )
        .bind(id_to_i64(id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_user_row).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, name, email, role, points, created_at
            FROM users WHERE email = ?1
            ",
        )
        .bind(email.trim().to_lowercase())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_user_row).transpose()
    }

    async fn leaderboard(&self, limit: u32) -> Result<Vec<User>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, name, email, role, points, created_at
            FROM users
            ORDER BY points DESC, id ASC
            LIMIT ?1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter().map(map_user_row).collect()
    }

    async fn point_history(
        &self,
        user: UserId,
        limit: u32,
    ) -> Result<Vec<PointEvent>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT user_id, amount, reason, created_at
            FROM point_events
            WHERE user_id = ?1
            ORDER BY created_at DESC, id DESC
            LIMIT ?2
            ",
        )
        .bind(id_to_i64(user.value())?)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut events = Vec::with_capacity(rows.len());
        for row in rows {
            let amount: i64 = row.try_get("amount").map_err(ser)?;
            events.push(PointEvent {
                user_id: user_id_from_i64(row.try_get("user_id").map_err(ser)?)?,
                amount: u32::try_from(amount)
                    .map_err(|_| StorageError::Serialization(format!("invalid amount: {amount}")))?,
                reason: row.try_get("reason").map_err(ser)?,
                created_at: row.try_get("created_at").map_err(ser)?,
            });
        }
        Ok(events)
    }
}
