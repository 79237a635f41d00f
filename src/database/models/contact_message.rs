use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

use crate::database::manager::DatabaseError;

pub const TABLE: &str = "contact_messages";

#[derive(Debug, Clone, FromRow)]
pub struct ContactMessage {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContactMessage {
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        name: &str,
        email: &str,
        message: &str,
    ) -> Result<ContactMessage, DatabaseError> {
        let row = sqlx::query_as::<_, ContactMessage>(
            "INSERT INTO contact_messages (name, email, message) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(name)
        .bind(email)
        .bind(message)
        .fetch_one(executor)
        .await?;
        Ok(row)
    }

    /// The only mutation a message supports after submission
    pub async fn mark_read<'e, E: PgExecutor<'e>>(executor: E, id: Uuid) -> Result<Option<ContactMessage>, DatabaseError> {
        let row = sqlx::query_as::<_, ContactMessage>(
            "UPDATE contact_messages SET is_read = true, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(row)
    }

    pub async fn unread_count<'e, E: PgExecutor<'e>>(executor: E) -> Result<i64, DatabaseError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM contact_messages WHERE NOT is_read")
            .fetch_one(executor)
            .await?;
        Ok(count)
    }
}
