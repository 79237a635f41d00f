use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::types::Role;

pub const TABLE: &str = "users";

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload; the password is already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// Columns an admin may change; `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub async fn find_by_email<'e, E>(executor: E, email: &str) -> Result<Option<User>, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE lower(email) = lower($1)")
            .bind(email)
            .fetch_optional(executor)
            .await?;
        Ok(user)
    }

    /// Fails with `DatabaseError::Conflict` when the email is taken
    pub async fn create<'e, E>(executor: E, new_user: &NewUser) -> Result<User, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(new_user.role)
        .fetch_one(executor)
        .await?;
        Ok(user)
    }

    pub async fn update<'e, E>(executor: E, id: Uuid, changes: &UserChanges) -> Result<Option<User>, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                password_hash = COALESCE($4, password_hash),
                role = COALESCE($5, role),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.name.as_deref())
        .bind(changes.email.as_deref())
        .bind(changes.password_hash.as_deref())
        .bind(changes.role)
        .fetch_optional(executor)
        .await?;
        Ok(user)
    }

    /// Grant the admin role by email; `None` when no such account exists
    pub async fn promote<'e, E>(executor: E, email: &str) -> Result<Option<User>, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET role = $2, updated_at = now() WHERE lower(email) = lower($1) RETURNING *",
        )
        .bind(email)
        .bind(Role::Admin)
        .fetch_optional(executor)
        .await?;
        Ok(user)
    }
}
