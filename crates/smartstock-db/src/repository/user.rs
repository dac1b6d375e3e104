//! # User Repository
//!
//! Staff login accounts. Password hashing happens in the API layer; this
//! repository only stores and returns the PHC string.

use chrono::Utc;
use smartstock_core::User;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Inserts a user. The email is stored lowercase.
    ///
    /// ## Errors
    /// - `UniqueViolation` when the email is already registered
    pub async fn create(&self, name: &str, email: &str, password_hash: &str) -> DbResult<User> {
        let user = User {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            email: email.trim().to_lowercase(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };

        debug!(id = %user.id, email = %user.email, "Inserting user");

        sqlx::query(
            "INSERT INTO users (id, name, email, password_hash, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value(&user.email))?;

        Ok(user)
    }

    /// Looks a user up by email, case-insensitively.
    pub async fn find_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, password_hash, created_at FROM users WHERE email = ?1",
        )
        .bind(email.trim().to_lowercase())
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_create_and_find() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let users = db.users();

        let created = users
            .create("Sam", "Sam@Example.com", "$argon2id$stub")
            .await
            .unwrap();
        assert_eq!(created.email, "sam@example.com");

        let found = users.find_by_email("SAM@example.com").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.password_hash, "$argon2id$stub");

        assert!(users.find_by_email("nobody@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let users = db.users();

        users.create("Sam", "sam@example.com", "h1").await.unwrap();
        let err = users.create("Sam 2", "sam@example.com", "h2").await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }
}
