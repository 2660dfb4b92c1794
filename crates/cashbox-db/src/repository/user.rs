//! # User Repository
//!
//! Directory lookups for cashiers and authorizing managers.

use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;
use cashbox_core::User;

/// Repository for user rows.
#[derive(Debug)]
pub struct UserRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> UserRepository<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        UserRepository { conn }
    }

    pub async fn get(&mut self, id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT id, name FROM users WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *self.conn)
            .await?;
        Ok(user)
    }

    pub async fn exists(&mut self, id: &str) -> DbResult<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM users WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *self.conn)
            .await?;
        Ok(found.is_some())
    }

    pub async fn insert(&mut self, user: &User) -> DbResult<()> {
        debug!(id = %user.id, "Inserting user");

        sqlx::query("INSERT INTO users (id, name) VALUES (?1, ?2)")
            .bind(&user.id)
            .bind(&user.name)
            .execute(&mut *self.conn)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::repository::test_support::{memory_db, seed_directory};

    #[tokio::test]
    async fn test_lookup() {
        let db = memory_db().await;
        let mut uow = db.begin().await.unwrap();
        seed_directory(&mut uow).await;

        assert!(uow.users().exists("mgr-1").await.unwrap());
        assert!(!uow.users().exists("ghost").await.unwrap());
        assert_eq!(uow.users().get("user-1").await.unwrap().unwrap().name, "Ana Cashier");
    }
}
