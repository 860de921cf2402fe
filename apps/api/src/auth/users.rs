use async_trait::async_trait;
use sqlx::PgPool;

use crate::auth::supabase::AuthUser;
use crate::errors::AppError;
use crate::models::user::UserRow;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRow>, AppError>;
    async fn insert(&self, user: &AuthUser) -> Result<UserRow, AppError>;
}

pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRow>, AppError> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, name, email, picture, created_at FROM users WHERE email = $1 LIMIT 1",
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn insert(&self, user: &AuthUser) -> Result<UserRow, AppError> {
        let row: UserRow = sqlx::query_as(
            r#"INSERT INTO users (name, email, picture)
               VALUES ($1, $2, $3)
               RETURNING id, name, email, picture, created_at"#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.picture)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }
}

#[cfg(test)]
pub mod testing {
    use std::sync::Mutex;

    use chrono::Utc;

    use super::*;

    #[derive(Default)]
    pub struct MemoryUserStore {
        pub rows: Mutex<Vec<UserRow>>,
    }

    #[async_trait]
    impl UserStore for MemoryUserStore {
        async fn find_by_email(&self, email: &str) -> Result<Option<UserRow>, AppError> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .find(|r| r.email == email)
                .cloned())
        }

        async fn insert(&self, user: &AuthUser) -> Result<UserRow, AppError> {
            let mut rows = self.rows.lock().unwrap();
            let row = UserRow {
                id: rows.len() as i64 + 1,
                name: user.name.clone(),
                email: user.email.clone(),
                picture: user.picture.clone(),
                created_at: Utc::now(),
            };
            rows.push(row.clone());
            Ok(row)
        }
    }
}
