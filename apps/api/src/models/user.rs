use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Row of the `users` table, created on first sign-in.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub name: Option<String>,
    pub email: String,
    pub picture: Option<String>,
    pub created_at: DateTime<Utc>,
}
