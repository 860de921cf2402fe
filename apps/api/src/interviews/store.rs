//! Relational interview store (`interviews` table).

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{error, info};

use crate::errors::AppError;
use crate::models::interview::{InterviewRecord, InterviewRow};

/// Number of interviews shown on the recruiter dashboard.
pub const RECENT_LIMIT: i64 = 20;

#[async_trait]
pub trait InterviewStore: Send + Sync {
    /// Exactly one row → record; zero rows → `NotFound`; query failure → `Backend`.
    async fn fetch_by_id(&self, interview_id: &str) -> Result<InterviewRecord, AppError>;
    async fn insert(&self, record: &InterviewRecord) -> Result<(), AppError>;
    /// Newest first.
    async fn list_for_user(&self, email: &str) -> Result<Vec<InterviewRecord>, AppError>;
}

pub struct PgInterviewStore {
    db: PgPool,
}

impl PgInterviewStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

const LOAD_FAILED: &str = "Failed to load interview details";
const SAVE_FAILED: &str = "Failed to save interview";
const LIST_FAILED: &str = "Failed to load your interviews";

/// Query errors are logged in full; the caller only sees `user_message`.
fn backend(user_message: &'static str) -> impl Fn(sqlx::Error) -> AppError {
    move |e| {
        error!("Interview store query failed: {e}");
        AppError::Backend(user_message.to_string())
    }
}

#[async_trait]
impl InterviewStore for PgInterviewStore {
    async fn fetch_by_id(&self, interview_id: &str) -> Result<InterviewRecord, AppError> {
        let rows: Vec<InterviewRow> = sqlx::query_as(
            r#"SELECT interview_id, "jobPosition", "jobDescription", duration,
                      "interviewTypes", "questionList", user_email, created_at
               FROM interviews WHERE interview_id = $1 LIMIT 2"#,
        )
        .bind(interview_id)
        .fetch_all(&self.db)
        .await
        .map_err(backend(LOAD_FAILED))?;

        let mut rows = rows.into_iter();
        match (rows.next(), rows.next()) {
            (Some(row), None) => Ok(row.into()),
            (None, _) => Err(AppError::NotFound("Interview not found".to_string())),
            (Some(_), Some(_)) => {
                error!("More than one interview stored under id {interview_id}");
                Err(AppError::Backend(LOAD_FAILED.to_string()))
            }
        }
    }

    async fn insert(&self, record: &InterviewRecord) -> Result<(), AppError> {
        let duration = i32::try_from(record.duration_minutes)
            .map_err(|_| AppError::Validation("duration is out of range".to_string()))?;
        sqlx::query(
            r#"INSERT INTO interviews
                   (interview_id, "jobPosition", "jobDescription", duration,
                    "interviewTypes", "questionList", user_email)
               VALUES ($1, $2, $3, $4, $5, $6, $7)"#,
        )
        .bind(&record.interview_id)
        .bind(&record.job_position)
        .bind(&record.job_description)
        .bind(duration)
        .bind(sqlx::types::Json(&record.interview_types))
        .bind(sqlx::types::Json(&record.question_list))
        .bind(&record.user_email)
        .execute(&self.db)
        .await
        .map_err(backend(SAVE_FAILED))?;

        info!(
            "Stored interview {} ({} questions)",
            record.interview_id,
            record.question_list.len()
        );
        Ok(())
    }

    async fn list_for_user(&self, email: &str) -> Result<Vec<InterviewRecord>, AppError> {
        let rows: Vec<InterviewRow> = sqlx::query_as(
            r#"SELECT interview_id, "jobPosition", "jobDescription", duration,
                      "interviewTypes", "questionList", user_email, created_at
               FROM interviews WHERE user_email = $1
               ORDER BY created_at DESC LIMIT $2"#,
        )
        .bind(email)
        .bind(RECENT_LIMIT)
        .fetch_all(&self.db)
        .await
        .map_err(backend(LIST_FAILED))?;

        Ok(rows.into_iter().map(InterviewRecord::from).collect())
    }
}
