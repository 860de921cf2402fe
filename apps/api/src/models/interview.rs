use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

/// Category of a generated interview question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionType {
    Technical,
    Behavioral,
    Experience,
    #[serde(rename = "Problem Solving", alias = "ProblemSolving")]
    ProblemSolving,
    Leadership,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub question: String,
    #[serde(rename = "type")]
    pub kind: QuestionType,
}

/// The stored job/question definition shared with candidates via a link.
///
/// Serialized in the camelCase shape the dashboard and the `interviews`
/// table use. Immutable once shared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewRecord {
    #[serde(rename = "interview_id")]
    pub interview_id: String,
    pub job_position: String,
    pub job_description: String,
    #[serde(rename = "duration")]
    pub duration_minutes: u32,
    pub interview_types: Vec<String>,
    pub question_list: Vec<Question>,
    #[serde(rename = "user_email", default, skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    #[serde(rename = "created_at", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Row shape of the `interviews` table. Column names keep the dashboard's camelCase.
#[derive(Debug, Clone, FromRow)]
pub struct InterviewRow {
    pub interview_id: String,
    #[sqlx(rename = "jobPosition")]
    pub job_position: String,
    #[sqlx(rename = "jobDescription")]
    pub job_description: String,
    pub duration: i32,
    #[sqlx(rename = "interviewTypes")]
    pub interview_types: Json<Vec<String>>,
    #[sqlx(rename = "questionList")]
    pub question_list: Json<Vec<Question>>,
    pub user_email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<InterviewRow> for InterviewRecord {
    fn from(row: InterviewRow) -> Self {
        InterviewRecord {
            interview_id: row.interview_id,
            job_position: row.job_position,
            job_description: row.job_description,
            duration_minutes: u32::try_from(row.duration).unwrap_or(0),
            interview_types: normalize_interview_types(row.interview_types.0),
            question_list: row.question_list.0,
            user_email: row.user_email,
            created_at: Some(row.created_at),
        }
    }
}

/// Interview types behave as a set: trimmed, blanks dropped, first occurrence kept.
pub fn normalize_interview_types(types: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(types.len());
    for t in types {
        let t = t.trim();
        if !t.is_empty() && !out.iter().any(|existing| existing == t) {
            out.push(t.to_string());
        }
    }
    out
}
