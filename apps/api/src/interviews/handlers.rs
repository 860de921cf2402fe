//! Axum route handlers for interview authoring, sharing and joining.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::extract::CurrentUser;
use crate::errors::AppError;
use crate::interviews::feedback::{generate_feedback, Feedback, TranscriptTurn};
use crate::interviews::fetch::{FetchState, InterviewFetchClient};
use crate::interviews::links::{share_links, ShareLinks};
use crate::interviews::questions::{generate_more, generate_questions, InterviewForm};
use crate::models::interview::{InterviewRecord, Question};
use crate::notices::Notice;
use crate::session::drafts::{Draft, DraftStore};
use crate::session::SessionContext;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionsResponse {
    pub interview_questions: Vec<Question>,
    pub notices: Vec<Notice>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoreQuestionsRequest {
    pub form_data: InterviewForm,
    #[serde(default)]
    pub questions: Vec<Question>,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub conversation: Vec<TranscriptTurn>,
}

#[derive(Debug, Serialize)]
pub struct FeedbackResponse {
    pub feedback: Feedback,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInterviewRequest {
    pub form_data: InterviewForm,
    pub question_list: Vec<Question>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInterviewResponse {
    #[serde(rename = "interview_id")]
    pub interview_id: String,
    pub question_count: usize,
    pub share: ShareLinks,
}

#[derive(Debug, Serialize)]
pub struct LandingResponse {
    #[serde(flatten)]
    pub state: FetchState,
    /// Where the page's retry button posts, present only after a failure.
    pub retry: Option<String>,
    pub notices: Vec<Notice>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    pub tab: String,
    pub user_name: String,
}

#[derive(Debug, Serialize)]
pub struct JoinResponse {
    /// Session page to navigate to.
    pub redirect: String,
    pub notices: Vec<Notice>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveDraftRequest {
    pub form_data: InterviewForm,
    #[serde(default)]
    pub questions: Vec<Question>,
}

#[derive(Debug, Serialize)]
pub struct DraftResponse {
    pub draft: Draft,
    pub notices: Vec<Notice>,
}

// ────────────────────────────────────────────────────────────────────────────
// Generation
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/questions/generate
pub async fn handle_generate_questions(
    State(state): State<AppState>,
    Json(form): Json<InterviewForm>,
) -> Result<Json<QuestionsResponse>, AppError> {
    let questions = generate_questions(state.llm.as_ref(), &form).await?;
    Ok(Json(QuestionsResponse {
        interview_questions: questions,
        notices: Vec::new(),
    }))
}

/// POST /api/v1/questions/more
///
/// Appends a fresh batch to the questions the recruiter already has.
pub async fn handle_generate_more(
    State(state): State<AppState>,
    Json(req): Json<MoreQuestionsRequest>,
) -> Result<Json<QuestionsResponse>, AppError> {
    let (questions, added) = generate_more(state.llm.as_ref(), &req.form_data, req.questions).await?;
    Ok(Json(QuestionsResponse {
        interview_questions: questions,
        notices: vec![Notice::success(format!(
            "{added} additional questions have been added."
        ))],
    }))
}

/// POST /api/v1/feedback
pub async fn handle_feedback(
    State(state): State<AppState>,
    Json(req): Json<FeedbackRequest>,
) -> Result<Json<FeedbackResponse>, AppError> {
    let feedback = generate_feedback(state.llm.as_ref(), &req.conversation).await?;
    Ok(Json(FeedbackResponse { feedback }))
}

// ────────────────────────────────────────────────────────────────────────────
// Interviews
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/interviews
pub async fn handle_create_interview(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<CreateInterviewRequest>,
) -> Result<(StatusCode, Json<CreateInterviewResponse>), AppError> {
    let form = req.form_data.validate()?;
    if req.question_list.is_empty() {
        return Err(AppError::Validation(
            "An interview needs at least one question".to_string(),
        ));
    }

    let record = InterviewRecord {
        interview_id: Uuid::new_v4().to_string(),
        job_position: form.job_position.to_string(),
        job_description: form.job_description.to_string(),
        duration_minutes: form.duration,
        interview_types: form.interview_types,
        question_list: req.question_list,
        user_email: Some(user.email),
        created_at: None,
    };
    state.interviews.insert(&record).await?;

    let share = share_links(&state.config.host_url, &record.interview_id)?;
    Ok((
        StatusCode::CREATED,
        Json(CreateInterviewResponse {
            interview_id: record.interview_id,
            question_count: record.question_list.len(),
            share,
        }),
    ))
}

/// GET /api/v1/interviews
pub async fn handle_list_interviews(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<InterviewRecord>>, AppError> {
    Ok(Json(state.interviews.list_for_user(&user.email).await?))
}

fn landing(client: &mut InterviewFetchClient) -> LandingResponse {
    let retry = matches!(client.state(), FetchState::Failed { retryable: true, .. })
        .then(|| format!("/api/v1/interviews/{}/retry", client.interview_id()));
    LandingResponse {
        state: client.state().clone(),
        retry,
        notices: client.take_notices(),
    }
}

/// GET /api/v1/interviews/:id
///
/// Failures come back inline (200) with a retry path, not as an error status.
pub async fn handle_get_interview(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<LandingResponse> {
    let mut client = InterviewFetchClient::new(state.interviews.clone(), id);
    client.fetch().await;
    Json(landing(&mut client))
}

/// POST /api/v1/interviews/:id/retry
pub async fn handle_retry_interview(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<LandingResponse> {
    let mut client = InterviewFetchClient::new(state.interviews.clone(), id);
    client.retry().await;
    Json(landing(&mut client))
}

/// POST /api/v1/interviews/:id/join
///
/// Stores the candidate's session context for their tab; the session page
/// reads it on mount.
pub async fn handle_join(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<JoinRequest>,
) -> Result<Json<JoinResponse>, AppError> {
    let user_name = req.user_name.trim();
    if user_name.is_empty() {
        return Err(AppError::Validation(
            "Please enter your full name before joining the interview".to_string(),
        ));
    }
    if req.tab.trim().is_empty() {
        return Err(AppError::Validation("tab is required".to_string()));
    }

    let interview = state.interviews.fetch_by_id(&id).await?;
    let store = state.sessions.context_store(&req.tab)?;
    let context = SessionContext {
        user_name: user_name.to_string(),
        interview,
    };
    run_blocking(move || store.set(Some(context)))
        .await?
        .map_err(|e| AppError::Internal(e.into()))?;

    info!("Candidate joined interview {id} from tab {}", req.tab);
    Ok(Json(JoinResponse {
        redirect: format!("/interview/{id}/start"),
        notices: vec![Notice::success("Joined interview...")],
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Drafts
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/drafts
pub async fn handle_list_drafts(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Draft>>, AppError> {
    let storage = state
        .storage
        .user(&user.email)
        .map_err(|e| AppError::Internal(e.into()))?;
    let drafts = run_blocking(move || DraftStore::new(storage).list())
        .await?
        .map_err(|e| AppError::Internal(e.into()))?;
    Ok(Json(drafts))
}

/// POST /api/v1/drafts
pub async fn handle_save_draft(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<SaveDraftRequest>,
) -> Result<Json<DraftResponse>, AppError> {
    let storage = state
        .storage
        .user(&user.email)
        .map_err(|e| AppError::Internal(e.into()))?;
    let saved = run_blocking(move || {
        DraftStore::new(storage).save(req.form_data, req.questions, Utc::now())
    })
    .await?;
    match saved {
        Ok(draft) => Ok(Json(DraftResponse {
            draft,
            notices: vec![Notice::success(
                "Your interview draft has been saved successfully.",
            )],
        })),
        Err(e) => {
            warn!("Saving draft for {} failed: {e}", user.email);
            Err(AppError::Backend(
                "Failed to save draft. Please try again.".to_string(),
            ))
        }
    }
}

/// Local storage does blocking file I/O; keep it off the async workers.
async fn run_blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(e.into()))
}
