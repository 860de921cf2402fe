pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::auth::handlers as auth;
use crate::interviews::handlers as interviews;
use crate::session::handlers as sessions;
use crate::state::AppState;
use crate::voice::handlers as voice;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Recruiter auth
        .route("/api/v1/auth/sign-in", get(auth::handle_sign_in))
        .route("/api/v1/auth/sign-out", post(auth::handle_sign_out))
        .route("/api/v1/users/me", get(auth::handle_me))
        // Generation
        .route(
            "/api/v1/questions/generate",
            post(interviews::handle_generate_questions),
        )
        .route("/api/v1/questions/more", post(interviews::handle_generate_more))
        .route("/api/v1/feedback", post(interviews::handle_feedback))
        // Interviews
        .route(
            "/api/v1/interviews",
            get(interviews::handle_list_interviews).post(interviews::handle_create_interview),
        )
        .route("/api/v1/interviews/:id", get(interviews::handle_get_interview))
        .route(
            "/api/v1/interviews/:id/retry",
            post(interviews::handle_retry_interview),
        )
        .route("/api/v1/interviews/:id/join", post(interviews::handle_join))
        .route(
            "/api/v1/drafts",
            get(interviews::handle_list_drafts).post(interviews::handle_save_draft),
        )
        // Candidate session page
        .route(
            "/api/v1/sessions/:tab",
            get(sessions::handle_view).delete(sessions::handle_unmount),
        )
        .route("/api/v1/sessions/:tab/mount", post(sessions::handle_mount))
        .route("/api/v1/sessions/:tab/mute", post(sessions::handle_toggle_mute))
        .route("/api/v1/sessions/:tab/end", post(sessions::handle_end))
        // Voice provider webhook
        .route("/api/v1/voice/events", post(voice::handle_voice_event))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::auth::testing::FakeIdentity;
    use crate::auth::users::testing::MemoryUserStore;
    use crate::auth::AuthSession;
    use crate::config::Config;
    use crate::interviews::store::testing::MemoryInterviewStore;
    use crate::llm_client::testing::ScriptedLlm;
    use crate::models::interview::{InterviewRecord, Question, QuestionType};
    use crate::session::manager::SessionManager;
    use crate::storage::StorageRoot;
    use crate::voice::client::testing::{Call, FakeVoiceClient, FakeVoiceFactory};

    struct Harness {
        app: Router,
        llm: Arc<ScriptedLlm>,
        store: Arc<MemoryInterviewStore>,
        voice: Arc<FakeVoiceClient>,
        _dir: tempfile::TempDir,
    }

    fn record() -> InterviewRecord {
        InterviewRecord {
            interview_id: "iv-1".to_string(),
            job_position: "Platform Engineer".to_string(),
            job_description: "Own the deploy pipeline".to_string(),
            duration_minutes: 30,
            interview_types: vec!["Technical".to_string()],
            question_list: vec![
                Question {
                    question: "How do you roll back?".to_string(),
                    kind: QuestionType::Technical,
                },
                Question {
                    question: "Describe a hard incident.".to_string(),
                    kind: QuestionType::Experience,
                },
            ],
            user_email: Some("hr@example.com".to_string()),
            created_at: None,
        }
    }

    fn harness_with(llm: ScriptedLlm, secret: Option<&str>) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::for_tests(dir.path());
        config.voice_webhook_secret = secret.map(str::to_string);

        let llm = Arc::new(llm);
        let store = Arc::new(MemoryInterviewStore::with(vec![record()]));
        let voice = Arc::new(FakeVoiceClient::default());
        let storage = StorageRoot::new(dir.path());

        let state = AppState {
            llm: llm.clone(),
            interviews: store.clone(),
            auth: AuthSession::new(
                Arc::new(FakeIdentity::with_user("tok", "hr@example.com")),
                Arc::new(MemoryUserStore::default()),
            ),
            sessions: Arc::new(SessionManager::new(
                storage.clone(),
                Arc::new(FakeVoiceFactory(voice.clone())),
                config.voice_connect_timeout,
            )),
            storage,
            config,
        };

        Harness {
            app: build_router(state),
            llm,
            store,
            voice,
            _dir: dir,
        }
    }

    fn harness() -> Harness {
        harness_with(ScriptedLlm::default(), None)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn empty_post(uri: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let h = harness();
        let (status, body) = send(&h.app, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_generate_without_description_is_400_and_offline() {
        let h = harness();
        let (status, body) = send(
            &h.app,
            post_json(
                "/api/v1/questions/generate",
                json!({"jobPosition": "SRE", "duration": "30", "interviewTypes": ["Technical"]}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(h.llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_generate_returns_parsed_questions() {
        let h = harness_with(
            ScriptedLlm::replying([
                "```json\n{\"interviewQuestions\":[{\"question\":\"Tell me about yourself\",\"type\":\"Behavioral\"}]}\n```",
            ]),
            None,
        );
        let (status, body) = send(
            &h.app,
            post_json(
                "/api/v1/questions/generate",
                json!({
                    "jobPosition": "SRE",
                    "jobDescription": "Keep production healthy",
                    "duration": "30",
                    "interviewTypes": ["Behavioral"]
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["interviewQuestions"].as_array().unwrap().len(), 1);
        assert_eq!(body["interviewQuestions"][0]["type"], "Behavioral");
    }

    #[tokio::test]
    async fn test_malformed_ai_reply_is_502() {
        let h = harness_with(ScriptedLlm::replying(["I cannot do that."]), None);
        let (status, body) = send(
            &h.app,
            post_json(
                "/api/v1/questions/generate",
                json!({
                    "jobPosition": "SRE",
                    "jobDescription": "Keep production healthy",
                    "duration": 30,
                    "interviewTypes": ["Technical"]
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], "MALFORMED_RESPONSE");
    }

    #[tokio::test]
    async fn test_missing_interview_renders_inline_failure_with_retry() {
        let h = harness();
        let (status, body) = send(&h.app, get("/api/v1/interviews/abc123")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"], "failed");
        assert_eq!(body["code"], "NOT_FOUND");
        assert_eq!(body["retry"], "/api/v1/interviews/abc123/retry");
        assert_eq!(body["notices"][0]["level"], "error");

        let (_, body) = send(&h.app, empty_post("/api/v1/interviews/abc123/retry")).await;
        assert_eq!(body["state"], "failed");
        assert_eq!(
            h.store.fetched(),
            vec!["abc123".to_string(), "abc123".to_string()]
        );
    }

    #[tokio::test]
    async fn test_create_interview_requires_sign_in() {
        let h = harness();
        let request = post_json(
            "/api/v1/interviews",
            json!({"formData": {}, "questionList": []}),
        );
        let (status, body) = send(&h.app, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "PERMISSION_ERROR");
    }

    #[tokio::test]
    async fn test_create_interview_returns_share_links() {
        let h = harness();
        let mut request = post_json(
            "/api/v1/interviews",
            json!({
                "formData": {
                    "jobPosition": "QA Lead",
                    "jobDescription": "Own release quality",
                    "duration": "15",
                    "interviewTypes": ["Leadership"]
                },
                "questionList": [{"question": "How do you triage?", "type": "Leadership"}]
            }),
        );
        request
            .headers_mut()
            .insert("authorization", "Bearer tok".parse().unwrap());
        let (status, body) = send(&h.app, request).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["interview_id"].as_str().unwrap().to_string();
        assert_eq!(
            body["share"]["link"],
            format!("https://hire.example/interview/{id}")
        );

        let mut list = get("/api/v1/interviews");
        list.headers_mut()
            .insert("authorization", "Bearer tok".parse().unwrap());
        let (_, body) = send(&h.app, list).await;
        assert!(body
            .as_array()
            .unwrap()
            .iter()
            .any(|r| r["interview_id"] == id.as_str()));
    }

    #[tokio::test]
    async fn test_join_requires_name() {
        let h = harness();
        let (status, body) = send(
            &h.app,
            post_json(
                "/api/v1/interviews/iv-1/join",
                json!({"tab": "t1", "userName": "   "}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_mount_without_join_redirects() {
        let h = harness();
        let (status, body) = send(&h.app, empty_post("/api/v1/sessions/t1/mount")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "redirect");
        assert!(h.voice.calls().is_empty());
    }

    #[tokio::test]
    async fn test_candidate_session_end_to_end() {
        let h = harness();
        let (status, body) = send(
            &h.app,
            post_json(
                "/api/v1/interviews/iv-1/join",
                json!({"tab": "t1", "userName": "Grace"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["redirect"], "/interview/iv-1/start");

        let (_, body) = send(&h.app, empty_post("/api/v1/sessions/t1/mount")).await;
        assert_eq!(body["status"], "mounted");
        assert_eq!(body["phase"], "connecting");
        assert_eq!(body["candidate_initial"], "G");

        let config = h.voice.last_config.lock().unwrap().clone().unwrap();
        let instruction = config.system_instruction().unwrap();
        let first = instruction.find("How do you roll back?").unwrap();
        let second = instruction.find("Describe a hard incident.").unwrap();
        assert!(first < second);

        let (_, ack) = send(
            &h.app,
            post_json(
                "/api/v1/voice/events",
                json!({"message": {"type": "status-update", "status": "in-progress", "call": {"id": "call-1"}}}),
            ),
        )
        .await;
        assert_eq!(ack["handled"], true);

        send(
            &h.app,
            post_json(
                "/api/v1/voice/events",
                json!({"message": {"type": "speech-update", "status": "started", "role": "assistant", "call": {"id": "call-1"}}}),
            ),
        )
        .await;
        let (_, view) = send(&h.app, get("/api/v1/sessions/t1")).await;
        assert_eq!(view["phase"], "active");
        assert_eq!(view["assistant_speaking"], true);
        assert_eq!(view["user_turn"], false);

        let (_, view) = send(&h.app, empty_post("/api/v1/sessions/t1/mute")).await;
        assert_eq!(view["muted"], true);

        let (_, view) = send(&h.app, empty_post("/api/v1/sessions/t1/end")).await;
        assert_eq!(view["phase"], "ended");
        assert_eq!(
            h.voice.calls(),
            vec![Call::Start, Call::SetMuted(true), Call::Stop]
        );

        // Context was cleared: a remount goes back to the landing page.
        let (status, _) = send(
            &h.app,
            Request::builder()
                .method("DELETE")
                .uri("/api/v1/sessions/t1")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (_, body) = send(&h.app, empty_post("/api/v1/sessions/t1/mount")).await;
        assert_eq!(body["status"], "redirect");
    }

    #[tokio::test]
    async fn test_webhook_secret_is_enforced_when_configured() {
        let h = harness_with(ScriptedLlm::default(), Some("s3cret"));
        let event = json!({"message": {"type": "status-update", "status": "ended", "call": {"id": "x"}}});

        let (status, _) = send(&h.app, post_json("/api/v1/voice/events", event.clone())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let mut request = post_json("/api/v1/voice/events", event);
        request
            .headers_mut()
            .insert("x-vapi-secret", "s3cret".parse().unwrap());
        let (status, ack) = send(&h.app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ack["handled"], false);
    }

    #[tokio::test]
    async fn test_drafts_are_per_user() {
        let h = harness();
        let mut save = post_json(
            "/api/v1/drafts",
            json!({"formData": {"jobPosition": "PM"}, "questions": []}),
        );
        save.headers_mut()
            .insert("authorization", "Bearer tok".parse().unwrap());
        let (status, body) = send(&h.app, save).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["draft"]["id"].as_str().unwrap().starts_with("draft_"));

        let mut list = get("/api/v1/drafts");
        list.headers_mut()
            .insert("authorization", "Bearer tok".parse().unwrap());
        let (_, body) = send(&h.app, list).await;
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (status, _) = send(&h.app, get("/api/v1/drafts")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
