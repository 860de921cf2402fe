//! Feedback Generation Client: rates a finished interview from its transcript.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::interviews::prompts::FEEDBACK_TEMPLATE;
use crate::llm_client::prompts::{render, JSON_ONLY_INSTRUCTION};
use crate::llm_client::{parse_json_reply, LlmError, TextGeneration};

/// Highest score on every rating axis.
pub const MAX_RATING: u8 = 10;

/// One turn of the interview transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptTurn {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    #[serde(alias = "techicalSkills")]
    pub technical_skills: u8,
    pub communication: u8,
    pub problem_solving: u8,
    #[serde(alias = "experince")]
    pub experience: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub rating: Rating,
    #[serde(alias = "summery")]
    pub summary: String,
    #[serde(alias = "Recommendation")]
    pub recommendation: String,
    #[serde(alias = "RecommendationMsg")]
    pub recommendation_msg: String,
}

#[derive(Debug, Deserialize)]
struct FeedbackEnvelope {
    feedback: Feedback,
}

pub fn build_prompt(conversation: &[TranscriptTurn]) -> Result<String, AppError> {
    let transcript = serde_json::to_string(conversation)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("transcript encoding failed: {e}")))?;
    Ok(render(
        FEEDBACK_TEMPLATE,
        &[
            ("conversation", transcript.as_str()),
            ("jsonOnly", JSON_ONLY_INSTRUCTION),
        ],
    ))
}

pub async fn generate_feedback(
    llm: &dyn TextGeneration,
    conversation: &[TranscriptTurn],
) -> Result<Feedback, AppError> {
    if conversation.is_empty() {
        return Err(AppError::Validation(
            "conversation must contain at least one turn".to_string(),
        ));
    }

    let prompt = build_prompt(conversation)?;
    let reply = llm.complete(&prompt).await?;
    let feedback = parse_feedback_reply(&reply)?;
    info!(
        "Generated feedback ({} turns): recommendation={}",
        conversation.len(),
        feedback.recommendation
    );
    Ok(feedback)
}

pub fn parse_feedback_reply(reply: &str) -> Result<Feedback, LlmError> {
    let envelope: FeedbackEnvelope = parse_json_reply::<serde_json::Value>(reply)
        .and_then(|value| {
            serde_json::from_value(value)
                .map_err(|e| LlmError::Schema(format!("Feedback has an unexpected shape: {e}")))
        })?;
    let feedback = envelope.feedback;

    let r = &feedback.rating;
    for (axis, score) in [
        ("technicalSkills", r.technical_skills),
        ("communication", r.communication),
        ("problemSolving", r.problem_solving),
        ("experience", r.experience),
    ] {
        if score > MAX_RATING {
            return Err(LlmError::Schema(format!(
                "Rating {axis}={score} is outside 0-{MAX_RATING}"
            )));
        }
    }
    Ok(feedback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::ScriptedLlm;

    fn transcript() -> Vec<TranscriptTurn> {
        vec![
            TranscriptTurn {
                role: "assistant".to_string(),
                content: "Why Rust?".to_string(),
            },
            TranscriptTurn {
                role: "user".to_string(),
                content: "Memory safety without a GC.".to_string(),
            },
        ]
    }

    #[test]
    fn test_parses_misspelled_keys() {
        let reply = r#"```json
{
    "feedback": {
        "rating": {"techicalSkills": 5, "communication": 6, "problemSolving": 4, "experince": 7},
        "summery": "Solid.\nClear.\nShort.",
        "Recommendation": "No",
        "RecommendationMsg": "Needs more depth"
    }
}
```"#;
        let feedback = parse_feedback_reply(reply).unwrap();
        assert_eq!(feedback.rating.technical_skills, 5);
        assert_eq!(feedback.rating.experience, 7);
        assert_eq!(feedback.recommendation, "No");
        assert_eq!(feedback.recommendation_msg, "Needs more depth");
    }

    #[test]
    fn test_out_of_range_rating_is_malformed() {
        let reply = r#"{"feedback":{"rating":{"technicalSkills":11,"communication":6,"problemSolving":4,"experience":7},
            "summary":"s","recommendation":"Yes","recommendationMsg":"m"}}"#;
        assert!(matches!(parse_feedback_reply(reply), Err(LlmError::Schema(_))));
    }

    #[test]
    fn test_missing_feedback_object_is_malformed() {
        assert!(matches!(
            parse_feedback_reply(r#"{"rating": 5}"#),
            Err(LlmError::Schema(_))
        ));
        assert!(matches!(
            parse_feedback_reply("not json"),
            Err(LlmError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn test_transcript_is_embedded_in_prompt() {
        let llm = ScriptedLlm::replying([r#"{"feedback":{"rating":{"technicalSkills":8,"communication":9,"problemSolving":7,"experience":6},"summary":"Good","recommendation":"Yes","recommendationMsg":"Hire"}}"#]);
        let feedback = generate_feedback(&llm, &transcript()).await.unwrap();
        assert_eq!(feedback.rating.communication, 9);

        let prompts = llm.prompts.lock().unwrap();
        assert!(prompts[0].contains("Memory safety without a GC."));
        assert!(prompts[0].contains("\"role\":\"assistant\""));
    }

    #[tokio::test]
    async fn test_empty_transcript_is_rejected_without_call() {
        let llm = ScriptedLlm::default();
        assert!(matches!(
            generate_feedback(&llm, &[]).await,
            Err(AppError::Validation(_))
        ));
        assert_eq!(llm.call_count(), 0);
    }
}
