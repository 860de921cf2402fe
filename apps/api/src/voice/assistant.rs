//! Builds the voice-assistant configuration for one interview call.
//!
//! Pure function of the session context; run once before the call starts.
//! Provider selections are fixed, not negotiated at runtime.

use serde::Serialize;

use crate::llm_client::prompts::render;
use crate::models::interview::Question;
use crate::session::SessionContext;

pub const ASSISTANT_NAME: &str = "AI Recruiter";

const TRANSCRIBER_PROVIDER: &str = "deepgram";
const TRANSCRIBER_MODEL: &str = "nova-2";
const TRANSCRIBER_LANGUAGE: &str = "en-US";
const VOICE_PROVIDER: &str = "playht";
const VOICE_ID: &str = "jennifer";
const MODEL_PROVIDER: &str = "openai";
const MODEL_NAME: &str = "gpt-4";

/// Opening line. Replace `{{userName}}` and `{{jobPosition}}`.
const FIRST_MESSAGE_TEMPLATE: &str =
    "Hi {{userName}}, how are you? Ready for your interview on {{jobPosition}}?";

/// System instruction. Replace `{{jobPosition}}` and `{{questionList}}`.
const SYSTEM_PROMPT_TEMPLATE: &str = r#"You are an AI voice assistant conducting interviews.
Your job is to ask candidates the provided interview questions and assess their responses.
Begin the conversation with a friendly introduction, setting a relaxed yet professional tone. Example:
"Hey there! Welcome to your {{jobPosition}} interview. Let's get started with a few questions!"

Ask one question at a time and wait for the candidate's complete answer before proceeding. Keep the questions clear and concise. Ask the following questions one by one, in this order:
Questions:
{{questionList}}

If the candidate struggles, offer hints or rephrase the question without giving away the answer.

Provide brief, encouraging feedback after each answer. Example:
"Nice! That's a solid answer."

Keep the conversation natural and engaging. Use casual phrases like "Alright, next up..." or "Let's tackle a tricky one!"

After the final question, wrap up the interview smoothly by summarizing their performance and end on a positive note. Example:
"Thanks for chatting! Hope to see you crushing projects soon!"

Key Guidelines:
- Be friendly, engaging, and witty
- Keep responses short and natural, like a real conversation
- Adapt based on the candidate's confidence level
- Keep the interview focused on the {{jobPosition}} role"#;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantConfig {
    pub name: String,
    pub first_message: String,
    pub transcriber: TranscriberConfig,
    pub voice: VoiceConfig,
    pub model: ModelConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriberConfig {
    pub provider: String,
    pub model: String,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceConfig {
    pub provider: String,
    pub voice_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelConfig {
    pub provider: String,
    pub model: String,
    pub messages: Vec<ModelMessage>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelMessage {
    pub role: String,
    pub content: String,
}

impl AssistantConfig {
    /// The system instruction sent to the conversational model.
    pub fn system_instruction(&self) -> Option<&str> {
        self.model
            .messages
            .iter()
            .find(|m| m.role == "system")
            .map(|m| m.content.as_str())
    }
}

/// Numbered, newline-delimited question list in the interview's original order.
pub fn format_question_list(questions: &[Question]) -> String {
    questions
        .iter()
        .enumerate()
        .map(|(i, q)| format!("{}. {}", i + 1, q.question.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn build_assistant_config(context: &SessionContext) -> AssistantConfig {
    let job_position = context.interview.job_position.as_str();
    let question_list = format_question_list(&context.interview.question_list);

    AssistantConfig {
        name: ASSISTANT_NAME.to_string(),
        first_message: render(
            FIRST_MESSAGE_TEMPLATE,
            &[
                ("userName", context.user_name.as_str()),
                ("jobPosition", job_position),
            ],
        ),
        transcriber: TranscriberConfig {
            provider: TRANSCRIBER_PROVIDER.to_string(),
            model: TRANSCRIBER_MODEL.to_string(),
            language: TRANSCRIBER_LANGUAGE.to_string(),
        },
        voice: VoiceConfig {
            provider: VOICE_PROVIDER.to_string(),
            voice_id: VOICE_ID.to_string(),
        },
        model: ModelConfig {
            provider: MODEL_PROVIDER.to_string(),
            model: MODEL_NAME.to_string(),
            messages: vec![ModelMessage {
                role: "system".to_string(),
                content: render(
                    SYSTEM_PROMPT_TEMPLATE,
                    &[
                        ("jobPosition", job_position),
                        ("questionList", question_list.as_str()),
                    ],
                ),
            }],
        },
    }
}
