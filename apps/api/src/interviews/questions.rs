//! Question Generation Client.
//!
//! Validates the recruiter's job form, renders the fixed prompt, and turns
//! the model's free-text reply into a strictly typed question list.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::errors::AppError;
use crate::interviews::prompts::QUESTION_GENERATION_TEMPLATE;
use crate::llm_client::prompts::{render, JSON_ONLY_INSTRUCTION};
use crate::llm_client::{parse_json_reply, LlmError, TextGeneration};
use crate::models::interview::{normalize_interview_types, Question};

/// The recruiter's "create interview" form.
///
/// Every field is optional on the wire so a missing one surfaces as a
/// `ValidationError` naming the field rather than a JSON rejection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewForm {
    pub job_position: Option<String>,
    pub job_description: Option<String>,
    /// Minutes. The dashboard's select sends it as a string ("30").
    #[serde(default, deserialize_with = "minutes_from_string_or_number")]
    pub duration: Option<u32>,
    pub interview_types: Option<Vec<String>>,
}

/// A form that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidForm<'a> {
    pub job_position: &'a str,
    pub job_description: &'a str,
    pub duration: u32,
    pub interview_types: Vec<String>,
}

fn minutes_from_string_or_number<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Minutes {
        Number(u32),
        Text(String),
    }

    match Option::<Minutes>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Minutes::Number(n)) => Ok(Some(n)),
        Some(Minutes::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Minutes::Text(s)) => {
            // "30 Min" style labels carry the number first.
            let digits: String = s.trim().chars().take_while(char::is_ascii_digit).collect();
            digits
                .parse()
                .map(Some)
                .map_err(|_| serde::de::Error::custom(format!("invalid duration '{s}'")))
        }
    }
}

impl InterviewForm {
    pub fn validate(&self) -> Result<ValidForm<'_>, AppError> {
        let job_position = self.job_position.as_deref().map(str::trim).unwrap_or("");
        if job_position.is_empty() {
            return Err(AppError::Validation("jobPosition is required".to_string()));
        }
        if job_position.chars().count() < 2 {
            return Err(AppError::Validation(
                "Job position must be at least 2 characters.".to_string(),
            ));
        }

        let job_description = self.job_description.as_deref().map(str::trim).unwrap_or("");
        if job_description.is_empty() {
            return Err(AppError::Validation("jobDescription is required".to_string()));
        }
        if job_description.chars().count() < 10 {
            return Err(AppError::Validation(
                "Job description must be at least 10 characters.".to_string(),
            ));
        }

        let duration = match self.duration {
            Some(minutes) if minutes > 0 => minutes,
            _ => {
                return Err(AppError::Validation(
                    "Please select interview duration.".to_string(),
                ))
            }
        };

        let interview_types =
            normalize_interview_types(self.interview_types.clone().unwrap_or_default());
        if interview_types.is_empty() {
            return Err(AppError::Validation(
                "Please select at least one interview type.".to_string(),
            ));
        }

        Ok(ValidForm {
            job_position,
            job_description,
            duration,
            interview_types,
        })
    }
}

pub fn build_prompt(form: &ValidForm<'_>) -> String {
    let duration = format!("{} Min", form.duration);
    let types = form.interview_types.join(", ");
    render(
        QUESTION_GENERATION_TEMPLATE,
        &[
            ("jobTitle", form.job_position),
            ("jobDescription", form.job_description),
            ("duration", duration.as_str()),
            ("interviewTypes", types.as_str()),
            ("jsonOnly", JSON_ONLY_INSTRUCTION),
        ],
    )
}

/// Validates the form, then makes exactly one generation call.
pub async fn generate_questions(
    llm: &dyn TextGeneration,
    form: &InterviewForm,
) -> Result<Vec<Question>, AppError> {
    let valid = form.validate()?;
    let prompt = build_prompt(&valid);
    debug!("Question prompt for '{}': {} chars", valid.job_position, prompt.len());

    let reply = llm.complete(&prompt).await?;
    let questions = parse_question_reply(&reply)?;
    info!(
        "Generated {} questions for '{}'",
        questions.len(),
        valid.job_position
    );
    Ok(questions)
}

/// "Generate more questions": a fresh generation appended after `existing`.
pub async fn generate_more(
    llm: &dyn TextGeneration,
    form: &InterviewForm,
    mut existing: Vec<Question>,
) -> Result<(Vec<Question>, usize), AppError> {
    let added = generate_questions(llm, form).await?;
    let count = added.len();
    existing.extend(added);
    Ok((existing, count))
}

/// Accepts `{"interviewQuestions": [...]}` or a bare array, optionally fenced.
/// Every entry must carry a non-empty `question` and a known `type`.
pub fn parse_question_reply(reply: &str) -> Result<Vec<Question>, LlmError> {
    let value: Value = parse_json_reply(reply)?;
    let entries = match value {
        Value::Array(entries) => entries,
        Value::Object(mut map) => match map.remove("interviewQuestions") {
            Some(Value::Array(entries)) => entries,
            _ => {
                return Err(LlmError::Schema(
                    "Unexpected response format: no interviewQuestions array".to_string(),
                ))
            }
        },
        _ => {
            return Err(LlmError::Schema(
                "Unexpected response format: expected an object or array".to_string(),
            ))
        }
    };

    if entries.is_empty() {
        return Err(LlmError::Schema("AI returned no interview questions".to_string()));
    }

    entries
        .into_iter()
        .enumerate()
        .map(|(i, entry)| {
            let question: Question = serde_json::from_value(entry).map_err(|e| {
                LlmError::Schema(format!("Question {} is invalid: {e}", i + 1))
            })?;
            if question.question.trim().is_empty() {
                return Err(LlmError::Schema(format!("Question {} is empty", i + 1)));
            }
            Ok(question)
        })
        .collect()
}
