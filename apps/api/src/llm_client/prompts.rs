// Shared prompt fragments.
// Each service that needs LLM calls defines its own prompts.rs alongside it.

/// Appended to every template that expects a JSON reply.
pub const JSON_ONLY_INSTRUCTION: &str = "IMPORTANT: Format your response as valid JSON only. \
    Do not include any markdown formatting or additional text.";

/// Replaces every `{{name}}` placeholder in `template` with its value.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    vars.iter().fold(template.to_string(), |acc, (name, value)| {
        acc.replace(&format!("{{{{{name}}}}}"), value)
    })
}
