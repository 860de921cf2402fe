// Prompt templates for question and feedback generation.
// Placeholders are filled with llm_client::prompts::render.

/// Placeholders: `{{jobTitle}}`, `{{jobDescription}}`, `{{duration}}`,
/// `{{interviewTypes}}`, `{{jsonOnly}}`.
pub const QUESTION_GENERATION_TEMPLATE: &str = r#"You are an expert technical interviewer.
Based on the following inputs, generate a well-structured list of high-quality interview questions:

Job Title: {{jobTitle}}
Job Description: {{jobDescription}}
Interview Duration: {{duration}}
Interview Type: {{interviewTypes}}

Your task:
- Analyze the job description to identify key responsibilities, required skills, and expected experience.
- Generate a list of interview questions depending on the interview duration.
- Adjust the number and depth of questions to match the interview duration.
- Ensure the questions match the tone and structure of a real-life {{interviewTypes}} interview.

{{jsonOnly}}

Expected JSON format:
{
  "interviewQuestions": [
    {
      "question": "Your question here",
      "type": "Technical"
    },
    {
      "question": "Your question here",
      "type": "Behavioral"
    }
  ]
}

Valid question types: "Technical", "Behavioral", "Experience", "Problem Solving", "Leadership"

The goal is to create a structured, relevant, and time-optimized interview plan for a {{jobTitle}} role.
"#;

/// Placeholders: `{{conversation}}` (JSON transcript), `{{jsonOnly}}`.
pub const FEEDBACK_TEMPLATE: &str = r#"{{conversation}}
Based on this interview conversation between the assistant and the candidate,
give feedback on the candidate's interview. Rate technical skills, communication,
problem solving and experience out of 10. Also give a 3-line summary of the
interview and one line saying whether the candidate is recommended for hire, with a message.

{{jsonOnly}}

Expected JSON format:
{
  "feedback": {
    "rating": {
      "technicalSkills": 5,
      "communication": 6,
      "problemSolving": 4,
      "experience": 7
    },
    "summary": "<3 lines>",
    "recommendation": "Yes",
    "recommendationMsg": "<one line>"
  }
}
"#;
