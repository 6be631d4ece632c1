//! Prompt templates for the two analysis passes

/// Placeholder used when the question could not be extracted
pub const MISSING_QUESTION: &str = "[Could not extract question text]";

/// First pass: question text only
pub const EXTRACT_QUESTION: &str = "Analyze the image and extract only the main multiple-choice \
question text. Output only the question text, without any preamble or explanation.";

/// Second pass: full analysis, with optional extra context
pub fn analysis_prompt(question: &str, context: &str) -> String {
    let context = if context.trim().is_empty() {
        "No additional context was provided."
    } else {
        context.trim()
    };

    format!(
        "You are analyzing the multiple-choice question in the provided image.\n\
The user-identified question text is approximately: '{question}'\n\
\n\
Use the following context to ensure factual accuracy:\n\
\n\
Context:\n\
---\n\
{context}\n\
---\n\
\n\
Based on the image and the provided context:\n\
1. First, identify and repeat the question from the image accurately.\n\
2. Next, list the answer options (A, B, C, D, etc.) exactly as they appear in the image.\n\
3. Then, identify the correct answer and explain why it's correct, referencing the context if relevant for factual claims.\n\
4. Finally, for each incorrect answer, explain why it's wrong, referencing the context if relevant.\n\
\n\
Format your response with clear headings for the Question, Options, Correct Answer, and explanations for why each other option is incorrect.\n\
Use markdown formatting with # for main headings (e.g., # Question, # Options, # Correct Answer, # Why other answers are incorrect).\n\
If the context seems irrelevant or clearly contradicts the image content, prioritize the image content but mention the discrepancy.\n"
    )
}

/// Strip whitespace and one pair of surrounding double quotes
pub fn clean_extracted_question(text: &str) -> String {
    let trimmed = text.trim();
    trimmed
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(trimmed)
        .to_string()
}
