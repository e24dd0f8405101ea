//! The tutoring prompt used for every question

use crate::llm::ChatPromptTemplate;
use crate::llm::ChatRole;
use crate::llm::PromptTemplate;

/// Placeholder filled with retrieved chunk text
pub const CONTEXT_VARIABLE: &str = "context";
/// Placeholder filled with the user's question
pub const INPUT_VARIABLE: &str = "input";

/// System instructions for the educational assistant persona
pub const TEACHER_SYSTEM_CONTEXT: &str = r"You are an AI-powered teacher designed to provide clear, educational, and engaging answers to students' questions.
Your goal is to explain concepts concisely while ensuring understanding.
Encourage curiosity, provide examples when necessary, and simplify complex ideas without losing accuracy.

Keep your responses informative yet concise.
Avoid unnecessary details but provide depth where required.
Use simple language for younger students and adjust explanations based on the question's complexity.

{context}";

/// System message with `{context}` followed by a human message with `{input}`
#[must_use]
pub fn teacher_prompt() -> ChatPromptTemplate {
    ChatPromptTemplate::from_messages(vec![
        (ChatRole::System, PromptTemplate::new(TEACHER_SYSTEM_CONTEXT)),
        (ChatRole::User, PromptTemplate::new("{input}")),
    ])
}
