//! Answer prompt template.
//!
//! Pure string assembly: no I/O, no clock, no randomness. The same inputs
//! always produce the same prompt.

use ragchat_config::PromptProfile;
use ragchat_core::message::Message;

use crate::text::render_history;

/// The exact reply the model is told to give when the documents don't answer the question.
pub const REFUSAL: &str = "I don't know the answer to that question.";

#[derive(Debug, Clone, Default)]
pub struct PromptComposer {
    profile: PromptProfile,
}

impl PromptComposer {
    pub fn new(profile: PromptProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &PromptProfile {
        &self.profile
    }

    /// Build the final prompt. Pass an empty `history` when chat history is disabled.
    pub fn compose(&self, question: &str, context: &str, history: &[Message]) -> String {
        let PromptProfile {
            assistant_description,
            corpus_name,
        } = &self.profile;
        let chat_history = render_history(history);

        format!(
            r#"
[INST]
# ROLE #
You are an expert AI assistant {assistant_description}

# TASK #
When a user asks a question, you will be provided with:
1. Relevant text from the *{corpus_name}* enclosed within <documents> and </documents> tags.
2. The user's chat history enclosed within <chat_history> and </chat_history> tags.

Your task is to:
- Use the provided context and chat history to generate a precise, complete, and relevant response to the user's question.
- Follow the rules and format outlined below.

# RULES #
1. **Context-Only Responses**: Use only the information provided in the <documents> tags to answer the question. Do not rely on prior knowledge or fabricate information.
2. **No References to Context or Chat History**: Do not explicitly mention "context" or "chat history" in your response.
3. **Citations**: Cite the document titles, page numbers, and sections used for your response under a **Sources** section.
   - Example: *Document Name, Page X (Section Y)*.
   - Only include sources if you can confidently answer the question.
4. **Unanswerable Questions**: If the context does not provide an answer, respond with: "{REFUSAL}"
5. **Response Style**:
   - Ensure clarity, coherence, and relevance.
   - Use bullet points or markdown formatting when appropriate.

# RESPONSE FORMAT #
Generate your response by following these steps:
1. Break down the user's question into smaller sub-questions or directives if necessary.
2. Identify and extract the most relevant information from the context for each sub-question/directive.
3. Draft a complete response using this information while avoiding redundancy or irrelevant details.
4. Refine your draft for accuracy, clarity, and relevance.

# OUTPUT REQUIREMENTS #
1. Provide a clear and concise answer to the user's question.
2. Include a **Sources** section (if applicable) listing all references used for your response.
3. End your response with three related follow-up questions under a **Additional Questions** section.

<chat_history>
{chat_history}
</chat_history>
<documents>
{context}
</documents>
<question>
{question}
</question>
[/INST]
Answer:
"#
        )
    }
}
