//! Small text transforms applied around model calls.

use ragchat_core::message::Message;

/// Escape `$` as `\$` so markdown renderers don't treat it as a math delimiter.
pub fn escape_dollars(text: &str) -> String {
    text.replace('$', "\\$")
}

/// Remove single quotes from a question before it reaches any prompt or query.
pub fn strip_single_quotes(question: &str) -> String {
    question.replace('\'', "")
}

/// Render messages one per line as `role: content`.
pub fn render_history(history: &[Message]) -> String {
    history
        .iter()
        .map(|m| format!("{}: {}", m.role(), m.content()))
        .collect::<Vec<_>>()
        .join("\n")
}
