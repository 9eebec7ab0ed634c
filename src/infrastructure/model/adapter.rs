//! Message adapter - conversation history to Gemini wire format

use crate::domain::{ChatMessage, MessageRole};
use serde_json::{Value, json};

/// Convert messages to the `generateContent` shape.
/// Returns `(system_instruction_text, contents)`.
pub fn to_gemini_format(messages: &[ChatMessage]) -> (Option<String>, Vec<Value>) {
    let mut system_parts = Vec::new();
    let mut contents = Vec::new();

    for message in messages {
        match message.role {
            MessageRole::System => system_parts.push(message.content.clone()),
            MessageRole::User => contents.push(json!({
                "role": "user",
                "parts": [{"text": message.content.clone()}]
            })),
            MessageRole::Assistant => contents.push(json!({
                "role": "model",
                "parts": [{"text": message.content.clone()}]
            })),
        }
    }

    let system_instruction = if system_parts.is_empty() {
        None
    } else {
        Some(system_parts.join("\n\n"))
    };

    (system_instruction, contents)
}
