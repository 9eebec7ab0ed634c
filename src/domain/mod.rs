use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Message history for one agent run.
///
/// The runner is the only owner. Every model reply and every tool result is
/// appended in call order; `reset` rebuilds the seed state (system prompt plus
/// the original query) after a credential rotation instead of patching the
/// partial history in place.
#[derive(Debug, Clone)]
pub struct Conversation {
    system_prompt: String,
    original_query: String,
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new(system_prompt: impl Into<String>, query: impl Into<String>) -> Self {
        let original_query = query.into();
        Self {
            system_prompt: system_prompt.into(),
            messages: vec![ChatMessage::new(MessageRole::User, original_query.clone())],
            original_query,
        }
    }

    /// Replay from the seed state. Prior exchanges are dropped on purpose.
    pub fn reset(&mut self) {
        self.messages = vec![ChatMessage::new(
            MessageRole::User,
            self.original_query.clone(),
        )];
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages
            .push(ChatMessage::new(MessageRole::Assistant, content));
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages
            .push(ChatMessage::new(MessageRole::User, content));
    }

    /// Full message list for the next model request, system prompt first.
    pub fn request_messages(&self) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(self.messages.len() + 1);
        if !self.system_prompt.trim().is_empty() {
            messages.push(ChatMessage::new(
                MessageRole::System,
                self.system_prompt.clone(),
            ));
        }
        messages.extend(self.messages.iter().cloned());
        messages
    }

    pub fn exchange_count(&self) -> usize {
        self.messages.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_with_original_query() {
        let conversation = Conversation::new("be terse", "list my files");
        let messages = conversation.request_messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::System);
        assert_eq!(messages[1].content, "list my files");
    }

    #[test]
    fn reset_drops_prior_exchanges() {
        let mut conversation = Conversation::new("be terse", "list my files");
        conversation.push_assistant("{\"step\":\"think\"}");
        conversation.push_user("");
        assert_eq!(conversation.exchange_count(), 3);

        conversation.reset();
        assert_eq!(conversation.exchange_count(), 1);
        let messages = conversation.request_messages();
        assert_eq!(messages.last().unwrap().content, "list my files");
    }

    #[test]
    fn omits_blank_system_prompt() {
        let conversation = Conversation::new("  ", "hello");
        let messages = conversation.request_messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, MessageRole::User);
    }
}
