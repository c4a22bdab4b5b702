//! Conversation state threaded through the workflow.

use crate::message::Message;
use serde::{Deserialize, Serialize};

/// The state carried by a conversation thread.
///
/// Messages are kept in chronological order and only ever appended.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationState {
    #[serde(default)]
    messages: Vec<Message>,
}

impl ConversationState {
    /// Creates an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a state holding the given messages, oldest first.
    #[must_use]
    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    /// Returns the messages, oldest first.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Appends a message.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Appends all messages of `input` after the existing ones.
    pub fn merge(&mut self, input: ConversationState) {
        self.messages.extend(input.messages);
    }

    /// Returns the most recent message, if any.
    #[must_use]
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Returns the number of messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns true if there are no messages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl From<Message> for ConversationState {
    fn from(message: Message) -> Self {
        Self::from_messages(vec![message])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageRole;

    #[test]
    fn new_state_is_empty() {
        let state = ConversationState::new();
        assert!(state.is_empty());
        assert!(state.last_message().is_none());
    }

    #[test]
    fn merge_appends_in_order() {
        let mut state = ConversationState::from_messages(vec![
            Message::user("hi"),
            Message::assistant("Echo: hi"),
        ]);

        state.merge(ConversationState::from(Message::user("again")));

        assert_eq!(state.len(), 3);
        let last = state.last_message().expect("has messages");
        assert_eq!(last.role(), MessageRole::User);
        assert_eq!(last.content(), "again");
        assert_eq!(state.messages()[0].content(), "hi");
    }

    #[test]
    fn serializes_as_messages_array() {
        let state = ConversationState::from(Message::user("hello"));
        let json = serde_json::to_value(&state).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({"messages": [{"role": "user", "content": "hello"}]})
        );
    }

    #[test]
    fn missing_messages_field_deserializes_empty() {
        let state: ConversationState = serde_json::from_str("{}").expect("deserialize");
        assert!(state.is_empty());
    }
}
