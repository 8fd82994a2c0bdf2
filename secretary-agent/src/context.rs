//! Context builder for assembling completion requests

use secretary_core::{ChatMessage, Transcript};
use secretary_providers::Message;

/// Persona every new session transcript is seeded with
pub const SYSTEM_PROMPT: &str = "You are my personal AI secretary. Help me keep track of to-dos \
and reminders, look up information, and remember what we have talked about in this conversation.";

/// Builds the message list sent to the model
#[derive(Debug, Clone, Default)]
pub struct ContextBuilder {
    max_context_messages: Option<usize>,
}

impl ContextBuilder {
    /// Send the entire transcript on every turn
    pub fn new() -> Self {
        Self::default()
    }

    /// Send only the system message and the most recent `max` messages
    pub fn with_window(max: Option<usize>) -> Self {
        Self {
            max_context_messages: max,
        }
    }

    /// Build the complete message list for a completion call: the
    /// transcript (system message first) followed by the new user message
    pub fn build_messages(&self, transcript: &Transcript, current: &ChatMessage) -> Vec<Message> {
        let mut messages: Vec<Message> = transcript
            .context(self.max_context_messages)
            .iter()
            .map(Message::from)
            .collect();
        messages.push(Message::from(current));
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transcript_with_turns(turns: usize) -> Transcript {
        let mut transcript = Transcript::new(SYSTEM_PROMPT);
        for i in 0..turns {
            transcript.push(ChatMessage::user(format!("q{}", i))).unwrap();
            transcript
                .push(ChatMessage::assistant(format!("a{}", i)))
                .unwrap();
        }
        transcript
    }

    #[test]
    fn test_build_messages_sends_full_history() {
        let transcript = transcript_with_turns(2);
        let messages = ContextBuilder::new()
            .build_messages(&transcript, &ChatMessage::user("next"));

        assert_eq!(messages.len(), 6);
        assert_eq!(messages[0], Message::system(SYSTEM_PROMPT));
        assert_eq!(messages[1], Message::user("q0"));
        assert_eq!(messages[4], Message::assistant("a1"));
        assert_eq!(messages[5], Message::user("next"));
    }

    #[test]
    fn test_build_messages_with_window() {
        let transcript = transcript_with_turns(5);
        let messages = ContextBuilder::with_window(Some(2))
            .build_messages(&transcript, &ChatMessage::user("next"));

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1], Message::user("q4"));
        assert_eq!(messages[2], Message::assistant("a4"));
        assert_eq!(messages[3], Message::user("next"));
    }

    #[test]
    fn test_fresh_transcript_context() {
        let transcript = Transcript::new(SYSTEM_PROMPT);
        let messages = ContextBuilder::new().build_messages(&transcript, &ChatMessage::user(""));
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1], Message::user(""));
    }
}
