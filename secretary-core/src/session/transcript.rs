//! Transcript data structures

use serde::{Deserialize, Serialize};
use std::fmt;

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A chat message. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    role: Role,
    content: String,
}

impl ChatMessage {
    /// Create a new chat message
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Ordered conversation history of a single session.
///
/// The first message is always the system message the transcript was
/// seeded with, and it is the only system message the transcript holds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
    generation: u64,
}

impl Transcript {
    /// Create a transcript seeded with a single system message
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::system(system_prompt)],
            generation: 0,
        }
    }

    pub(crate) fn with_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    /// Identifies this incarnation of the session. A session re-created after
    /// a reset gets a new generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Append a message to the end of the transcript.
    ///
    /// Returns the message back if it is a system message.
    pub fn push(&mut self, message: ChatMessage) -> Result<(), ChatMessage> {
        if message.role() == Role::System {
            return Err(message);
        }
        self.messages.push(message);
        Ok(())
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn system_message(&self) -> &ChatMessage {
        &self.messages[0]
    }

    /// Most recent message
    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Always false: the seed system message is never removed.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Messages to send to the model.
    ///
    /// With `max_messages` set, only the system message and the most recent
    /// `max_messages` conversational messages are returned.
    pub fn context(&self, max_messages: Option<usize>) -> Vec<ChatMessage> {
        let turns = &self.messages[1..];
        let start = match max_messages {
            Some(max) => turns.len().saturating_sub(max),
            None => 0,
        };

        let mut context = Vec::with_capacity(turns.len() - start + 1);
        context.push(self.system_message().clone());
        context.extend_from_slice(&turns[start..]);
        context
    }
}
