//! In-memory session store shared by all requests

use super::transcript::{ChatMessage, Role, Transcript};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Maps session ids to their transcripts.
///
/// Every operation takes the lock for the duration of a single map access,
/// so callers must never expect a transcript to stay unchanged between two
/// calls. Concurrent requests for the same session are not serialized.
///
/// Writes name the transcript generation they were based on. A write whose
/// generation no longer matches (the session was reset, and possibly
/// re-created, in between) is rejected.
#[derive(Debug)]
pub struct SessionStore {
    system_prompt: String,
    sessions: RwLock<HashMap<String, Transcript>>,
    next_generation: AtomicU64,
}

impl SessionStore {
    /// Create a store whose transcripts are seeded with `system_prompt`
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            sessions: RwLock::new(HashMap::new()),
            next_generation: AtomicU64::new(1),
        }
    }

    /// Get a snapshot of the session's transcript, creating it on first use
    pub fn get_or_create(&self, session_id: &str) -> Transcript {
        if let Some(transcript) = self.sessions.read().get(session_id) {
            return transcript.clone();
        }

        let mut sessions = self.sessions.write();
        sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
                debug!(session_id, generation, "Creating new session");
                Transcript::new(self.system_prompt.as_str()).with_generation(generation)
            })
            .clone()
    }

    /// Get a snapshot of the session's transcript if it exists
    pub fn get(&self, session_id: &str) -> Option<Transcript> {
        self.sessions.read().get(session_id).cloned()
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.read().contains_key(session_id)
    }

    /// Append a message to the given generation of a session
    pub fn append(
        &self,
        session_id: &str,
        generation: u64,
        message: ChatMessage,
    ) -> crate::Result<()> {
        self.with_current(session_id, generation, |transcript| push(transcript, message))
    }

    /// Append a user message and its reply as one contiguous pair
    pub fn append_turn(
        &self,
        session_id: &str,
        generation: u64,
        user: ChatMessage,
        assistant: ChatMessage,
    ) -> crate::Result<()> {
        if user.role() == Role::System || assistant.role() == Role::System {
            return Err(system_message_error());
        }
        self.with_current(session_id, generation, |transcript| {
            push(transcript, user)?;
            push(transcript, assistant)
        })
    }

    fn with_current<F>(&self, session_id: &str, generation: u64, f: F) -> crate::Result<()>
    where
        F: FnOnce(&mut Transcript) -> crate::Result<()>,
    {
        let mut sessions = self.sessions.write();
        match sessions.get_mut(session_id) {
            Some(transcript) if transcript.generation() == generation => f(transcript),
            Some(_) => Err(crate::Error::Session(format!(
                "session {} was reset",
                session_id
            ))),
            None => Err(crate::Error::Session(format!(
                "unknown session: {}",
                session_id
            ))),
        }
    }

    /// Drop the session's transcript.
    ///
    /// Resetting an unknown session is a no-op; the return value tells
    /// whether a transcript was removed.
    pub fn reset(&self, session_id: &str) -> bool {
        match self.sessions.write().remove(session_id) {
            Some(transcript) => {
                debug!(session_id, messages = transcript.len(), "Session removed");
                true
            }
            None => {
                debug!(session_id, "Reset of unknown session ignored");
                false
            }
        }
    }

    /// Number of live sessions
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    /// Ids of all live sessions, sorted
    pub fn session_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions.read().keys().cloned().collect();
        ids.sort();
        ids
    }
}

fn system_message_error() -> crate::Error {
    crate::Error::Session("system messages may only seed a transcript".to_string())
}

fn push(transcript: &mut Transcript, message: ChatMessage) -> crate::Result<()> {
    transcript.push(message).map_err(|_| system_message_error())
}
