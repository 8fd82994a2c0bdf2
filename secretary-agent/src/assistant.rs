//! Assistant invoker: one chat turn against a session
//!
//! The assistant holds no conversational state of its own. Every turn reads
//! the session transcript from the [`SessionStore`], asks the provider for a
//! completion over the whole history, records the exchange and prices it.

use secretary_core::config::{AssistantConfig, HistoryConfig};
use secretary_core::{ChatMessage, PricingRegistry, SessionStore};
use secretary_providers::{LLMProvider, ProviderError, Usage};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::context::ContextBuilder;

/// The model every turn is sent to. Changing models means changing this.
pub const MODEL: &str = "gpt-4o-mini";

/// Errors that fail a chat turn
#[derive(Error, Debug)]
pub enum AssistantError {
    /// The completion call failed. It is not retried.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Result of one chat turn
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatOutcome {
    pub answer: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    /// Estimated cost in USD, unrounded
    pub cost_usd: f64,
}

/// Runs chat turns against the shared session store
pub struct Assistant {
    sessions: Arc<SessionStore>,
    provider: Arc<dyn LLMProvider>,
    pricing: PricingRegistry,
    context: ContextBuilder,
    keep_failed_turns: bool,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
}

impl Assistant {
    /// Create an assistant with the default price table, unbounded context
    /// and provider-default sampling parameters
    pub fn new(sessions: Arc<SessionStore>, provider: Arc<dyn LLMProvider>) -> Self {
        Self {
            sessions,
            provider,
            pricing: PricingRegistry::new(),
            context: ContextBuilder::new(),
            keep_failed_turns: false,
            max_tokens: None,
            temperature: None,
        }
    }

    pub fn with_history(mut self, history: &HistoryConfig) -> Self {
        self.context = ContextBuilder::with_window(history.max_context_messages);
        self.keep_failed_turns = history.keep_failed_turns;
        self
    }

    pub fn with_params(mut self, params: &AssistantConfig) -> Self {
        self.max_tokens = params.max_tokens;
        self.temperature = params.temperature;
        self
    }

    pub fn with_pricing(mut self, pricing: PricingRegistry) -> Self {
        self.pricing = pricing;
        self
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Run one chat turn for `session_id`.
    ///
    /// On success the user message and the reply are appended to the
    /// transcript as one contiguous pair. On provider failure the user
    /// message is dropped unless `keep_failed_turns` is set, in which case it
    /// stays in history without a reply.
    pub async fn handle(
        &self,
        session_id: &str,
        prompt: &str,
    ) -> Result<ChatOutcome, AssistantError> {
        let transcript = self.sessions.get_or_create(session_id);
        let generation = transcript.generation();
        let user_message = ChatMessage::user(prompt);
        let messages = self.context.build_messages(&transcript, &user_message);

        debug!(
            session_id,
            history = transcript.len(),
            sent = messages.len(),
            "Requesting completion"
        );

        let response = match self
            .provider
            .chat(messages, Some(MODEL.to_string()), self.max_tokens, self.temperature)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                error!(session_id, "Completion request failed: {}", e);
                if self.keep_failed_turns {
                    if let Err(append_err) =
                        self.sessions.append(session_id, generation, user_message)
                    {
                        warn!(session_id, "Could not keep failed turn: {}", append_err);
                    }
                }
                return Err(e.into());
            }
        };

        let answer = response.text().to_string();
        let Usage {
            input_tokens,
            output_tokens,
        } = response.usage;

        // A reset that lands while the completion is in flight wins: the
        // turn is answered but not recorded, even if the session has been
        // re-created since.
        if let Err(e) = self.sessions.append_turn(
            session_id,
            generation,
            user_message,
            ChatMessage::assistant(answer.clone()),
        ) {
            warn!(session_id, "Turn not recorded: {}", e);
        }

        let cost_usd = self.pricing.cost(MODEL, input_tokens, output_tokens);
        info!(
            session_id,
            input_tokens, output_tokens, cost_usd, "Chat turn completed"
        );

        Ok(ChatOutcome {
            answer,
            input_tokens,
            output_tokens,
            cost_usd,
        })
    }

    /// Forget a session's history. Unknown sessions are ignored.
    pub fn reset(&self, session_id: &str) -> bool {
        let removed = self.sessions.reset(session_id);
        info!(session_id, removed, "Session reset");
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SYSTEM_PROMPT;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use secretary_core::Role;
    use secretary_providers::{LLMResponse, Message, ProviderResult};
    use std::collections::VecDeque;

    /// Replays canned replies and records every request it receives
    #[derive(Default)]
    struct ScriptedProvider {
        replies: Mutex<VecDeque<ProviderResult<LLMResponse>>>,
        requests: Mutex<Vec<(Vec<Message>, Option<String>)>>,
    }

    impl ScriptedProvider {
        fn reply(self, text: &str, input_tokens: u64, output_tokens: u64) -> Self {
            self.replies.lock().push_back(Ok(LLMResponse {
                content: Some(text.to_string()),
                finish_reason: "stop".to_string(),
                usage: Usage::new(input_tokens, output_tokens),
            }));
            self
        }

        fn fail(self, message: &str) -> Self {
            self.replies
                .lock()
                .push_back(Err(ProviderError::ApiError(message.to_string())));
            self
        }

        fn requests(&self) -> Vec<(Vec<Message>, Option<String>)> {
            self.requests.lock().clone()
        }
    }

    #[async_trait]
    impl LLMProvider for ScriptedProvider {
        async fn chat(
            &self,
            messages: Vec<Message>,
            model: Option<String>,
            _max_tokens: Option<u32>,
            _temperature: Option<f32>,
        ) -> ProviderResult<LLMResponse> {
            self.requests.lock().push((messages, model));
            self.replies
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(ProviderError::InvalidResponse("script exhausted".into())))
        }

        fn get_default_model(&self) -> String {
            MODEL.to_string()
        }
    }

    fn assistant(provider: ScriptedProvider) -> (Assistant, Arc<ScriptedProvider>) {
        let provider = Arc::new(provider);
        let sessions = Arc::new(SessionStore::new(SYSTEM_PROMPT));
        (Assistant::new(sessions, provider.clone()), provider)
    }

    #[tokio::test]
    async fn test_single_turn_end_to_end() {
        let (assistant, provider) = assistant(ScriptedProvider::default().reply("hi there", 10, 5));

        let outcome = assistant.handle("s1", "hello").await.unwrap();

        assert_eq!(outcome.answer, "hi there");
        assert_eq!(outcome.input_tokens, 10);
        assert_eq!(outcome.output_tokens, 5);
        assert!((outcome.cost_usd - 0.0000045).abs() < 1e-12);

        let transcript = assistant.sessions().get("s1").unwrap();
        let roles: Vec<Role> = transcript.messages().iter().map(|m| m.role()).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant]);

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].1.as_deref(), Some(MODEL));

        assert!(assistant.reset("s1"));
        assert_eq!(assistant.sessions().get_or_create("s1").len(), 1);
    }

    #[tokio::test]
    async fn test_history_accumulates_across_turns() {
        let (assistant, provider) = assistant(
            ScriptedProvider::default()
                .reply("first answer", 20, 4)
                .reply("second answer", 40, 6),
        );

        assistant.handle("s1", "first question").await.unwrap();
        assert_eq!(assistant.sessions().get("s1").unwrap().len(), 3);
        assistant.handle("s1", "second question").await.unwrap();
        assert_eq!(assistant.sessions().get("s1").unwrap().len(), 5);

        let requests = provider.requests();
        assert_eq!(requests[0].0.len(), 2);
        assert_eq!(
            requests[1].0,
            vec![
                Message::system(SYSTEM_PROMPT),
                Message::user("first question"),
                Message::assistant("first answer"),
                Message::user("second question"),
            ]
        );
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let (assistant, provider) = assistant(
            ScriptedProvider::default()
                .reply("for alice", 1, 1)
                .reply("for bob", 1, 1),
        );

        assistant.handle("alice", "hi").await.unwrap();
        assistant.handle("bob", "hey").await.unwrap();

        assert_eq!(provider.requests()[1].0.len(), 2);
        assert_eq!(assistant.sessions().get("alice").unwrap().len(), 3);
        assert_eq!(assistant.sessions().get("bob").unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_failed_turn_is_discarded_by_default() {
        let (assistant, _) = assistant(
            ScriptedProvider::default()
                .fail("HTTP 500: upstream down")
                .reply("recovered", 3, 2),
        );

        let err = assistant.handle("s1", "hello").await.unwrap_err();
        assert!(matches!(err, AssistantError::Provider(ProviderError::ApiError(_))));
        assert!(err.to_string().contains("upstream down"));
        assert_eq!(assistant.sessions().get("s1").unwrap().len(), 1);

        assistant.handle("s1", "hello again").await.unwrap();
        let transcript = assistant.sessions().get("s1").unwrap();
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript.messages()[1].content(), "hello again");
    }

    #[tokio::test]
    async fn test_failed_turn_kept_when_configured() {
        let (assistant, provider) = assistant(
            ScriptedProvider::default()
                .fail("timeout")
                .reply("ok", 1, 1),
        );
        let assistant = assistant.with_history(&HistoryConfig {
            max_context_messages: None,
            keep_failed_turns: true,
        });

        assistant.handle("s1", "lost question").await.unwrap_err();
        let transcript = assistant.sessions().get("s1").unwrap();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.last().unwrap().role(), Role::User);

        assistant.handle("s1", "retry").await.unwrap();
        let second_request = &provider.requests()[1].0;
        assert_eq!(second_request[1], Message::user("lost question"));
        assert_eq!(second_request[2], Message::user("retry"));
    }

    #[tokio::test]
    async fn test_context_window_limits_request_not_history() {
        let mut script = ScriptedProvider::default();
        for i in 0..4 {
            script = script.reply(&format!("a{}", i), 1, 1);
        }
        let (assistant, provider) = assistant(script);
        let assistant = assistant.with_history(&HistoryConfig {
            max_context_messages: Some(2),
            keep_failed_turns: false,
        });

        for i in 0..4 {
            assistant.handle("s1", &format!("q{}", i)).await.unwrap();
        }

        let last_request = &provider.requests()[3].0;
        assert_eq!(
            last_request,
            &vec![
                Message::system(SYSTEM_PROMPT),
                Message::user("q2"),
                Message::assistant("a2"),
                Message::user("q3"),
            ]
        );
        assert_eq!(assistant.sessions().get("s1").unwrap().len(), 9);
    }

    #[tokio::test]
    async fn test_empty_prompt_and_missing_content() {
        let provider = ScriptedProvider::default();
        provider.replies.lock().push_back(Ok(LLMResponse {
            content: None,
            finish_reason: "length".to_string(),
            usage: Usage::new(7, 0),
        }));
        let (assistant, provider) = assistant(provider);

        let outcome = assistant.handle("default", "").await.unwrap();
        assert_eq!(outcome.answer, "");
        assert_eq!(provider.requests()[0].0[1], Message::user(""));
        assert_eq!(assistant.sessions().get("default").unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_unpriced_model_costs_nothing() {
        let (assistant, _) = assistant(ScriptedProvider::default().reply("x", 1_000, 1_000));
        let assistant = assistant.with_pricing(PricingRegistry::empty());

        let outcome = assistant.handle("s1", "hello").await.unwrap();
        assert_eq!(outcome.cost_usd, 0.0);
    }

    /// Resets and re-opens the session while its completion is in flight
    struct ResettingProvider {
        sessions: Arc<SessionStore>,
    }

    #[async_trait]
    impl LLMProvider for ResettingProvider {
        async fn chat(
            &self,
            _messages: Vec<Message>,
            _model: Option<String>,
            _max_tokens: Option<u32>,
            _temperature: Option<f32>,
        ) -> ProviderResult<LLMResponse> {
            self.sessions.reset("s1");
            self.sessions.get_or_create("s1");
            Ok(LLMResponse {
                content: Some("stale".to_string()),
                finish_reason: "stop".to_string(),
                usage: Usage::new(3, 1),
            })
        }

        fn get_default_model(&self) -> String {
            MODEL.to_string()
        }
    }

    #[tokio::test]
    async fn test_reset_during_turn_keeps_new_session_clean() {
        let sessions = Arc::new(SessionStore::new(SYSTEM_PROMPT));
        let provider = Arc::new(ResettingProvider {
            sessions: sessions.clone(),
        });
        let assistant = Assistant::new(sessions.clone(), provider);

        let outcome = assistant.handle("s1", "pre-reset question").await.unwrap();
        assert_eq!(outcome.answer, "stale");

        let transcript = sessions.get("s1").unwrap();
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.messages()[0].role(), Role::System);
    }

    #[tokio::test]
    async fn test_reset_unknown_session() {
        let (assistant, _) = assistant(ScriptedProvider::default());
        assert!(!assistant.reset("ghost"));
        assert!(!assistant.sessions().contains("ghost"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_sessions() {
        let mut script = ScriptedProvider::default();
        for _ in 0..16 {
            script = script.reply("ok", 1, 1);
        }
        let (assistant, _) = assistant(script);
        let assistant = Arc::new(assistant);

        let handles: Vec<_> = (0..16)
            .map(|n| {
                let assistant = Arc::clone(&assistant);
                tokio::spawn(async move {
                    assistant
                        .handle(&format!("session-{}", n % 4), "ping")
                        .await
                        .unwrap()
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        for n in 0..4 {
            let transcript = assistant.sessions().get(&format!("session-{}", n)).unwrap();
            assert_eq!(transcript.len(), 9);
            for pair in transcript.messages()[1..].chunks(2) {
                assert_eq!(pair[0].role(), Role::User);
                assert_eq!(pair[1].role(), Role::Assistant);
            }
        }
    }
}
