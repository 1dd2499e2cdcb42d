//! Follow-up chat grounded in the analysed report.
//!
//! A session is seeded once with the persona, a synthetic user turn that
//! attaches the document, and a synthetic assistant greeting. After that the
//! caller only ever sends plain questions; the session keeps its own hidden
//! history so later questions can refer to earlier answers.

use crate::config::CheckupConfig;
use crate::error::ChatTurnError;
use crate::locale::Locale;
use crate::model::UploadedDocument;
use crate::pipeline::analysis::document_attachment;
use crate::prompts::{chat_greeting, chat_handoff, chat_persona, EMPTY_REPLY_FALLBACK};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// A conversation bound to one document and one locale.
///
/// Callers may rely only on "it remembers prior turns"; how the history is
/// stored is up to the implementation.
#[async_trait]
pub trait ChatSession: Send {
    /// Ask one question and wait for the answer.
    ///
    /// A failed turn must leave the session usable for the next attempt.
    async fn send(&mut self, message: &str) -> Result<String, ChatTurnError>;
}

/// [`ChatSession`] backed by an [`LLMProvider`], resending its history on
/// every turn.
pub struct ProviderChatSession {
    provider: Arc<dyn LLMProvider>,
    history: Vec<ChatMessage>,
    options: CompletionOptions,
    timeout_secs: Option<u64>,
    turns: usize,
}

impl ProviderChatSession {
    /// Open a session seeded with `document` in the configured locale.
    pub fn open(
        provider: Arc<dyn LLMProvider>,
        document: &UploadedDocument,
        config: &CheckupConfig,
    ) -> Self {
        debug!("Opening chat session for '{}'", document.name);
        Self {
            provider,
            history: seed_history(document, config.locale),
            options: CompletionOptions {
                temperature: Some(config.chat_temperature),
                max_tokens: Some(config.max_tokens),
                ..Default::default()
            },
            timeout_secs: config.api_timeout_secs,
            turns: 0,
        }
    }

    /// Questions answered so far (seed turns excluded).
    pub fn turns(&self) -> usize {
        self.turns
    }
}

#[async_trait]
impl ChatSession for ProviderChatSession {
    async fn send(&mut self, message: &str) -> Result<String, ChatTurnError> {
        let start = Instant::now();
        let mut messages = self.history.clone();
        messages.push(ChatMessage::user(message));

        let call = self.provider.chat(&messages, Some(&self.options));
        let outcome = match self.timeout_secs {
            Some(secs) => tokio::time::timeout(Duration::from_secs(secs), call)
                .await
                .map_err(|_| ChatTurnError::Timeout { secs })?,
            None => call.await,
        };

        let response = outcome.map_err(|e| {
            warn!("Chat turn {} failed: {}", self.turns + 1, e);
            ChatTurnError::Provider {
                message: e.to_string(),
            }
        })?;

        let answer = reply_or_fallback(&response.content);
        self.turns += 1;
        debug!(
            "Chat turn {}: {} input tokens, {} output tokens, {:?}",
            self.turns,
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );

        self.history.push(ChatMessage::user(message));
        self.history.push(ChatMessage::assistant(answer.as_str()));
        Ok(answer)
    }
}

/// Persona, document hand-off, and greeting, in that order.
pub fn seed_history(document: &UploadedDocument, locale: Locale) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(chat_persona(locale)),
        ChatMessage::user_with_images(chat_handoff(locale), vec![document_attachment(document)]),
        ChatMessage::assistant(chat_greeting(locale)),
    ]
}

/// Empty replies count as success and become [`EMPTY_REPLY_FALLBACK`].
pub fn reply_or_fallback(content: &str) -> String {
    if content.trim().is_empty() {
        EMPTY_REPLY_FALLBACK.to_string()
    } else {
        content.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::testing::{Step, StubProvider};
    use edgequake_llm::MockProvider;

    fn doc() -> UploadedDocument {
        UploadedDocument {
            content: "JVBERi0xLjQ=".into(),
            mime_type: "application/pdf".into(),
            name: "report.pdf".into(),
        }
    }

    #[test]
    fn seed_has_three_turns() {
        assert_eq!(seed_history(&doc(), Locale::En).len(), 3);
        assert_eq!(seed_history(&doc(), Locale::Zh).len(), 3);
    }

    #[test]
    fn empty_reply_falls_back() {
        assert_eq!(reply_or_fallback(""), "Meow?");
        assert_eq!(reply_or_fallback(" \n"), "Meow?");
        assert_eq!(reply_or_fallback("Debt ratio is 40%."), "Debt ratio is 40%.");
    }

    #[tokio::test]
    async fn history_grows_per_turn_and_records_fallback() {
        let mock = MockProvider::new();
        mock.add_response("").await;
        mock.add_response("Debt is 40%.").await;
        let mut session = ProviderChatSession::open(Arc::new(mock), &doc(), &CheckupConfig::default());

        assert_eq!(session.send("Hello?").await.unwrap(), "Meow?");
        assert_eq!(session.send("Debt ratio?").await.unwrap(), "Debt is 40%.");
        assert_eq!(session.turns(), 2);
        assert_eq!(session.history.len(), 3 + 4);
        assert_eq!(session.history[3].content, "Hello?");
        assert_eq!(session.history[4].content, "Meow?");
        assert_eq!(session.history[6].content, "Debt is 40%.");
    }

    #[tokio::test]
    async fn failed_turn_leaves_history_untouched() {
        let provider = StubProvider::new([Step::Fail("503 unavailable"), Step::Reply("Fine now.")]);
        let mut session = ProviderChatSession::open(provider, &doc(), &CheckupConfig::default());

        let err = session.send("Cash flow?").await.unwrap_err();
        assert!(matches!(err, ChatTurnError::Provider { .. }));
        assert_eq!(session.turns(), 0);
        assert_eq!(session.history.len(), 3);

        assert_eq!(session.send("Cash flow?").await.unwrap(), "Fine now.");
        assert_eq!(session.turns(), 1);
        assert_eq!(session.history.len(), 5);
    }

    #[tokio::test]
    async fn stalled_turn_times_out() {
        let provider = StubProvider::new([Step::Stall]);
        let config = CheckupConfig::builder().api_timeout_secs(1).build().unwrap();
        let mut session = ProviderChatSession::open(provider, &doc(), &config);

        assert_eq!(
            session.send("Anyone there?").await,
            Err(ChatTurnError::Timeout { secs: 1 })
        );
        assert_eq!(session.history.len(), 3);
    }
}
