//! Scripted provider for request-path tests.
//!
//! `edgequake_llm::MockProvider` only ever succeeds; this one can also fail
//! or hang so error mapping and timeouts can be exercised offline.

use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, LLMResponse, LlmError};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub(crate) enum Step {
    Reply(&'static str),
    Fail(&'static str),
    /// Never answers within a test's lifetime.
    Stall,
}

pub(crate) struct StubProvider {
    steps: Mutex<VecDeque<Step>>,
}

impl StubProvider {
    pub(crate) fn new(steps: impl IntoIterator<Item = Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into_iter().collect()),
        })
    }

    async fn next(&self) -> edgequake_llm::Result<LLMResponse> {
        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(Step::Reply(text)) => Ok(LLMResponse::new(text, "stub-model")),
            Some(Step::Fail(message)) => Err(LlmError::NetworkError(message.to_string())),
            Some(Step::Stall) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(LLMResponse::new("", "stub-model"))
            }
            None => Ok(LLMResponse::new("", "stub-model")),
        }
    }
}

#[async_trait]
impl LLMProvider for StubProvider {
    fn name(&self) -> &str {
        "stub"
    }

    fn model(&self) -> &str {
        "stub-model"
    }

    fn max_context_length(&self) -> usize {
        1_000_000
    }

    async fn complete(&self, _prompt: &str) -> edgequake_llm::Result<LLMResponse> {
        self.next().await
    }

    async fn complete_with_options(
        &self,
        _prompt: &str,
        _options: &CompletionOptions,
    ) -> edgequake_llm::Result<LLMResponse> {
        self.next().await
    }

    async fn chat(
        &self,
        _messages: &[ChatMessage],
        _options: Option<&CompletionOptions>,
    ) -> edgequake_llm::Result<LLMResponse> {
        self.next().await
    }
}
