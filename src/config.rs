//! Configuration types for a report checkup.
//!
//! Every knob lives in [`CheckupConfig`], built via [`CheckupConfigBuilder`].
//! One struct is easy to share between the analysis call and the chat
//! session and easy to log when comparing two runs.

use crate::error::FinHealthError;
use crate::locale::Locale;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::sync::Arc;

/// Default model when a provider is named without one.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Configuration for analysing a report and chatting about it.
///
/// # Example
/// ```rust
/// use edgequake_finhealth::{CheckupConfig, Locale};
///
/// let config = CheckupConfig::builder()
///     .locale(Locale::En)
///     .model("gemini-2.5-flash")
///     .analysis_temperature(0.4)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct CheckupConfig {
    /// LLM model identifier, e.g. "gemini-2.5-flash", "gpt-4.1-mini".
    /// If None, uses [`DEFAULT_MODEL`] for named providers and the provider
    /// default when auto-detected.
    pub model: Option<String>,

    /// LLM provider name (e.g. "gemini", "openai", "anthropic").
    /// If None along with `provider`, the provider is detected from the environment.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Language of the dashboard and of the model's answers. Default: zh.
    pub locale: Locale,

    /// Sampling temperature for the analysis call. Default: 0.4.
    ///
    /// Slightly above deterministic so the metaphors stay lively; the schema
    /// keeps the structure fixed regardless.
    pub analysis_temperature: f32,

    /// Sampling temperature for chat turns. Default: 0.7.
    pub chat_temperature: f32,

    /// Maximum tokens the model may generate per call. Default: 4096.
    pub max_tokens: usize,

    /// Per-call timeout in seconds. Default: None (wait indefinitely).
    pub api_timeout_secs: Option<u64>,

    /// Custom analysis instructions. If None, uses the built-in prompt.
    /// The language instruction and output schema are always appended.
    pub system_prompt: Option<String>,
}

impl Default for CheckupConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            locale: Locale::default(),
            analysis_temperature: 0.4,
            chat_temperature: 0.7,
            max_tokens: 4096,
            api_timeout_secs: None,
            system_prompt: None,
        }
    }
}

impl fmt::Debug for CheckupConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckupConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("locale", &self.locale)
            .field("analysis_temperature", &self.analysis_temperature)
            .field("chat_temperature", &self.chat_temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("system_prompt", &self.system_prompt.as_ref().map(|p| p.len()))
            .finish()
    }
}

impl CheckupConfig {
    /// Create a new builder for `CheckupConfig`.
    pub fn builder() -> CheckupConfigBuilder {
        CheckupConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`CheckupConfig`].
#[derive(Debug)]
pub struct CheckupConfigBuilder {
    config: CheckupConfig,
}

impl CheckupConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn locale(mut self, locale: Locale) -> Self {
        self.config.locale = locale;
        self
    }

    pub fn analysis_temperature(mut self, t: f32) -> Self {
        self.config.analysis_temperature = t;
        self
    }

    pub fn chat_temperature(mut self, t: f32) -> Self {
        self.config.chat_temperature = t;
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = Some(secs);
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<CheckupConfig, FinHealthError> {
        let c = &self.config;
        for (name, t) in [
            ("analysis temperature", c.analysis_temperature),
            ("chat temperature", c.chat_temperature),
        ] {
            if !(0.0..=2.0).contains(&t) {
                return Err(FinHealthError::InvalidConfig(format!(
                    "{name} must be 0.0–2.0, got {t}"
                )));
            }
        }
        if c.max_tokens == 0 {
            return Err(FinHealthError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.api_timeout_secs == Some(0) {
            return Err(FinHealthError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        if c.system_prompt.as_deref().is_some_and(|p| p.trim().is_empty()) {
            return Err(FinHealthError::InvalidConfig(
                "system prompt must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}
