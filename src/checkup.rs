//! Top-level entry points and the provider-backed analyst.
//!
//! [`ReportAnalyst`] is the seam between the controller and the model: it
//! analyses a document and opens a chat about it. [`LlmAnalyst`] is the real
//! implementation over an `edgequake_llm` provider; tests substitute scripted
//! analysts so the controller can be exercised without a network.

use crate::config::{CheckupConfig, DEFAULT_MODEL};
use crate::error::{AnalysisError, FinHealthError};
use crate::locale::Locale;
use crate::model::{AnalysisResult, UploadedDocument};
use crate::pipeline::chat::{ChatSession, ProviderChatSession};
use crate::pipeline::{analysis, intake};
use async_trait::async_trait;
use edgequake_llm::{LLMProvider, ProviderFactory};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Analyses reports and opens grounded chat sessions.
#[async_trait]
pub trait ReportAnalyst: Send + Sync {
    /// Produce the structured checkup for `document`.
    async fn analyze(
        &self,
        document: &UploadedDocument,
        locale: Locale,
    ) -> Result<AnalysisResult, AnalysisError>;

    /// Open a chat session seeded with `document`.
    fn open_chat(&self, document: &UploadedDocument, locale: Locale) -> Box<dyn ChatSession>;
}

/// [`ReportAnalyst`] over an `edgequake_llm` provider.
pub struct LlmAnalyst {
    provider: Arc<dyn LLMProvider>,
    config: CheckupConfig,
}

impl LlmAnalyst {
    /// Wrap an already-resolved provider.
    pub fn new(provider: Arc<dyn LLMProvider>, config: CheckupConfig) -> Self {
        Self { provider, config }
    }

    /// Resolve the provider from `config` (see [`resolve_provider`]).
    pub fn from_config(config: CheckupConfig) -> Result<Self, FinHealthError> {
        let provider = resolve_provider(&config)?;
        Ok(Self::new(provider, config))
    }

    pub fn config(&self) -> &CheckupConfig {
        &self.config
    }

    fn config_for(&self, locale: Locale) -> CheckupConfig {
        CheckupConfig {
            locale,
            ..self.config.clone()
        }
    }
}

#[async_trait]
impl ReportAnalyst for LlmAnalyst {
    async fn analyze(
        &self,
        document: &UploadedDocument,
        locale: Locale,
    ) -> Result<AnalysisResult, AnalysisError> {
        analysis::analyze(&self.provider, document, &self.config_for(locale)).await
    }

    fn open_chat(&self, document: &UploadedDocument, locale: Locale) -> Box<dyn ChatSession> {
        Box::new(ProviderChatSession::open(
            Arc::clone(&self.provider),
            document,
            &self.config_for(locale),
        ))
    }
}

/// Read, validate, and analyse a report in one call.
///
/// This is the non-interactive entry point: no chat session is opened.
///
/// # Errors
/// - [`FinHealthError::Validation`]: the file is not an acceptable PDF
/// - [`FinHealthError::ProviderNotConfigured`]: no provider could be resolved
/// - [`FinHealthError::Analysis`]: the model call failed or replied badly
pub async fn analyze_report(
    path: impl AsRef<Path>,
    config: &CheckupConfig,
) -> Result<AnalysisResult, FinHealthError> {
    let path = path.as_ref();
    info!("Starting checkup: {}", path.display());

    // Intake first: a rejected file must never reach the provider.
    let document = intake::intake_file(path).await?;
    let provider = resolve_provider(config)?;
    let result = analysis::analyze(&provider, &document, config).await?;

    info!(
        "Checkup complete: {} with {} metrics",
        result.status.as_str(),
        result.metrics.len()
    );
    Ok(result)
}

/// Synchronous wrapper around [`analyze_report`].
///
/// Creates a temporary tokio runtime internally.
pub fn analyze_report_sync(
    path: impl AsRef<Path>,
    config: &CheckupConfig,
) -> Result<AnalysisResult, FinHealthError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| FinHealthError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(analyze_report(path, config))
}

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, FinHealthError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        FinHealthError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`): used as-is.
/// 2. **Named provider** (`config.provider_name`): created with
///    `config.model` or [`DEFAULT_MODEL`]; the API key comes from the
///    provider's usual environment variable.
/// 3. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`).
/// 4. **Gemini key** (`GEMINI_API_KEY`): preferred because Gemini reads
///    PDF attachments natively.
/// 5. **Full auto-detection** (`ProviderFactory::from_env`).
pub fn resolve_provider(config: &CheckupConfig) -> Result<Arc<dyn LLMProvider>, FinHealthError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
        debug!("Using named provider {} / {}", name, model);
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            debug!("Using provider from environment {} / {}", prov, model);
            return create_provider(&prov, &model);
        }
    }

    if let Ok(gemini_key) = std::env::var("GEMINI_API_KEY") {
        if !gemini_key.is_empty() {
            let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
            return create_provider("gemini", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| FinHealthError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set GEMINI_API_KEY, OPENAI_API_KEY, or ANTHROPIC_API_KEY, or pass --provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn non_pdf_fails_before_provider_resolution() {
        // No provider is configured; a PNG must still fail as a validation error.
        let mut tmp = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        tmp.write_all(b"\x89PNG\r\n\x1a\n").unwrap();
        let err = analyze_report(tmp.path(), &CheckupConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, FinHealthError::Validation(_)), "got {err:?}");
    }
}
