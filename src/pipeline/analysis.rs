//! Report analysis: one structured-output call per document.
//!
//! The request pairs a system message (instructions, persona, language, and
//! the JSON schema from [`crate::prompts`]) with a user message carrying the
//! PDF as an inline base64 attachment. The reply is deserialised straight
//! into [`AnalysisResult`]; the only cleanup is removing one outer code fence.
//!
//! There is no retry. A failed analysis ends the attempt and the caller
//! decides what to show.

use crate::config::CheckupConfig;
use crate::error::AnalysisError;
use crate::model::{AnalysisResult, UploadedDocument, REQUESTED_METRICS};
use crate::prompts::{analysis_prompt, DEFAULT_ANALYSIS_PROMPT};
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Analyse one report.
///
/// # Errors
/// - [`AnalysisError::Provider`]: the provider call failed
/// - [`AnalysisError::EmptyResponse`]: the reply carried no text
/// - [`AnalysisError::SchemaMismatch`]: the text is not an `AnalysisResult`
/// - [`AnalysisError::Timeout`]: `api_timeout_secs` expired
pub async fn analyze(
    provider: &Arc<dyn LLMProvider>,
    document: &UploadedDocument,
    config: &CheckupConfig,
) -> Result<AnalysisResult, AnalysisError> {
    let start = Instant::now();
    let messages = build_messages(document, config);
    let options = build_options(config);

    info!(
        "Analysing '{}' ({} bytes, locale {})",
        document.name,
        document.byte_len(),
        config.locale
    );

    let call = provider.chat(&messages, Some(&options));
    let outcome = match config.api_timeout_secs {
        Some(secs) => tokio::time::timeout(Duration::from_secs(secs), call)
            .await
            .map_err(|_| AnalysisError::Timeout { secs })?,
        None => call.await,
    };

    let response = outcome.map_err(|e| {
        warn!("Analysis of '{}' failed: {}", document.name, e);
        AnalysisError::Provider {
            message: e.to_string(),
        }
    })?;

    debug!(
        "Analysis: {} input tokens, {} output tokens, {:?}",
        response.prompt_tokens,
        response.completion_tokens,
        start.elapsed()
    );

    let result = parse_analysis(&response.content)?;
    if !result.within_requested_range() {
        warn!(
            "Model returned {} metrics (requested {}–{})",
            result.metrics.len(),
            REQUESTED_METRICS.start(),
            REQUESTED_METRICS.end()
        );
    }
    Ok(result)
}

/// Build the two-message analysis request.
pub fn build_messages(document: &UploadedDocument, config: &CheckupConfig) -> Vec<ChatMessage> {
    let instructions = config
        .system_prompt
        .as_deref()
        .unwrap_or(DEFAULT_ANALYSIS_PROMPT);

    vec![
        ChatMessage::system(analysis_prompt(instructions, config.locale)),
        ChatMessage::user_with_images(
            "Analyze the attached financial report and reply with the JSON object only.",
            vec![document_attachment(document)],
        ),
    ]
}

/// Wrap the document as an inline attachment.
pub(crate) fn document_attachment(document: &UploadedDocument) -> ImageData {
    ImageData::new(document.content.clone(), document.mime_type.as_str())
}

/// Build `CompletionOptions` for the analysis call.
fn build_options(config: &CheckupConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.analysis_temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

static RE_OUTER_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:json|JSON)?[ \t]*\r?\n(.*?)\r?\n```$").unwrap());

/// Deserialise reply text into an [`AnalysisResult`].
///
/// Empty or whitespace-only text is [`AnalysisError::EmptyResponse`]; any
/// shape mismatch is [`AnalysisError::SchemaMismatch`]. Never returns a
/// partially populated result.
pub fn parse_analysis(text: &str) -> Result<AnalysisResult, AnalysisError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(AnalysisError::EmptyResponse);
    }

    let body = RE_OUTER_FENCE
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(trimmed);

    serde_json::from_str(body).map_err(|e| AnalysisError::SchemaMismatch {
        detail: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{HealthStatus, MetricStatus};
    use crate::pipeline::testing::{Step, StubProvider};
    use edgequake_llm::MockProvider;

    fn doc() -> UploadedDocument {
        UploadedDocument {
            content: "JVBERi0xLjQ=".into(),
            mime_type: "application/pdf".into(),
            name: "report.pdf".into(),
        }
    }

    fn reply(status: &str, metrics: usize) -> String {
        let metrics: Vec<_> = (0..metrics)
            .map(|i| {
                serde_json::json!({
                    "category": "Solvency",
                    "term": format!("Metric {i}"),
                    "value": "1.8",
                    "status": "Neutral",
                    "explanation": "Within industry norms.",
                    "metaphor": "Enough kibble for the winter."
                })
            })
            .collect();
        serde_json::json!({ "status": status, "summary": "Purr.", "metrics": metrics }).to_string()
    }

    #[test]
    fn build_options_defaults() {
        let config = CheckupConfig::default();
        let opts = build_options(&config);
        assert_eq!(opts.temperature, Some(0.4));
        assert_eq!(opts.max_tokens, Some(4096));
    }

    #[test]
    fn request_has_system_and_document_turn() {
        let doc = UploadedDocument {
            content: "JVBERg==".into(),
            mime_type: "application/pdf".into(),
            name: "report.pdf".into(),
        };
        let messages = build_messages(&doc, &CheckupConfig::default());
        assert_eq!(messages.len(), 2);
    }

    #[test]
    fn well_formed_reply_parses() {
        for status in ["HEALTHY", "CAUTION", "UNHEALTHY"] {
            for n in REQUESTED_METRICS {
                let r = parse_analysis(&reply(status, n)).unwrap();
                assert!(HealthStatus::REQUESTED.contains(&r.status));
                assert_eq!(r.metrics.len(), n);
                assert!(r.within_requested_range());
                assert_eq!(r.metrics[0].status, MetricStatus::Neutral);
            }
        }
    }

    #[test]
    fn fenced_reply_parses() {
        let fenced = format!("```json\n{}\n```", reply("HEALTHY", 5));
        let r = parse_analysis(&fenced).unwrap();
        assert_eq!(r.status, HealthStatus::Healthy);
        assert_eq!(r.metrics.len(), 5);
    }

    #[test]
    fn empty_reply_is_an_error() {
        assert_eq!(parse_analysis(""), Err(AnalysisError::EmptyResponse));
        assert_eq!(parse_analysis("  \n\t"), Err(AnalysisError::EmptyResponse));
    }

    #[test]
    fn wrong_shape_is_an_error() {
        for bad in [
            "Meow! The company looks fine.",
            r#"{"status":"HEALTHY","summary":"ok"}"#,
            r#"{"status":"HEALTHY","summary":"ok","metrics":[{"term":"x"}]}"#,
            r#"{"status":"HEALTHY","summary":42,"metrics":[]}"#,
            r#"[1,2,3]"#,
        ] {
            assert!(
                matches!(parse_analysis(bad), Err(AnalysisError::SchemaMismatch { .. })),
                "accepted: {bad}"
            );
        }
    }

    #[test]
    fn prose_around_json_is_not_salvaged() {
        let text = format!("Here you go:\n{}", reply("HEALTHY", 4));
        assert!(matches!(
            parse_analysis(&text),
            Err(AnalysisError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn crlf_fenced_reply_parses() {
        let fenced = format!("```json\r\n{}\r\n```", reply("UNHEALTHY", 4));
        let r = parse_analysis(&fenced).unwrap();
        assert_eq!(r.status, HealthStatus::Unhealthy);
        assert_eq!(r.metrics.len(), 4);
    }

    #[tokio::test]
    async fn analyze_returns_parsed_reply() {
        let mock = MockProvider::new();
        mock.add_response(reply("CAUTION", 5)).await;
        let provider: Arc<dyn LLMProvider> = Arc::new(mock);

        let r = analyze(&provider, &doc(), &CheckupConfig::default())
            .await
            .unwrap();
        assert_eq!(r.status, HealthStatus::Caution);
        assert_eq!(r.metrics.len(), 5);
    }

    #[tokio::test]
    async fn analyze_empty_reply_is_an_error() {
        let mock = MockProvider::new();
        mock.add_response("").await;
        let provider: Arc<dyn LLMProvider> = Arc::new(mock);

        let err = analyze(&provider, &doc(), &CheckupConfig::default())
            .await
            .unwrap_err();
        assert_eq!(err, AnalysisError::EmptyResponse);
    }

    #[tokio::test]
    async fn analyze_maps_provider_failure() {
        let provider: Arc<dyn LLMProvider> = StubProvider::new([Step::Fail("connection refused")]);

        let err = analyze(&provider, &doc(), &CheckupConfig::default())
            .await
            .unwrap_err();
        match err {
            AnalysisError::Provider { message } => assert!(message.contains("connection refused")),
            other => panic!("expected Provider, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn analyze_times_out() {
        let provider: Arc<dyn LLMProvider> = StubProvider::new([Step::Stall]);
        let config = CheckupConfig::builder().api_timeout_secs(1).build().unwrap();

        let err = analyze(&provider, &doc(), &config).await.unwrap_err();
        assert_eq!(err, AnalysisError::Timeout { secs: 1 });
    }
}
