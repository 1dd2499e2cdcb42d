//! Data types shared by intake, analysis, chat, and the controller.
//!
//! Everything here is plain data: serialisable, cloneable, and free of any
//! provider handle. The opaque chat session lives in [`crate::pipeline::chat`].

use serde::{Deserialize, Deserializer, Serialize};
use std::ops::RangeInclusive;

/// Number of metrics the analysis prompt asks for. Requested, not enforced.
pub const REQUESTED_METRICS: RangeInclusive<usize> = 4..=6;

/// A validated report ready to be sent to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedDocument {
    /// Whole file, standard base64 with padding.
    pub content: String,
    /// Always `application/pdf` for documents produced by intake.
    pub mime_type: String,
    /// File name as selected by the user (no directories).
    pub name: String,
}

impl UploadedDocument {
    /// Size of the original file in bytes, derived from the base64 length.
    ///
    /// Never panics, even on hand-built content that is not valid base64.
    pub fn byte_len(&self) -> usize {
        let padding = self.content.bytes().rev().take_while(|&b| b == b'=').count();
        ((self.content.len() / 4) * 3).saturating_sub(padding.min(2))
    }
}

/// Overall verdict on the company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthStatus {
    Healthy,
    Caution,
    Unhealthy,
    /// Client-side fallback when the reply has no recognisable status.
    #[default]
    #[serde(other)]
    Unknown,
}

impl HealthStatus {
    /// The values the model is allowed to emit.
    pub const REQUESTED: [HealthStatus; 3] = [
        HealthStatus::Healthy,
        HealthStatus::Unhealthy,
        HealthStatus::Caution,
    ];

    /// Wire string, as used in the response schema.
    pub fn as_str(self) -> &'static str {
        match self {
            HealthStatus::Healthy => "HEALTHY",
            HealthStatus::Caution => "CAUTION",
            HealthStatus::Unhealthy => "UNHEALTHY",
            HealthStatus::Unknown => "UNKNOWN",
        }
    }

    /// Map a wire string to a status; anything unrecognised is `Unknown`.
    pub fn from_wire(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "HEALTHY" => HealthStatus::Healthy,
            "CAUTION" => HealthStatus::Caution,
            "UNHEALTHY" => HealthStatus::Unhealthy,
            _ => HealthStatus::Unknown,
        }
    }
}

/// Accepts a missing, `null`, or unrecognised status as [`HealthStatus::Unknown`].
fn lenient_status<'de, D>(deserializer: D) -> Result<HealthStatus, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().map(HealthStatus::from_wire).unwrap_or_default())
}

/// Verdict on a single indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricStatus {
    #[serde(alias = "good", alias = "GOOD")]
    Good,
    #[serde(alias = "bad", alias = "BAD")]
    Bad,
    #[serde(alias = "neutral", alias = "NEUTRAL")]
    Neutral,
}

/// One financial indicator extracted from the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricFinding {
    /// e.g. "Profitability", "Solvency".
    pub category: String,
    /// The professional term, e.g. "Current Ratio".
    pub term: String,
    /// Approximate value or qualitative assessment, e.g. "15%" or "High".
    pub value: String,
    pub status: MetricStatus,
    /// Brief professional explanation.
    pub explanation: String,
    /// Plain-language analogy for a non-expert.
    pub metaphor: String,
}

/// The structured checkup produced by one analysis call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default, deserialize_with = "lenient_status")]
    pub status: HealthStatus,
    pub summary: String,
    pub metrics: Vec<MetricFinding>,
}

impl AnalysisResult {
    /// Whether the metric count matches what the prompt asked for.
    pub fn within_requested_range(&self) -> bool {
        REQUESTED_METRICS.contains(&self.metrics.len())
    }
}

/// Who said a transcript line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

/// One line of the visible conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub speaker: Speaker,
    pub text: String,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Assistant,
            text: text.into(),
        }
    }
}

/// Append-only record of the visible conversation for one document.
///
/// Only the controller appends; turns are never edited or reordered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    turns: Vec<ConversationTurn>,
}

impl Transcript {
    pub(crate) fn push(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// The newest turn; the renderer keeps this one in view.
    pub fn last(&self) -> Option<&ConversationTurn> {
        self.turns.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ConversationTurn> {
        self.turns.iter()
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a ConversationTurn;
    type IntoIter = std::slice::Iter<'a, ConversationTurn>;

    fn into_iter(self) -> Self::IntoIter {
        self.turns.iter()
    }
}
