//! Plain-text rendering of a checkup.
//!
//! Produces what a terminal front-end shows: a traffic light for the overall
//! status, the localised status title, the summary, one card per metric, and
//! the chat transcript. Output carries no ANSI codes; colouring is left to
//! the binary.

use crate::locale::Locale;
use crate::model::{AnalysisResult, HealthStatus, MetricFinding, MetricStatus, Speaker, Transcript};
use std::fmt::Write as _;

/// The lamp lit for an overall status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lamp {
    Green,
    Yellow,
    Red,
    /// Nothing lit: the status was not recognised.
    Off,
}

impl Lamp {
    pub fn for_status(status: HealthStatus) -> Self {
        match status {
            HealthStatus::Healthy => Lamp::Green,
            HealthStatus::Caution => Lamp::Yellow,
            HealthStatus::Unhealthy => Lamp::Red,
            HealthStatus::Unknown => Lamp::Off,
        }
    }

    /// Three-lamp strip, red first, with the active lamp filled.
    pub fn strip(self) -> &'static str {
        match self {
            Lamp::Red => "[● ○ ○]",
            Lamp::Yellow => "[○ ● ○]",
            Lamp::Green => "[○ ○ ●]",
            Lamp::Off => "[○ ○ ○]",
        }
    }
}

/// Localised headline for an overall status.
pub fn status_title(status: HealthStatus, locale: Locale) -> &'static str {
    let s = locale.strings();
    match status {
        HealthStatus::Healthy => s.status_healthy,
        HealthStatus::Caution => s.status_caution,
        HealthStatus::Unhealthy => s.status_unhealthy,
        HealthStatus::Unknown => s.status_unknown,
    }
}

/// Marker shown next to a metric value.
pub fn metric_marker(status: MetricStatus) -> &'static str {
    match status {
        MetricStatus::Good => "▲",
        MetricStatus::Bad => "▼",
        MetricStatus::Neutral => "■",
    }
}

const CARD_RULE: &str = "────────────────────────────────────────";

/// One metric card.
pub fn render_card(metric: &MetricFinding, locale: Locale) -> String {
    let s = locale.strings();
    let mut out = String::new();
    let _ = writeln!(out, "┌{CARD_RULE}");
    let _ = writeln!(
        out,
        "│ {} {}  [{}]",
        metric_marker(metric.status),
        metric.term,
        metric.category
    );
    let _ = writeln!(out, "│ {}", metric.value);
    let _ = writeln!(out, "│ {}: {}", s.col_header_term, metric.explanation);
    let _ = writeln!(out, "│ {}: {}", s.col_header_meta, metric.metaphor);
    let _ = writeln!(out, "└{CARD_RULE}");
    out
}

/// Status header, summary, and every metric card, in reply order.
pub fn render_result(result: &AnalysisResult, locale: Locale) -> String {
    let s = locale.strings();
    let mut out = String::new();
    let _ = writeln!(out, "{}", s.analysis_complete);
    let _ = writeln!(
        out,
        "{}  {}",
        Lamp::for_status(result.status).strip(),
        status_title(result.status, locale)
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", result.summary);
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", s.key_indicators);
    for metric in &result.metrics {
        out.push_str(&render_card(metric, locale));
    }
    out
}

/// The chat panel: welcome banner while empty, otherwise every turn.
pub fn render_transcript(transcript: &Transcript, locale: Locale) -> String {
    let s = locale.strings();
    let mut out = String::new();
    if transcript.is_empty() {
        let _ = writeln!(out, "{}", s.chat_welcome);
        let _ = writeln!(out, "{}", s.chat_welcome_sub);
        return out;
    }
    for turn in transcript {
        match turn.speaker {
            Speaker::User => {
                for line in turn.text.lines() {
                    let _ = writeln!(out, "> {line}");
                }
            }
            Speaker::Assistant => {
                let _ = writeln!(out, "{}", assistant_label(locale));
                for line in turn.text.lines() {
                    let _ = writeln!(out, "  {line}");
                }
            }
        }
    }
    out
}

/// Header printed above each assistant reply.
pub fn assistant_label(locale: Locale) -> String {
    let s = locale.strings();
    format!("{} ({}):", s.app_name, s.ai_badge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ConversationTurn;

    fn metric(term: &str, status: MetricStatus) -> MetricFinding {
        MetricFinding {
            category: "Liquidity".into(),
            term: term.into(),
            value: "1.8".into(),
            status,
            explanation: "Short-term assets cover short-term debts.".into(),
            metaphor: "Plenty of kibble in the bowl.".into(),
        }
    }

    fn result(status: HealthStatus, n: usize) -> AnalysisResult {
        AnalysisResult {
            status,
            summary: "A sleek, well-fed company.".into(),
            metrics: (0..n)
                .map(|i| metric(&format!("Ratio {i}"), MetricStatus::Good))
                .collect(),
        }
    }

    #[test]
    fn healthy_result_lights_green_and_shows_five_cards() {
        let text = render_result(&result(HealthStatus::Healthy, 5), Locale::En);
        assert!(text.contains(Lamp::Green.strip()));
        assert!(text.contains("Purr-fectly Healthy!"));
        assert_eq!(text.matches('┌').count(), 5);
        assert!(text.contains("A sleek, well-fed company."));
    }

    #[test]
    fn unknown_status_renders_without_a_lamp() {
        let text = render_result(&result(HealthStatus::Unknown, 4), Locale::Zh);
        assert!(text.contains(Lamp::Off.strip()));
        assert!(text.contains(Locale::Zh.strings().status_unknown));
    }

    #[test]
    fn out_of_range_metric_counts_still_render() {
        let text = render_result(&result(HealthStatus::Caution, 0), Locale::En);
        assert_eq!(text.matches('┌').count(), 0);
        let text = render_result(&result(HealthStatus::Caution, 9), Locale::En);
        assert_eq!(text.matches('┌').count(), 9);
    }

    #[test]
    fn card_shows_both_explanations() {
        let card = render_card(&metric("Current Ratio", MetricStatus::Bad), Locale::En);
        assert!(card.contains("▼ Current Ratio"));
        assert!(card.contains("Short-term assets"));
        assert!(card.contains("kibble"));
    }

    #[test]
    fn transcript_welcome_then_turns() {
        let mut t = Transcript::default();
        assert!(render_transcript(&t, Locale::En).contains("studied the report"));

        t.push(ConversationTurn::user("Is debt high?"));
        t.push(ConversationTurn::assistant("No.\nIt is modest."));
        let text = render_transcript(&t, Locale::En);
        assert!(text.contains("> Is debt high?\n"));
        assert!(text.contains("Dr. Meow (AI Expert):"));
        assert!(text.contains("  It is modest."));
    }
}
