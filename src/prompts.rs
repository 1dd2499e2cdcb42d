//! Prompts, persona text, and the analysis output schema.
//!
//! All model-facing text lives here so the request code in
//! [`crate::pipeline`] never needs editing when the wording changes, and
//! tests can inspect prompts without a provider.

use crate::locale::Locale;
use crate::model::HealthStatus;
use once_cell::sync::Lazy;
use serde_json::{json, Value};

/// Default analysis instructions.
///
/// Used when [`crate::config::CheckupConfig::system_prompt`] is `None`.
pub const DEFAULT_ANALYSIS_PROMPT: &str = r#"Please analyze this financial report (PDF).

Role: You are a "Cat Financial Doctor". You analyze companies like you check a cat's health.
Methodology: Analyze Balance Sheet, Income Statement, Cash Flow.

Task:
1. Determine overall health (Green/Yellow/Red light).
2. Extract 4-6 key financial indicators (metrics).
3. For each metric, provide:
   - The Professional Term.
   - A "Metaphor": Explain it in simple life terms (or cat terms) so a non-expert understands.
   - The Status (Good/Bad/Neutral)."#;

/// Closing rule appended after the schema.
const SCHEMA_RULES: &str = r#"OUTPUT FORMAT
- Output ONLY one JSON object that conforms exactly to the schema above
- Do NOT wrap it in ``` fences
- Do NOT add commentary before or after the JSON"#;

/// Fallback text when a chat reply comes back empty.
pub const EMPTY_REPLY_FALLBACK: &str = "Meow?";

/// The JSON schema the analysis reply must follow.
pub static ANALYSIS_SCHEMA: Lazy<Value> = Lazy::new(|| {
    let statuses: Vec<&str> = HealthStatus::REQUESTED.iter().map(|s| s.as_str()).collect();
    json!({
        "type": "object",
        "properties": {
            "status": {
                "type": "string",
                "enum": statuses,
                "description": "The overall health status of the company."
            },
            "summary": {
                "type": "string",
                "description": "A summary of the financial situation spoken by a wise cat expert. Use a cute, encouraging but professional tone."
            },
            "metrics": {
                "type": "array",
                "description": "List of 4-6 key financial areas analyzed.",
                "minItems": 4,
                "maxItems": 6,
                "items": {
                    "type": "object",
                    "properties": {
                        "category": { "type": "string", "description": "e.g., Profitability, Cash Flow, Solvency" },
                        "term": { "type": "string", "description": "The professional financial term (e.g., Current Ratio, Net Margin)." },
                        "value": { "type": "string", "description": "The approximate value or qualitative assessment found in the report." },
                        "status": { "type": "string", "enum": ["Good", "Bad", "Neutral"] },
                        "explanation": { "type": "string", "description": "Brief professional explanation." },
                        "metaphor": { "type": "string", "description": "A simple metaphor to explain this concept to a layperson (e.g., comparing cash flow to blood circulation or food reserves)." }
                    },
                    "required": ["category", "term", "value", "status", "explanation", "metaphor"]
                }
            }
        },
        "required": ["status", "summary", "metrics"]
    })
});

/// Language and tone directive for the analysis call.
pub fn language_instruction(locale: Locale) -> &'static str {
    match locale {
        Locale::Zh => "Language: Output strictly in Simplified Chinese (简体中文). Tone: You are 'Meow Expert', a cute, wise, and professional cat financial doctor.",
        Locale::En => "Language: Output strictly in English. Tone: You are 'Meow Expert', a cute, wise, and professional cat financial doctor.",
    }
}

/// Assemble the full analysis system message.
///
/// `instructions` is either [`DEFAULT_ANALYSIS_PROMPT`] or a caller override;
/// the language directive and schema are always added.
pub fn analysis_prompt(instructions: &str, locale: Locale) -> String {
    let schema = serde_json::to_string_pretty(&*ANALYSIS_SCHEMA).unwrap_or_default();
    format!(
        "{instructions}\n\n{}\n\nStrictly follow this JSON schema:\n{schema}\n\n{SCHEMA_RULES}",
        language_instruction(locale)
    )
}

/// Persona for the follow-up chat.
pub fn chat_persona(locale: Locale) -> &'static str {
    match locale {
        Locale::Zh => "你是一只叫'喵博士'的财务专家猫。你非常懂财务，但说话风趣可爱，喜欢用猫咪的比喻。请用简体中文回答用户关于财务报表的问题。",
        Locale::En => "You are 'Dr. Meow', a financial expert cat. You know finance deeply but speak in a cute, witty way, often using cat metaphors. Answer questions about the uploaded report.",
    }
}

/// Text of the synthetic user turn that hands the document over.
pub fn chat_handoff(locale: Locale) -> &'static str {
    match locale {
        Locale::Zh => "这是财务报告。我会问关于它的问题。",
        Locale::En => "Here is the financial report. I will ask questions about it.",
    }
}

/// Text of the synthetic assistant greeting that closes the seed history.
pub fn chat_greeting(locale: Locale) -> &'static str {
    match locale {
        Locale::Zh => "喵！收到报告了！本喵博士准备好了，你想问什么？ 😺",
        Locale::En => "Meow! Report received! Dr. Meow is ready. What do you want to ask? 😺",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_lists_only_requested_statuses() {
        let statuses = ANALYSIS_SCHEMA["properties"]["status"]["enum"]
            .as_array()
            .unwrap();
        assert_eq!(statuses.len(), 3);
        assert!(!statuses.iter().any(|s| s == "UNKNOWN"));
    }

    #[test]
    fn schema_requires_every_metric_field() {
        let required = ANALYSIS_SCHEMA["properties"]["metrics"]["items"]["required"]
            .as_array()
            .unwrap();
        assert_eq!(required.len(), 6);
    }

    #[test]
    fn analysis_prompt_carries_language_and_schema() {
        let p = analysis_prompt(DEFAULT_ANALYSIS_PROMPT, Locale::Zh);
        assert!(p.contains("Simplified Chinese"));
        assert!(p.contains("\"metaphor\""));
        assert!(p.starts_with("Please analyze"));

        let custom = analysis_prompt("Be terse.", Locale::En);
        assert!(custom.starts_with("Be terse."));
        assert!(custom.contains("strictly in English"));
    }

    #[test]
    fn chat_texts_follow_locale() {
        assert!(chat_persona(Locale::En).contains("Dr. Meow"));
        assert!(chat_persona(Locale::Zh).contains("喵博士"));
        assert_ne!(chat_greeting(Locale::En), chat_greeting(Locale::Zh));
    }
}
