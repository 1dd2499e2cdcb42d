//! Display dictionaries and the locale toggle.
//!
//! The locale picks which fixed set of strings the dashboard shows and which
//! language instruction is sent to the model. It has no other effect, so it
//! is a plain lookup: [`Locale::strings`] returns a `'static` table.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The two supported display/answer languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// English.
    En,
    /// Simplified Chinese. (default)
    #[default]
    Zh,
}

impl Locale {
    /// The display dictionary for this locale.
    pub fn strings(self) -> &'static Strings {
        match self {
            Locale::En => &EN,
            Locale::Zh => &ZH,
        }
    }

    /// Short code used on the command line and in serialized state.
    pub fn code(self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Zh => "zh",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Locale::En),
            "zh" | "cn" | "chinese" | "中文" => Ok(Locale::Zh),
            other => Err(format!("unknown locale '{other}' (expected 'en' or 'zh')")),
        }
    }
}

/// Every user-facing string the front-end needs.
#[derive(Debug)]
pub struct Strings {
    pub app_name: &'static str,
    pub app_subtitle: &'static str,
    pub start_over: &'static str,
    pub hero_title: &'static str,
    pub hero_desc: &'static str,
    pub step_upload: &'static str,
    pub step_status: &'static str,
    pub step_ask: &'static str,
    pub analyzing_title: &'static str,
    pub analyzing_desc: &'static str,
    pub status_healthy: &'static str,
    pub status_unhealthy: &'static str,
    pub status_caution: &'static str,
    pub status_unknown: &'static str,
    pub analysis_complete: &'static str,
    pub key_indicators: &'static str,
    pub chat_header: &'static str,
    pub ai_badge: &'static str,
    pub chat_welcome: &'static str,
    pub chat_welcome_sub: &'static str,
    pub chat_error: &'static str,
    pub placeholder: &'static str,
    pub alert_error: &'static str,
    pub col_header_term: &'static str,
    pub col_header_meta: &'static str,
    pub upload_title: &'static str,
    pub upload_subtitle: &'static str,
    pub upload_error: &'static str,
    pub read_error: &'static str,
    pub thinking: &'static str,
    pub busy: &'static str,
}

static EN: Strings = Strings {
    app_name: "Dr. Meow",
    app_subtitle: "Financial Checkup",
    start_over: "Check Another",
    hero_title: "Is your company healthy?",
    hero_desc: "Dr. Meow will sniff out the risks! Upload your PDF financial report for a purr-fessional diagnosis.",
    step_upload: "Feed PDF",
    step_status: "Diagnosis",
    step_ask: "Ask Dr. Meow",
    analyzing_title: "Sniffing the numbers...",
    analyzing_desc: "Dr. Meow is checking the kibble reserves (Cash Flow) and mouse catch rate (Profit).",
    status_healthy: "Purr-fectly Healthy!",
    status_unhealthy: "Hisss! High Risk",
    status_caution: "Caution needed",
    status_unknown: "Meow? Unknown",
    analysis_complete: "Diagnosis Ready",
    key_indicators: "Dr. Meow's Key Findings",
    chat_header: "Chat with Dr. Meow",
    ai_badge: "AI Expert",
    chat_welcome: "Meow! I've studied the report.",
    chat_welcome_sub: "Ask me anything about the money situation!",
    chat_error: "Sorry, I got distracted by a laser pointer. Try again?",
    placeholder: "Ask about profit, debt, etc...",
    alert_error: "Hisss! I couldn't read that file. Try a cleaner PDF.",
    col_header_term: "Professional Term",
    col_header_meta: "Dr. Meow's Explanation",
    upload_title: "Feed Me Data!",
    upload_subtitle: "Give Dr. Meow the path to your PDF report",
    upload_error: "Only PDF files are tasty (supported)!",
    read_error: "Meow? I couldn't open that file. Check the path and try again.",
    thinking: "Dr. Meow is thinking...",
    busy: "Hold on, Dr. Meow is still answering the last question.",
};

static ZH: Strings = Strings {
    app_name: "喵博士",
    app_subtitle: "企业财务体检",
    start_over: "重新体检",
    hero_title: "你的企业健康吗？",
    hero_desc: "把财报交给喵博士！我会帮你嗅出风险，用猫咪都能听懂的话为你分析。",
    step_upload: "投喂财报",
    step_status: "获取诊断",
    step_ask: "咨询喵博士",
    analyzing_title: "正在嗅探数据...",
    analyzing_desc: "喵博士正在检查猫粮储备（现金流）和捕鼠效率（利润）...",
    status_healthy: "健康得像只小老虎！",
    status_unhealthy: "哈气！有危险",
    status_caution: "需要小心",
    status_unknown: "喵？未知状态",
    analysis_complete: "诊断报告",
    key_indicators: "喵博士的关键发现",
    chat_header: "咨询喵博士",
    ai_badge: "AI 专家",
    chat_welcome: "喵！报告看完了！",
    chat_welcome_sub: "关于钱的事，尽管问我！",
    chat_error: "抱歉，我刚刚去抓蝴蝶了。请再试一次？",
    placeholder: "输入您的问题...",
    alert_error: "嘶——！文件看不清，请换个清晰的 PDF 试试。",
    col_header_term: "专业指标",
    col_header_meta: "喵言喵语解读",
    upload_title: "投喂财报！",
    upload_subtitle: "把 PDF 路径交给喵博士，来帮你体检",
    upload_error: "喵？我只吃 PDF 文件哦！",
    read_error: "喵？打不开这个文件，请检查路径后再试。",
    thinking: "喵博士正在思考...",
    busy: "稍等，喵博士还在回答上一个问题。",
};
