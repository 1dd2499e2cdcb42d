//! # edgequake-finhealth
//!
//! A financial-report "health checkup": hand over a PDF, get back a
//! traffic-light verdict with a handful of key indicators explained in
//! plain language, then ask follow-up questions about the same report.
//!
//! ## Flow
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Intake     media-type check, read whole file, base64
//!  ├─ 2. Analysis   one structured-output call → AnalysisResult
//!  ├─ 3. Dashboard  traffic light, summary, metric cards
//!  └─ 4. Chat       session seeded with the same document
//! ```
//!
//! The interactive flow is owned by [`Controller`], which drives an explicit
//! [`CheckupState`] machine. For a one-shot verdict without chat, call
//! [`analyze_report`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_finhealth::{analyze_report, CheckupConfig, Locale};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from GEMINI_API_KEY / OPENAI_API_KEY / ANTHROPIC_API_KEY
//!     let config = CheckupConfig::builder().locale(Locale::En).build()?;
//!     let result = analyze_report("annual-report.pdf", &config).await?;
//!     println!("{}: {}", result.status.as_str(), result.summary);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `finhealth` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-finhealth = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod checkup;
pub mod config;
pub mod controller;
pub mod dashboard;
pub mod error;
pub mod locale;
pub mod model;
pub mod pipeline;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use checkup::{analyze_report, analyze_report_sync, resolve_provider, LlmAnalyst, ReportAnalyst};
pub use config::{CheckupConfig, CheckupConfigBuilder, DEFAULT_MODEL};
pub use controller::{CheckupState, Controller, Effect, Event, Notice, NoticeKind, Phase};
pub use error::{AnalysisError, ChatTurnError, FinHealthError, TransitionError, ValidationError};
pub use locale::{Locale, Strings};
pub use model::{
    AnalysisResult, ConversationTurn, HealthStatus, MetricFinding, MetricStatus, Speaker,
    Transcript, UploadedDocument,
};
pub use pipeline::chat::{ChatSession, ProviderChatSession};
pub use pipeline::intake::{intake_bytes, intake_file};
