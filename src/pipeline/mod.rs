//! Request stages for a report checkup.
//!
//! Each submodule does one job so it can be tested without the others.
//!
//! ## Data Flow
//!
//! ```text
//! intake ──▶ analysis ──▶ chat
//! (PDF→b64)  (schema JSON) (seeded session)
//! ```
//!
//! 1. [`intake`]: check the declared media type, read the file whole,
//!    base64-encode it
//! 2. [`analysis`]: one structured-output call that yields an
//!    [`crate::model::AnalysisResult`]
//! 3. [`chat`]: a [`chat::ChatSession`] seeded with the same document for
//!    follow-up questions

pub mod analysis;
pub mod chat;
pub mod intake;

#[cfg(test)]
pub(crate) mod testing;
