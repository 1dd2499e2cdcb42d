//! Checkup state machine and its async driver.
//!
//! [`CheckupState`] is plain, serialisable data mutated only by
//! [`CheckupState::apply`]. Each accepted [`Event`] may yield one [`Effect`]
//! describing work to start; the state itself never performs I/O.
//!
//! [`Controller`] owns a state, the live chat session, and an event channel.
//! It turns effects into spawned tasks, and those tasks report back by
//! sending completion events, which are applied one at a time in arrival
//! order. Nothing outside the controller mutates state.
//!
//! ```text
//!            file-selected                analysis-succeeded
//!   Idle ─────────────────▶ Analyzing ────────────────────▶ Ready { sending: false }
//!    ▲                         │                              │  ▲
//!    │      analysis-failed    │                 send-message │  │ message-succeeded
//!    └─────────────────────────┘                              ▼  │ message-failed
//!    ▲                                              Ready { sending: true }
//!    └──────────────── reset (from any phase) ────────────────────┘
//! ```
//!
//! Every session carries an epoch. Reset bumps it, so a completion that
//! arrives for a torn-down session is discarded instead of resurrecting it.
//! This covers intake too: a file read that finishes after a reset is dropped.

use crate::checkup::ReportAnalyst;
use crate::error::{AnalysisError, ChatTurnError, TransitionError, ValidationError};
use crate::locale::Locale;
use crate::model::{AnalysisResult, ConversationTurn, Transcript, UploadedDocument};
use crate::pipeline::chat::ChatSession;
use crate::pipeline::intake;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

/// Where the checkup currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// No document.
    Idle,
    /// Intake succeeded; the analysis call is in flight.
    Analyzing,
    /// Result shown, chat open. `sending` is true while a turn is in flight.
    Ready { sending: bool },
}

impl Phase {
    /// Whether the send control should be enabled.
    pub fn can_send(self) -> bool {
        matches!(self, Phase::Ready { sending: false })
    }

    /// Whether the file picker should be enabled.
    pub fn can_select_file(self) -> bool {
        !matches!(self, Phase::Analyzing)
    }
}

/// What kind of problem a notice reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeKind {
    /// The picked file is not a PDF; the user is re-prompted.
    InvalidFile,
    /// The picked file could not be read (missing, no permission, I/O).
    Unreadable,
    /// The analysis failed and the session was abandoned.
    AnalysisFailed,
}

/// A user-facing message the front-end shows once and then drains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    /// Localised text for the user.
    pub message: String,
    /// Technical detail for logs and verbose output.
    pub detail: String,
}

/// Everything that can happen to a checkup.
#[derive(Debug, Clone)]
pub enum Event {
    /// Intake accepted a document.
    FileSelected(UploadedDocument),
    /// Intake rejected the picked file.
    IntakeRejected(ValidationError),
    AnalysisSucceeded {
        epoch: u64,
        result: AnalysisResult,
    },
    AnalysisFailed {
        epoch: u64,
        error: AnalysisError,
    },
    /// The user submitted a question.
    SendMessage(String),
    MessageSucceeded {
        epoch: u64,
        text: String,
    },
    MessageFailed {
        epoch: u64,
        error: ChatTurnError,
    },
    /// Drop document, result, session, and transcript together.
    Reset,
    LocaleChanged(Locale),
}

/// Work the driver must start after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    StartAnalysis {
        epoch: u64,
        document: UploadedDocument,
        locale: Locale,
    },
    OpenChat {
        document: UploadedDocument,
        locale: Locale,
    },
    SendTurn {
        epoch: u64,
        message: String,
    },
    CloseChat,
}

/// The complete, serialisable state of one checkup front-end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckupState {
    locale: Locale,
    epoch: u64,
    phase: Phase,
    document: Option<UploadedDocument>,
    result: Option<AnalysisResult>,
    transcript: Transcript,
    notices: Vec<Notice>,
}

impl Default for CheckupState {
    fn default() -> Self {
        Self::new(Locale::default())
    }
}

impl CheckupState {
    pub fn new(locale: Locale) -> Self {
        Self {
            locale,
            epoch: 0,
            phase: Phase::Idle,
            document: None,
            result: None,
            transcript: Transcript::default(),
            notices: Vec::new(),
        }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn document(&self) -> Option<&UploadedDocument> {
        self.document.as_ref()
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// The turn the view should be scrolled to.
    pub fn latest_turn(&self) -> Option<&ConversationTurn> {
        self.transcript.last()
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Hand pending notices to the front-end; each is shown once.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Apply one event.
    ///
    /// Completions tagged with an old epoch are ignored (`Ok(None)`).
    pub fn apply(&mut self, event: Event) -> Result<Option<Effect>, TransitionError> {
        match event {
            Event::FileSelected(document) => self.on_file_selected(document),

            Event::IntakeRejected(error) => {
                let strings = self.locale.strings();
                let (kind, message) = if error.is_read_failure() {
                    (NoticeKind::Unreadable, strings.read_error)
                } else {
                    (NoticeKind::InvalidFile, strings.upload_error)
                };
                self.notices.push(Notice {
                    kind,
                    message: message.to_string(),
                    detail: error.to_string(),
                });
                Ok(None)
            }

            Event::AnalysisSucceeded { epoch, result } => {
                if self.is_stale(epoch) {
                    return Ok(None);
                }
                if self.phase != Phase::Analyzing {
                    return Err(TransitionError::NotAnalyzing { phase: self.phase });
                }
                let document = self.document.clone().ok_or(TransitionError::NotAnalyzing {
                    phase: self.phase,
                })?;
                self.result = Some(result);
                self.phase = Phase::Ready { sending: false };
                Ok(Some(Effect::OpenChat {
                    document,
                    locale: self.locale,
                }))
            }

            Event::AnalysisFailed { epoch, error } => {
                if self.is_stale(epoch) {
                    return Ok(None);
                }
                if self.phase != Phase::Analyzing {
                    return Err(TransitionError::NotAnalyzing { phase: self.phase });
                }
                let locale = self.locale;
                self.clear_session();
                self.notices.push(Notice {
                    kind: NoticeKind::AnalysisFailed,
                    message: locale.strings().alert_error.to_string(),
                    detail: error.to_string(),
                });
                Ok(Some(Effect::CloseChat))
            }

            Event::SendMessage(text) => {
                let text = text.trim();
                match self.phase {
                    Phase::Ready { sending: true } => Err(TransitionError::Busy),
                    Phase::Ready { sending: false } if text.is_empty() => Ok(None),
                    Phase::Ready { sending: false } => {
                        self.transcript.push(ConversationTurn::user(text));
                        self.phase = Phase::Ready { sending: true };
                        Ok(Some(Effect::SendTurn {
                            epoch: self.epoch,
                            message: text.to_string(),
                        }))
                    }
                    phase => Err(TransitionError::NotReady { phase }),
                }
            }

            Event::MessageSucceeded { epoch, text } => {
                self.finish_turn(epoch, ConversationTurn::assistant(text))
            }

            Event::MessageFailed { epoch, error } => {
                if !self.is_stale(epoch) {
                    debug!("Chat turn failed, showing fallback: {}", error);
                }
                let fallback = self.locale.strings().chat_error;
                self.finish_turn(epoch, ConversationTurn::assistant(fallback))
            }

            Event::Reset => {
                self.clear_session();
                Ok(Some(Effect::CloseChat))
            }

            Event::LocaleChanged(locale) => {
                self.locale = locale;
                Ok(None)
            }
        }
    }

    fn on_file_selected(
        &mut self,
        document: UploadedDocument,
    ) -> Result<Option<Effect>, TransitionError> {
        if self.phase == Phase::Analyzing {
            return Err(TransitionError::Busy);
        }
        // A new file replaces whatever session was live.
        self.clear_session();
        self.document = Some(document.clone());
        self.phase = Phase::Analyzing;
        Ok(Some(Effect::StartAnalysis {
            epoch: self.epoch,
            document,
            locale: self.locale,
        }))
    }

    fn finish_turn(
        &mut self,
        epoch: u64,
        turn: ConversationTurn,
    ) -> Result<Option<Effect>, TransitionError> {
        if self.is_stale(epoch) {
            return Ok(None);
        }
        if self.phase != (Phase::Ready { sending: true }) {
            return Err(TransitionError::NotSending);
        }
        self.transcript.push(turn);
        self.phase = Phase::Ready { sending: false };
        Ok(None)
    }

    fn is_stale(&self, epoch: u64) -> bool {
        if epoch != self.epoch {
            debug!("Discarding completion from epoch {} (now {})", epoch, self.epoch);
            true
        } else {
            false
        }
    }

    /// Replace document, result, transcript, and notices in one assignment.
    fn clear_session(&mut self) {
        let epoch = self.epoch + 1;
        *self = Self {
            epoch,
            ..Self::new(self.locale)
        };
    }
}

type SharedSession = Arc<Mutex<Box<dyn ChatSession>>>;

/// A task's result, tagged with the epoch the task was spawned in.
type Completion = (u64, Event);

/// Drives a [`CheckupState`] against a [`ReportAnalyst`].
pub struct Controller {
    analyst: Arc<dyn ReportAnalyst>,
    state: CheckupState,
    session: Option<SharedSession>,
    events_tx: mpsc::UnboundedSender<Completion>,
    events_rx: mpsc::UnboundedReceiver<Completion>,
    pending: usize,
}

impl Controller {
    pub fn new(analyst: Arc<dyn ReportAnalyst>, locale: Locale) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            analyst,
            state: CheckupState::new(locale),
            session: None,
            events_tx,
            events_rx,
            pending: 0,
        }
    }

    pub fn state(&self) -> &CheckupState {
        &self.state
    }

    /// Drain notices for display.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.state.take_notices()
    }

    /// Whether a chat session is currently open.
    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// Number of spawned tasks whose completion has not been applied yet.
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Start intake for `path`; the outcome arrives as an event.
    pub fn select_file(&mut self, path: impl Into<PathBuf>) -> Result<(), TransitionError> {
        if !self.state.phase().can_select_file() {
            return Err(TransitionError::Busy);
        }
        let path = path.into();
        let epoch = self.state.epoch();
        let tx = self.events_tx.clone();
        self.pending += 1;
        tokio::spawn(async move {
            let event = match intake::intake_file(&path).await {
                Ok(document) => Event::FileSelected(document),
                Err(error) => Event::IntakeRejected(error),
            };
            let _ = tx.send((epoch, event));
        });
        Ok(())
    }

    /// Submit a question. Rejected while a turn is in flight.
    pub fn send_message(&mut self, text: impl Into<String>) -> Result<(), TransitionError> {
        self.dispatch(Event::SendMessage(text.into()))
    }

    pub fn reset(&mut self) {
        // Reset is valid in every phase.
        let _ = self.dispatch(Event::Reset);
    }

    pub fn set_locale(&mut self, locale: Locale) {
        let _ = self.dispatch(Event::LocaleChanged(locale));
    }

    /// Apply an event and start whatever work it calls for.
    pub fn dispatch(&mut self, event: Event) -> Result<(), TransitionError> {
        let effect = self.state.apply(event)?;
        if let Some(effect) = effect {
            self.run(effect);
        }
        Ok(())
    }

    /// Wait for the next task completion and apply it.
    ///
    /// Returns the phase afterwards, or `None` when nothing is pending.
    pub async fn next_event(&mut self) -> Option<Phase> {
        if self.pending == 0 {
            return None;
        }
        let (epoch, event) = self.events_rx.recv().await?;
        self.pending -= 1;
        if epoch != self.state.epoch() {
            debug!("Dropping completion spawned in epoch {}", epoch);
            return Some(self.state.phase());
        }
        if let Err(e) = self.dispatch(event) {
            warn!("Completion rejected: {}", e);
        }
        Some(self.state.phase())
    }

    /// Apply completions until no spawned work remains.
    pub async fn settle(&mut self) -> Phase {
        while self.next_event().await.is_some() {}
        self.state.phase()
    }

    fn run(&mut self, effect: Effect) {
        match effect {
            Effect::StartAnalysis {
                epoch,
                document,
                locale,
            } => {
                info!("Analysis started for '{}'", document.name);
                // The previous document's chat goes with it.
                self.session = None;
                let analyst = Arc::clone(&self.analyst);
                let tx = self.events_tx.clone();
                self.pending += 1;
                tokio::spawn(async move {
                    let event = match analyst.analyze(&document, locale).await {
                        Ok(result) => Event::AnalysisSucceeded { epoch, result },
                        Err(error) => Event::AnalysisFailed { epoch, error },
                    };
                    let _ = tx.send((epoch, event));
                });
            }
            Effect::OpenChat { document, locale } => {
                self.session = Some(Arc::new(Mutex::new(
                    self.analyst.open_chat(&document, locale),
                )));
            }
            Effect::SendTurn { epoch, message } => {
                let tx = self.events_tx.clone();
                self.pending += 1;
                let Some(session) = self.session.clone() else {
                    // Ready without a session: fail the turn instead of hanging.
                    let event = Event::MessageFailed {
                        epoch,
                        error: ChatTurnError::Provider {
                            message: "no chat session".into(),
                        },
                    };
                    let _ = tx.send((epoch, event));
                    return;
                };
                tokio::spawn(async move {
                    let mut session = session.lock().await;
                    let event = match session.send(&message).await {
                        Ok(text) => Event::MessageSucceeded { epoch, text },
                        Err(error) => Event::MessageFailed { epoch, error },
                    };
                    let _ = tx.send((epoch, event));
                });
            }
            Effect::CloseChat => {
                self.session = None;
            }
        }
    }
}
