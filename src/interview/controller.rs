//! Interview session state machine.
//!
//! ```text
//! NotStarted ─▶ AwaitingStart ─▶ WaitingForAnswer ◀─────────────┐
//!                   ▲   │              │   ▲                    │
//!                   └───┘ (failed)     ▼   │ (mic error)        │ next question /
//!                                   Recording                  │ submit failed
//!                                      │                        │
//!                                      ▼                        │
//!                                  Submitting ──────────────────┘
//!                                      │
//!                                      ▼
//!                                   Finished
//!
//! any non-terminal state ── EndEarlyConfirmed ──▶ Terminated
//! ```
//!
//! The controller never performs I/O itself apart from driving the capture
//! device. Backend work is requested through [`Command`]s; the results come back
//! as [`Event`]s.

use super::countdown::{format_mm_ss, Countdown, Tick};
use super::transcript::{AudioRef, TranscriptLog, Turn};
use super::{AnswerOutcome, Prompt, QuestionCatalog, QuestionId};
use crate::capture::{AudioCaptureDevice, AudioClip};
use crate::config::InterviewConfig;
use std::sync::Arc;

const START_FAILED_MESSAGE: &str =
    "Something went wrong while starting the interview. Press Enter to try again.";
const SUBMIT_FAILED_MESSAGE: &str =
    "Failed to submit your response. Press Enter to record your answer again.";
const TIME_UP_MESSAGE: &str = "Time is up for this question.";

/// Where the session is, with the active question carried by the states that have one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NotStarted,
    /// `pending` while the start request is in flight
    AwaitingStart { pending: bool },
    WaitingForAnswer { question: QuestionId },
    Recording { question: QuestionId },
    Submitting { question: QuestionId },
    Finished,
    /// Left early by the candidate
    Terminated,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Terminated)
    }

    pub fn status(&self) -> Status {
        match self {
            Self::NotStarted => Status::NotStarted,
            Self::AwaitingStart { .. } => Status::AwaitingStart,
            Self::WaitingForAnswer { .. } => Status::WaitingForAnswer,
            Self::Recording { .. } => Status::Recording,
            Self::Submitting { .. } => Status::Submitting,
            Self::Finished => Status::Finished,
            Self::Terminated => Status::Terminated,
        }
    }

    pub fn current_question(&self) -> CurrentQuestion {
        match self {
            Self::WaitingForAnswer { question }
            | Self::Recording { question }
            | Self::Submitting { question } => CurrentQuestion::Active(*question),
            _ => CurrentQuestion::None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    NotStarted,
    AwaitingStart,
    WaitingForAnswer,
    Recording,
    Submitting,
    Finished,
    Terminated,
}

impl Status {
    pub fn label(&self) -> &'static str {
        match self {
            Self::NotStarted => "Ready",
            Self::AwaitingStart => "Starting",
            Self::WaitingForAnswer => "Your turn",
            Self::Recording => "Recording",
            Self::Submitting => "Processing your response",
            Self::Finished => "Finished",
            Self::Terminated => "Ended",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrentQuestion {
    None,
    Active(QuestionId),
}

/// Everything that can happen to a session.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    QuestionsLoaded(QuestionCatalog),
    StartRequested,
    StartSucceeded(Prompt),
    StartFailed(String),
    RecordingRequested,
    RecordingStopped,
    AnswerAccepted(AnswerOutcome),
    AnswerRejected(String),
    TimerExpired,
    EndEarlyConfirmed,
}

impl Event {
    fn name(&self) -> &'static str {
        match self {
            Self::QuestionsLoaded(_) => "QuestionsLoaded",
            Self::StartRequested => "StartRequested",
            Self::StartSucceeded(_) => "StartSucceeded",
            Self::StartFailed(_) => "StartFailed",
            Self::RecordingRequested => "RecordingRequested",
            Self::RecordingStopped => "RecordingStopped",
            Self::AnswerAccepted(_) => "AnswerAccepted",
            Self::AnswerRejected(_) => "AnswerRejected",
            Self::TimerExpired => "TimerExpired",
            Self::EndEarlyConfirmed => "EndEarlyConfirmed",
        }
    }
}

/// A recorded answer ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerSubmission {
    pub interview_id: String,
    pub vacancy_id: i64,
    pub question: QuestionId,
    pub clip: Arc<AudioClip>,
}

/// Work the session loop must carry out on the controller's behalf.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    StartInterview { interview_id: String },
    SubmitAnswer(AnswerSubmission),
    PlayPrompt(AudioRef),
    Exit,
}

/// Behaviour knobs taken from the `[interview]` config section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerSettings {
    pub default_response_time_secs: u32,
    pub auto_submit_on_expiry: bool,
    pub autoplay_prompts: bool,
    pub thank_you_message: String,
}

impl From<&InterviewConfig> for ControllerSettings {
    fn from(config: &InterviewConfig) -> Self {
        Self {
            default_response_time_secs: config.default_response_time_secs,
            auto_submit_on_expiry: config.auto_submit_on_expiry,
            autoplay_prompts: config.autoplay_prompts,
            thank_you_message: config.thank_you_message.clone(),
        }
    }
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self::from(&InterviewConfig::default())
    }
}

pub struct InterviewController<D> {
    interview_id: String,
    vacancy_id: i64,
    state: SessionState,
    transcript: TranscriptLog,
    countdown: Countdown,
    device: D,
    catalog: QuestionCatalog,
    settings: ControllerSettings,
    total_questions: Option<u32>,
    answered: u32,
}

impl<D: AudioCaptureDevice> InterviewController<D> {
    pub fn new(
        interview_id: impl Into<String>,
        vacancy_id: i64,
        device: D,
        settings: ControllerSettings,
    ) -> Self {
        Self {
            interview_id: interview_id.into(),
            vacancy_id,
            state: SessionState::NotStarted,
            transcript: TranscriptLog::new(),
            countdown: Countdown::new(),
            device,
            catalog: QuestionCatalog::default(),
            settings,
            total_questions: None,
            answered: 0,
        }
    }

    /// Applies one event and returns the commands it triggers.
    pub fn handle(&mut self, event: Event) -> Vec<Command> {
        if self.state.is_terminal() {
            tracing::debug!("Ignoring {} after session ended", event.name());
            return Vec::new();
        }

        let before = self.state;
        let name = event.name();
        let commands = match event {
            Event::QuestionsLoaded(catalog) => {
                tracing::debug!("Loaded response times for {} questions", catalog.len());
                self.catalog = catalog;
                Vec::new()
            }
            Event::StartRequested => self.on_start_requested(),
            Event::StartSucceeded(prompt) => self.on_start_succeeded(prompt),
            Event::StartFailed(reason) => self.on_start_failed(&reason),
            Event::RecordingRequested => self.on_recording_requested(),
            Event::RecordingStopped => self.on_recording_stopped(),
            Event::AnswerAccepted(outcome) => self.on_answer_accepted(outcome),
            Event::AnswerRejected(reason) => self.on_answer_rejected(&reason),
            Event::TimerExpired => self.on_timer_expired(),
            Event::EndEarlyConfirmed => self.on_end_early(),
        };

        if before != self.state {
            tracing::debug!("{}: {:?} -> {:?}", name, before, self.state);
        }
        commands
    }

    /// Advances the countdown by one second, reporting expiry as an event.
    pub fn tick(&mut self) -> Vec<Command> {
        if self.state.is_terminal() {
            return Vec::new();
        }
        match self.countdown.tick() {
            Tick::Expired => self.handle(Event::TimerExpired),
            Tick::Idle | Tick::Running(_) => Vec::new(),
        }
    }

    fn on_start_requested(&mut self) -> Vec<Command> {
        match self.state {
            SessionState::NotStarted | SessionState::AwaitingStart { pending: false } => {
                tracing::info!("Starting interview {}", self.interview_id);
                self.state = SessionState::AwaitingStart { pending: true };
                vec![Command::StartInterview {
                    interview_id: self.interview_id.clone(),
                }]
            }
            _ => Vec::new(),
        }
    }

    fn on_start_succeeded(&mut self, prompt: Prompt) -> Vec<Command> {
        if self.state != (SessionState::AwaitingStart { pending: true }) {
            return Vec::new();
        }
        if prompt.total_questions.is_some() {
            self.total_questions = prompt.total_questions;
        }
        self.present_prompt(prompt)
    }

    fn on_start_failed(&mut self, reason: &str) -> Vec<Command> {
        if self.state != (SessionState::AwaitingStart { pending: true }) {
            return Vec::new();
        }
        tracing::warn!("Interview start failed: {}", reason);
        self.transcript.append(Turn::error(START_FAILED_MESSAGE));
        self.state = SessionState::AwaitingStart { pending: false };
        Vec::new()
    }

    fn on_recording_requested(&mut self) -> Vec<Command> {
        let SessionState::WaitingForAnswer { question } = self.state else {
            return Vec::new();
        };
        match self.device.start() {
            Ok(()) => {
                tracing::info!("Recording answer to question {}", question);
                self.state = SessionState::Recording { question };
            }
            Err(e) => {
                tracing::warn!("Could not start recording: {}", e);
                self.transcript.append(Turn::error(e.user_message()));
            }
        }
        Vec::new()
    }

    fn on_recording_stopped(&mut self) -> Vec<Command> {
        match self.state {
            SessionState::Recording { question } => self.finish_recording(question),
            _ => Vec::new(),
        }
    }

    fn finish_recording(&mut self, question: QuestionId) -> Vec<Command> {
        match self.device.stop() {
            Ok(clip) => {
                let clip = Arc::new(clip);
                let secs = clip.duration().as_secs_f64().round() as u32;
                self.transcript.append(Turn::candidate(
                    format!("Voice answer ({})", format_mm_ss(secs)),
                    Arc::clone(&clip),
                ));
                self.countdown.cancel();
                self.state = SessionState::Submitting { question };
                vec![Command::SubmitAnswer(AnswerSubmission {
                    interview_id: self.interview_id.clone(),
                    vacancy_id: self.vacancy_id,
                    question,
                    clip,
                })]
            }
            Err(e) => {
                tracing::warn!("Recording could not be finalized: {}", e);
                self.transcript.append(Turn::error(e.user_message()));
                self.state = SessionState::WaitingForAnswer { question };
                Vec::new()
            }
        }
    }

    fn on_answer_accepted(&mut self, outcome: AnswerOutcome) -> Vec<Command> {
        let SessionState::Submitting { question } = self.state else {
            return Vec::new();
        };
        self.answered += 1;
        match outcome {
            AnswerOutcome::Completed(result) => {
                tracing::info!(
                    "Interview {} finished after question {} ({} result fields)",
                    self.interview_id,
                    question,
                    result.len()
                );
                self.countdown.cancel();
                self.transcript
                    .append(Turn::interviewer(self.settings.thank_you_message.clone(), None));
                self.state = SessionState::Finished;
                Vec::new()
            }
            AnswerOutcome::Next(prompt) => self.present_prompt(prompt),
        }
    }

    fn on_answer_rejected(&mut self, reason: &str) -> Vec<Command> {
        let SessionState::Submitting { question } = self.state else {
            return Vec::new();
        };
        tracing::warn!("Answer to question {} was not accepted: {}", question, reason);
        self.transcript.append(Turn::error(SUBMIT_FAILED_MESSAGE));
        self.enter_question(question);
        Vec::new()
    }

    fn on_timer_expired(&mut self) -> Vec<Command> {
        match self.state {
            SessionState::WaitingForAnswer { question } => {
                tracing::info!("Response time for question {} ran out", question);
                self.transcript.append(Turn::notice(TIME_UP_MESSAGE));
                Vec::new()
            }
            SessionState::Recording { question } => {
                tracing::info!("Response time for question {} ran out while recording", question);
                if self.settings.auto_submit_on_expiry {
                    self.transcript
                        .append(Turn::notice(format!("{TIME_UP_MESSAGE} Submitting your answer.")));
                    self.finish_recording(question)
                } else {
                    self.transcript.append(Turn::notice(format!(
                        "{TIME_UP_MESSAGE} Please finish your answer."
                    )));
                    Vec::new()
                }
            }
            _ => Vec::new(),
        }
    }

    fn on_end_early(&mut self) -> Vec<Command> {
        tracing::info!("Interview {} ended early in {:?}", self.interview_id, self.state);
        self.countdown.cancel();
        if self.device.is_active() {
            if let Err(e) = self.device.stop() {
                tracing::debug!("Discarded in-progress recording: {}", e);
            }
        }
        self.state = SessionState::Terminated;
        vec![Command::Exit]
    }

    /// Shows an interviewer prompt and opens its question for answering.
    fn present_prompt(&mut self, prompt: Prompt) -> Vec<Command> {
        let mut commands = Vec::new();
        if self.settings.autoplay_prompts {
            if let Some(audio) = &prompt.audio {
                commands.push(Command::PlayPrompt(audio.clone()));
            }
        }
        self.transcript
            .append(Turn::interviewer(prompt.text, prompt.audio));
        self.enter_question(prompt.question);
        commands
    }

    fn enter_question(&mut self, question: QuestionId) {
        let seconds = self.catalog.allowance_secs(question).unwrap_or_else(|| {
            tracing::debug!(
                "No response time for question {}, using default of {}s",
                question,
                self.settings.default_response_time_secs
            );
            self.settings.default_response_time_secs
        });
        self.countdown.start(seconds);
        self.state = SessionState::WaitingForAnswer { question };
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn status(&self) -> Status {
        self.state.status()
    }

    pub fn current_question(&self) -> CurrentQuestion {
        self.state.current_question()
    }

    pub fn transcript(&self) -> &TranscriptLog {
        &self.transcript
    }

    pub fn countdown(&self) -> &Countdown {
        &self.countdown
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn interview_id(&self) -> &str {
        &self.interview_id
    }

    /// Questions answered so far and the total, when the backend reported one.
    pub fn progress(&self) -> (u32, Option<u32>) {
        (self.answered, self.total_questions)
    }

    pub fn can_begin(&self) -> bool {
        matches!(
            self.state,
            SessionState::NotStarted | SessionState::AwaitingStart { pending: false }
        )
    }

    pub fn can_record(&self) -> bool {
        matches!(self.state, SessionState::WaitingForAnswer { .. })
    }

    pub fn can_stop(&self) -> bool {
        matches!(self.state, SessionState::Recording { .. })
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}
