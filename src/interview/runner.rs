//! Session loop: connects the controller to the terminal, the backend and the clock.
//!
//! Backend requests run as spawned tasks and report back over a channel, so the
//! UI keeps rendering while an answer uploads. Replies are applied in arrival
//! order; the controller ignores the ones that no longer fit its state.

use super::controller::{Command, Event, InterviewController};
use super::QuestionCatalog;
use crate::api::{ApiClient, ApiError};
use crate::capture::AudioCaptureDevice;
use crate::playback::Player;
use crate::ui::{InterviewTui, SessionView, UiAction};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const FRAME_INTERVAL: Duration = Duration::from_millis(50);
const METER_SAMPLES: usize = 4800;

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The backend reported the interview finished
    Completed,
    /// The candidate left before the end
    EndedEarly,
    /// The interview or vacancy does not exist
    NotFound(String),
}

/// Result of a backend task.
#[derive(Debug)]
enum BackendReply {
    Event(Event),
    /// Unrecoverable; the session cannot continue
    Fatal(String),
}

fn start_reply(result: Result<super::Prompt, ApiError>) -> BackendReply {
    match result {
        Ok(prompt) => BackendReply::Event(Event::StartSucceeded(prompt)),
        Err(e) if e.is_not_found() => BackendReply::Fatal(e.to_string()),
        Err(e) => BackendReply::Event(Event::StartFailed(e.to_string())),
    }
}

fn answer_reply(result: Result<super::AnswerOutcome, ApiError>) -> BackendReply {
    match result {
        Ok(outcome) => BackendReply::Event(Event::AnswerAccepted(outcome)),
        Err(e) => BackendReply::Event(Event::AnswerRejected(e.to_string())),
    }
}

/// Event for the primary key in the controller's current state.
fn primary_event<D: AudioCaptureDevice>(controller: &InterviewController<D>) -> Option<Event> {
    if controller.can_begin() {
        Some(Event::StartRequested)
    } else if controller.can_record() {
        Some(Event::RecordingRequested)
    } else if controller.can_stop() {
        Some(Event::RecordingStopped)
    } else {
        None
    }
}

/// Loads per-question allowances; a missing vacancy ends the session.
async fn load_catalog(api: &ApiClient, vacancy_id: i64) -> Result<QuestionCatalog, ApiError> {
    match api.questions(vacancy_id).await {
        Ok(questions) => Ok(QuestionCatalog::from_questions(&questions)),
        Err(e) if e.is_not_found() => Err(e),
        Err(e) => {
            tracing::warn!(
                "Could not load questions for vacancy {}, using default response time: {}",
                vacancy_id,
                e
            );
            Ok(QuestionCatalog::default())
        }
    }
}

pub struct SessionRunner<D> {
    controller: InterviewController<D>,
    api: ApiClient,
    vacancy_id: i64,
    reference_level_db: i8,
    player: Player,
    replies: mpsc::UnboundedSender<BackendReply>,
    inbox: mpsc::UnboundedReceiver<BackendReply>,
    in_flight: Vec<JoinHandle<()>>,
}

impl<D: AudioCaptureDevice> SessionRunner<D> {
    pub fn new(
        controller: InterviewController<D>,
        api: ApiClient,
        vacancy_id: i64,
        reference_level_db: i8,
    ) -> Self {
        let (replies, inbox) = mpsc::unbounded_channel();
        Self {
            controller,
            api,
            vacancy_id,
            reference_level_db,
            player: Player::new(),
            replies,
            inbox,
            in_flight: Vec::new(),
        }
    }

    /// Runs the interview until it finishes, is ended or turns out not to exist.
    ///
    /// SIGUSR1 acts like the primary key, so recording can be toggled from a
    /// global hotkey.
    pub async fn run(mut self) -> anyhow::Result<SessionOutcome> {
        tracing::info!(
            "=== Interview {} (vacancy {}) ===",
            self.controller.interview_id(),
            self.vacancy_id
        );

        match load_catalog(&self.api, self.vacancy_id).await {
            Ok(catalog) => {
                self.controller.handle(Event::QuestionsLoaded(catalog));
            }
            Err(e) => {
                tracing::error!("Vacancy {} not found: {}", self.vacancy_id, e);
                return Ok(SessionOutcome::NotFound(format!(
                    "Vacancy {} was not found.",
                    self.vacancy_id
                )));
            }
        }

        let trigger = Arc::new(AtomicBool::new(false));
        signal_hook::flag::register(signal_hook::consts::SIGUSR1, Arc::clone(&trigger))
            .map_err(|e| anyhow::anyhow!("Failed to register signal handler: {e}"))?;

        let mut tui = InterviewTui::new(self.reference_level_db)?;
        let outcome = self.event_loop(&mut tui, &trigger).await;

        for task in self.in_flight.drain(..) {
            task.abort();
        }
        self.player.stop_all();
        tui.cleanup()?;

        match &outcome {
            Ok(outcome) => tracing::info!("=== Interview session ended: {:?} ===", outcome),
            Err(e) => tracing::error!("Interview session failed: {}", e),
        }
        outcome
    }

    async fn event_loop(
        &mut self,
        tui: &mut InterviewTui,
        trigger: &AtomicBool,
    ) -> anyhow::Result<SessionOutcome> {
        let mut clock = tokio::time::interval(Duration::from_secs(1));
        clock.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        clock.tick().await;
        let mut frames = tokio::time::interval(FRAME_INTERVAL);

        loop {
            tokio::select! {
                _ = clock.tick() => {
                    let commands = self.controller.tick();
                    if self.dispatch(commands) {
                        return Ok(SessionOutcome::EndedEarly);
                    }
                }
                Some(reply) = self.inbox.recv() => match reply {
                    BackendReply::Fatal(message) => {
                        tracing::error!("Session cannot continue: {}", message);
                        return Ok(SessionOutcome::NotFound(message));
                    }
                    BackendReply::Event(event) => {
                        let commands = self.controller.handle(event);
                        if self.dispatch(commands) {
                            return Ok(SessionOutcome::EndedEarly);
                        }
                    }
                },
                _ = frames.tick() => {
                    if trigger.swap(false, Ordering::Relaxed) {
                        tracing::info!("Received SIGUSR1: toggling recording via external trigger");
                        if let Some(event) = primary_event(&self.controller) {
                            let commands = self.controller.handle(event);
                            if self.dispatch(commands) {
                                return Ok(SessionOutcome::EndedEarly);
                            }
                        }
                    }

                    let ended = self.controller.is_terminal();
                    let action = tui.poll_action(self.controller.transcript().len(), ended)?;
                    if let Some(outcome) = self.apply_action(action, tui.selected()) {
                        return Ok(outcome);
                    }

                    self.draw(tui)?;
                }
            }
        }
    }

    /// Handles a UI action; returns an outcome once the session should close.
    fn apply_action(&mut self, action: UiAction, selected: Option<usize>) -> Option<SessionOutcome> {
        let event = match action {
            UiAction::Primary => primary_event(&self.controller),
            UiAction::ConfirmEndEarly => Some(Event::EndEarlyConfirmed),
            UiAction::TogglePlayback => {
                self.toggle_playback(selected);
                None
            }
            UiAction::Close if self.controller.is_terminal() => {
                return Some(self.terminal_outcome());
            }
            _ => None,
        };

        let commands = self.controller.handle(event?);
        self.dispatch(commands).then_some(SessionOutcome::EndedEarly)
    }

    fn terminal_outcome(&self) -> SessionOutcome {
        if self.controller.status() == super::Status::Finished {
            SessionOutcome::Completed
        } else {
            SessionOutcome::EndedEarly
        }
    }

    fn toggle_playback(&mut self, selected: Option<usize>) {
        let Some(index) = selected else {
            return;
        };
        let Some(audio) = self
            .controller
            .transcript()
            .get(index)
            .and_then(|turn| turn.audio())
            .cloned()
        else {
            return;
        };
        if let Err(e) = self.player.toggle(index, &audio) {
            tracing::warn!("Playback failed: {}", e);
        }
    }

    /// Carries out controller commands; returns true on `Exit`.
    fn dispatch(&mut self, commands: Vec<Command>) -> bool {
        self.in_flight.retain(|task| !task.is_finished());

        let mut exit = false;
        for command in commands {
            match command {
                Command::StartInterview { interview_id } => {
                    let api = self.api.clone();
                    let replies = self.replies.clone();
                    self.in_flight.push(tokio::spawn(async move {
                        let reply = start_reply(api.start_interview(&interview_id).await);
                        let _ = replies.send(reply);
                    }));
                }
                Command::SubmitAnswer(submission) => {
                    tracing::info!(
                        "Submitting answer to question {} ({:.1}s)",
                        submission.question,
                        submission.clip.duration().as_secs_f32()
                    );
                    let api = self.api.clone();
                    let replies = self.replies.clone();
                    self.in_flight.push(tokio::spawn(async move {
                        let reply = answer_reply(api.submit_answer(&submission).await);
                        let _ = replies.send(reply);
                    }));
                }
                Command::PlayPrompt(audio) => {
                    let index = self.controller.transcript().len().saturating_sub(1);
                    if let Err(e) = self.player.play(index, &audio) {
                        tracing::warn!("Could not play interviewer audio: {}", e);
                    }
                }
                Command::Exit => exit = true,
            }
        }
        exit
    }

    fn draw(&mut self, tui: &mut InterviewTui) -> anyhow::Result<()> {
        let playing = self.player.playing();
        let samples = if self.controller.can_stop() {
            self.controller.device().recent_samples(METER_SAMPLES)
        } else {
            Vec::new()
        };
        let view = SessionView {
            status: self.controller.status(),
            can_begin: self.controller.can_begin(),
            countdown: self.controller.countdown(),
            transcript: self.controller.transcript(),
            progress: self.controller.progress(),
            samples: &samples,
            sample_rate: self.controller.device().sample_rate(),
            playing: &playing,
        };
        tui.render(&view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::testing::FakeDevice;
    use crate::interview::{AnswerOutcome, ControllerSettings, Prompt, QuestionId, Status};

    fn prompt() -> Prompt {
        Prompt {
            text: "Tell me about yourself".into(),
            question: QuestionId(1),
            total_questions: None,
            audio: None,
        }
    }

    #[test]
    fn start_not_found_is_fatal() {
        let reply = start_reply(Err(ApiError::NotFound("Interview".into())));
        assert!(matches!(reply, BackendReply::Fatal(message) if message.contains("Interview")));
    }

    #[test]
    fn start_failures_and_successes_become_events() {
        let failed = start_reply(Err(ApiError::Network("offline".into())));
        assert!(matches!(
            failed,
            BackendReply::Event(Event::StartFailed(message)) if message == "offline"
        ));

        let started = start_reply(Ok(prompt()));
        assert!(matches!(
            started,
            BackendReply::Event(Event::StartSucceeded(p)) if p.question == QuestionId(1)
        ));
    }

    #[test]
    fn malformed_answers_are_rejections() {
        let reply = answer_reply(Err(ApiError::Malformed("empty".into())));
        assert!(matches!(
            reply,
            BackendReply::Event(Event::AnswerRejected(_))
        ));

        let reply = answer_reply(Ok(AnswerOutcome::Next(prompt())));
        assert!(matches!(
            reply,
            BackendReply::Event(Event::AnswerAccepted(AnswerOutcome::Next(_)))
        ));
    }

    #[test]
    fn primary_key_follows_session_state() {
        let mut controller =
            InterviewController::new("abc123", 7, FakeDevice::default(), ControllerSettings::default());
        assert_eq!(primary_event(&controller), Some(Event::StartRequested));

        controller.handle(Event::StartRequested);
        assert_eq!(primary_event(&controller), None);

        controller.handle(Event::StartSucceeded(prompt()));
        assert_eq!(primary_event(&controller), Some(Event::RecordingRequested));

        controller.handle(Event::RecordingRequested);
        assert_eq!(primary_event(&controller), Some(Event::RecordingStopped));

        controller.handle(Event::RecordingStopped);
        assert_eq!(primary_event(&controller), None);
    }

    #[tokio::test]
    async fn interview_starts_only_on_primary_action() {
        let api = crate::api::testing::serve(axum::Router::new()).await;
        let controller =
            InterviewController::new("abc123", 7, FakeDevice::default(), ControllerSettings::default());
        let mut runner = SessionRunner::new(controller, api, 7, -20);

        assert_eq!(runner.controller.status(), Status::NotStarted);
        assert!(runner.controller.tick().is_empty());
        assert_eq!(runner.apply_action(UiAction::TogglePlayback, None), None);
        assert!(runner.in_flight.is_empty());

        assert_eq!(runner.apply_action(UiAction::Primary, None), None);
        assert_eq!(runner.controller.status(), Status::AwaitingStart);
        assert_eq!(runner.in_flight.len(), 1);

        assert_eq!(runner.apply_action(UiAction::Primary, None), None);
        assert_eq!(runner.in_flight.len(), 1);
    }

    #[tokio::test]
    async fn missing_vacancy_stops_before_the_loop() {
        let api = crate::api::testing::serve(axum::Router::new()).await;
        let err = load_catalog(&api, 42).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn unreachable_question_list_falls_back_to_defaults() {
        let router = axum::Router::new().route(
            "/api/vacancy/question/all/:vacancy_id",
            axum::routing::get(|| async { (axum::http::StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let api = crate::api::testing::serve(router).await;

        let catalog = load_catalog(&api, 42).await.unwrap();
        assert!(catalog.is_empty());
    }
}
