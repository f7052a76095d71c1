//! Voice interview session: transcript, countdown and the state machine that
//! drives them.
//!
//! [`controller::InterviewController`] is a synchronous transition function;
//! [`runner::SessionRunner`] owns the terminal, timer and network tasks and feeds
//! their results back in as events.

pub mod controller;
pub mod countdown;
pub mod runner;
pub mod transcript;

pub use controller::{
    AnswerSubmission, Command, ControllerSettings, CurrentQuestion, Event, InterviewController,
    SessionState, Status,
};
pub use countdown::{format_mm_ss, Countdown, Tick};
pub use runner::{SessionOutcome, SessionRunner};
pub use transcript::{AudioRef, Emphasis, Speaker, TranscriptLog, Turn};

use crate::api::Question;
use std::collections::HashMap;
use std::fmt;

/// Backend identifier of an interview question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QuestionId(pub i64);

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An interviewer message that opens (or continues with) a question.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub text: String,
    pub question: QuestionId,
    pub total_questions: Option<u32>,
    pub audio: Option<AudioRef>,
}

/// What the backend made of a submitted answer.
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerOutcome {
    /// Interview continues with another question
    Next(Prompt),
    /// Interview finished; carries the backend's result object
    Completed(serde_json::Map<String, serde_json::Value>),
}

/// Response-time allowances by question, in seconds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionCatalog {
    allowances: HashMap<QuestionId, u32>,
}

impl QuestionCatalog {
    /// Builds the catalog from the vacancy's question list.
    ///
    /// The backend reports `response_time` in minutes.
    pub fn from_questions(questions: &[Question]) -> Self {
        let allowances = questions
            .iter()
            .filter_map(|q| {
                let minutes = q.response_time?;
                (minutes > 0.0).then(|| (QuestionId(q.id), (minutes * 60.0).round() as u32))
            })
            .collect();
        Self { allowances }
    }

    pub fn allowance_secs(&self, question: QuestionId) -> Option<u32> {
        self.allowances.get(&question).copied()
    }

    pub fn len(&self) -> usize {
        self.allowances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allowances.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: i64, response_time: Option<f64>) -> Question {
        Question {
            id,
            question: format!("Question {id}"),
            question_type: None,
            weight: None,
            hint_for_evaluation: None,
            response_time,
        }
    }

    #[test]
    fn catalog_converts_minutes_to_seconds() {
        let catalog = QuestionCatalog::from_questions(&[
            question(1, Some(2.0)),
            question(2, Some(1.5)),
            question(3, None),
            question(4, Some(0.0)),
        ]);

        assert_eq!(catalog.allowance_secs(QuestionId(1)), Some(120));
        assert_eq!(catalog.allowance_secs(QuestionId(2)), Some(90));
        assert_eq!(catalog.allowance_secs(QuestionId(3)), None);
        assert_eq!(catalog.allowance_secs(QuestionId(4)), None);
        assert_eq!(catalog.len(), 2);
    }
}
