//! Append-only interview transcript.

use crate::capture::AudioClip;
use chrono::{DateTime, Local};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    Interviewer,
    Candidate,
}

/// Display hint for a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Emphasis {
    #[default]
    Normal,
    Notice,
    Error,
}

/// Playable audio attached to a turn.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioRef {
    /// Candidate recording held in memory
    Local(Arc<AudioClip>),
    /// Interviewer audio served by the backend
    Remote(String),
}

/// One message in the transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    speaker: Speaker,
    text: String,
    audio: Option<AudioRef>,
    emphasis: Emphasis,
    at: DateTime<Local>,
}

impl Turn {
    pub fn interviewer(text: impl Into<String>, audio: Option<AudioRef>) -> Self {
        Self::new(Speaker::Interviewer, text.into(), audio, Emphasis::Normal)
    }

    pub fn candidate(text: impl Into<String>, clip: Arc<AudioClip>) -> Self {
        Self::new(
            Speaker::Candidate,
            text.into(),
            Some(AudioRef::Local(clip)),
            Emphasis::Normal,
        )
    }

    /// Interviewer-side informational message, such as a timeout warning.
    pub fn notice(text: impl Into<String>) -> Self {
        Self::new(Speaker::Interviewer, text.into(), None, Emphasis::Notice)
    }

    /// Interviewer-side failure message.
    pub fn error(text: impl Into<String>) -> Self {
        Self::new(Speaker::Interviewer, text.into(), None, Emphasis::Error)
    }

    fn new(speaker: Speaker, text: String, audio: Option<AudioRef>, emphasis: Emphasis) -> Self {
        Self {
            speaker,
            text,
            audio,
            emphasis,
            at: Local::now(),
        }
    }

    pub fn speaker(&self) -> Speaker {
        self.speaker
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn audio(&self) -> Option<&AudioRef> {
        self.audio.as_ref()
    }

    pub fn emphasis(&self) -> Emphasis {
        self.emphasis
    }

    pub fn at(&self) -> DateTime<Local> {
        self.at
    }
}

/// Ordered record of every turn; entries are never changed or removed.
#[derive(Debug, Default, Clone)]
pub struct TranscriptLog {
    turns: Vec<Turn>,
}

impl TranscriptLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, turn: Turn) {
        tracing::debug!(
            speaker = ?turn.speaker,
            emphasis = ?turn.emphasis,
            has_audio = turn.audio.is_some(),
            "Transcript turn #{}",
            self.turns.len() + 1
        );
        self.turns.push(turn);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Turn> + '_ {
        self.turns.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Turn> {
        self.turns.get(index)
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

impl<'a> IntoIterator for &'a TranscriptLog {
    type Item = &'a Turn;
    type IntoIter = std::slice::Iter<'a, Turn>;

    fn into_iter(self) -> Self::IntoIter {
        self.turns.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_insertion_order_across_iterations() {
        let mut log = TranscriptLog::new();
        log.append(Turn::interviewer("Hello", None));
        log.append(Turn::error("Oops"));
        log.append(Turn::notice("Time is up"));

        let first: Vec<&str> = log.iter().map(Turn::text).collect();
        let second: Vec<&str> = (&log).into_iter().map(Turn::text).collect();
        assert_eq!(first, vec!["Hello", "Oops", "Time is up"]);
        assert_eq!(first, second);
        assert_eq!(log.len(), 3);
        assert_eq!(log.last().map(Turn::emphasis), Some(Emphasis::Notice));
    }

    #[test]
    fn candidate_turns_own_local_audio() {
        let clip = Arc::new(AudioClip::from_samples(&[1, 2, 3], 16000).unwrap());
        let turn = Turn::candidate("Voice answer", Arc::clone(&clip));

        assert_eq!(turn.speaker(), Speaker::Candidate);
        assert_eq!(turn.audio(), Some(&AudioRef::Local(clip)));
    }

    #[test]
    fn error_turns_are_interviewer_side() {
        let turn = Turn::error("Could not access your microphone");
        assert_eq!(turn.speaker(), Speaker::Interviewer);
        assert_eq!(turn.emphasis(), Emphasis::Error);
        assert!(turn.audio().is_none());
    }
}
