//! Terminal user interface for a running interview.
//!
//! Shows the transcript as a scrollable chat, a header with session status and
//! the per-question countdown, a live microphone level while recording and a
//! key help footer. Ending the interview early asks for confirmation in an
//! overlay.

use crate::interview::{Countdown, Emphasis, Speaker, Status, TranscriptLog, Turn};
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Padding, Paragraph, Sparkline},
};
use std::io::{self, Stdout};
use std::time::{Duration, Instant};

const BG: Color = Color::Rgb(0, 0, 0);
const FG: Color = Color::Rgb(255, 255, 255);
const ACCENT: Color = Color::Rgb(185, 207, 212);
const MUTED: Color = Color::Rgb(100, 100, 100);
const HIGHLIGHT_BG: Color = Color::Rgb(20, 20, 20);
const NOTICE_FG: Color = Color::Rgb(230, 190, 80);
const ERROR_FG: Color = Color::Rgb(255, 90, 90);

/// Countdown turns red below this many seconds.
const LOW_TIME_SECS: u32 = 30;

/// What a key press asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiAction {
    None,
    /// Enter or Space: begin, record, or stop and send, depending on state
    Primary,
    SelectPrevious,
    SelectNext,
    /// Play or stop the selected turn's audio
    TogglePlayback,
    /// Open the end-interview confirmation
    RequestEndEarly,
    ConfirmEndEarly,
    DismissConfirm,
    /// Leave a session that has already ended
    Close,
}

/// Maps a key press to an action.
///
/// `confirming` is true while the end-interview overlay is open; `ended` once the
/// session reached a terminal state.
pub fn map_key(key: KeyEvent, confirming: bool, ended: bool) -> UiAction {
    if key.kind != KeyEventKind::Press {
        return UiAction::None;
    }
    let ctrl_c = key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL);

    if confirming {
        return match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => UiAction::ConfirmEndEarly,
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc | KeyCode::Char('q') => {
                UiAction::DismissConfirm
            }
            _ if ctrl_c => UiAction::ConfirmEndEarly,
            _ => UiAction::None,
        };
    }

    match key.code {
        _ if ctrl_c && ended => UiAction::Close,
        _ if ctrl_c => UiAction::RequestEndEarly,
        KeyCode::Char('q') | KeyCode::Esc if ended => UiAction::Close,
        KeyCode::Char('q') | KeyCode::Esc => UiAction::RequestEndEarly,
        KeyCode::Enter if ended => UiAction::Close,
        KeyCode::Enter | KeyCode::Char(' ') => UiAction::Primary,
        KeyCode::Up | KeyCode::Char('k') => UiAction::SelectPrevious,
        KeyCode::Down | KeyCode::Char('j') => UiAction::SelectNext,
        KeyCode::Char('p') => UiAction::TogglePlayback,
        _ => UiAction::None,
    }
}

/// Snapshot of session state for one frame.
pub struct SessionView<'a> {
    pub status: Status,
    /// Start may be (re)tried
    pub can_begin: bool,
    pub countdown: &'a Countdown,
    pub transcript: &'a TranscriptLog,
    /// Answered questions and total, when known
    pub progress: (u32, Option<u32>),
    /// Recent microphone samples while recording
    pub samples: &'a [i16],
    pub sample_rate: u32,
    /// Transcript indices whose audio is playing
    pub playing: &'a [usize],
}

/// Scrolling level history with peak hold, as shown under the transcript.
struct LevelMeter {
    history: Vec<u64>,
    last_sample_time: Instant,
    sample_interval: Duration,
    peak_hold: u8,
    peak_hold_time: Instant,
    reference_level_db: i8,
}

impl LevelMeter {
    fn new(reference_level_db: i8) -> Self {
        let now = Instant::now();
        Self {
            history: Vec::new(),
            last_sample_time: now,
            sample_interval: Duration::from_millis(50),
            peak_hold: 0,
            peak_hold_time: now,
            reference_level_db,
        }
    }

    fn update(&mut self, samples: &[i16], sample_rate: u32, width: usize) -> u8 {
        let current = level_percent(samples, sample_rate, self.reference_level_db);

        if self.last_sample_time.elapsed() >= self.sample_interval {
            self.history.push(current as u64);
            self.last_sample_time = Instant::now();
        }
        if self.history.len() > width {
            let excess = self.history.len() - width;
            self.history.drain(..excess);
        }

        if current > self.peak_hold || self.peak_hold_time.elapsed().as_secs() >= 3 {
            self.peak_hold = current;
            self.peak_hold_time = Instant::now();
        }
        current
    }

    fn reset(&mut self) {
        self.history.clear();
        self.peak_hold = 0;
    }
}

/// Loudness of the last 50 ms of audio as 0-100%.
///
/// RMS is converted to dBFS and mapped onto a 40 dB window ending at
/// `reference_level_db`. Any non-empty input reads at least 4%.
pub fn level_percent(samples: &[i16], sample_rate: u32, reference_level_db: i8) -> u8 {
    if samples.is_empty() {
        return 0;
    }

    let window = ((sample_rate / 20) as usize).clamp(1, samples.len());
    let recent = &samples[samples.len() - window..];

    let sum_of_squares: i64 = recent.iter().map(|&x| (x as i64).pow(2)).sum();
    let mean_square = sum_of_squares / recent.len() as i64;
    let rms = (mean_square as f32).sqrt();

    let db_fs = if rms > 0.0 {
        20.0 * (rms / 32767.0).log10()
    } else {
        -160.0
    };

    let min_db = reference_level_db as f32 - 40.0;
    ((db_fs - min_db) / 40.0 * 100.0).clamp(4.0, 100.0) as u8
}

/// Greedy word wrap; words longer than `width` are split.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut line = String::new();
        let mut line_len = 0;
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > width {
                if line_len > 0 {
                    lines.push(std::mem::take(&mut line));
                    line_len = 0;
                }
                lines.push(word.drain(..width).collect());
            }
            let word_len = word.len();
            if word_len == 0 {
                continue;
            }
            if line_len > 0 && line_len + 1 + word_len > width {
                lines.push(std::mem::take(&mut line));
                line_len = 0;
            }
            if line_len > 0 {
                line.push(' ');
                line_len += 1;
            }
            line.extend(word);
            line_len += word_len;
        }
        lines.push(line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn key_help(view: &SessionView<'_>) -> &'static str {
    match view.status {
        Status::NotStarted => "Enter start · q quit",
        Status::AwaitingStart if view.can_begin => "Enter try again · q quit",
        Status::AwaitingStart => "Starting interview…",
        Status::WaitingForAnswer => "Enter record · ↑↓ select · p play · q end interview",
        Status::Recording => "Enter stop & send · ↑↓ select · p play · q end interview",
        Status::Submitting => "Processing your response… · q end interview",
        Status::Finished | Status::Terminated => "Enter close",
    }
}

fn turn_item(turn: &Turn, index: usize, width: usize, playing: bool) -> ListItem<'static> {
    let (label, label_style) = match turn.speaker() {
        Speaker::Interviewer => ("Interviewer", Style::default().fg(ACCENT).bold()),
        Speaker::Candidate => ("You", Style::default().fg(FG).bold()),
    };
    let text_style = match turn.emphasis() {
        Emphasis::Normal => Style::default().fg(FG),
        Emphasis::Notice => Style::default().fg(NOTICE_FG),
        Emphasis::Error => Style::default().fg(ERROR_FG),
    };

    let mut header = vec![
        Span::styled(label, label_style),
        Span::styled(
            format!("  {}", turn.at().format("%H:%M:%S")),
            Style::default().fg(MUTED),
        ),
    ];
    if turn.audio().is_some() {
        let marker = if playing { "  ■ playing" } else { "  ▶ audio" };
        header.push(Span::styled(marker, Style::default().fg(MUTED)));
    }

    let mut lines = vec![Line::from(header)];
    lines.extend(
        wrap_text(turn.text(), width.saturating_sub(2))
            .into_iter()
            .map(|l| Line::from(Span::styled(format!("  {l}"), text_style))),
    );
    if index > 0 {
        lines.insert(0, Line::raw(""));
    }
    ListItem::new(Text::from(lines))
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

/// Full-screen interview view.
pub struct InterviewTui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    list_state: ListState,
    /// Keep the newest turn selected as the transcript grows
    follow: bool,
    seen_turns: usize,
    confirming: bool,
    meter: LevelMeter,
    active: bool,
}

impl InterviewTui {
    /// Creates the view and enters alternate screen mode.
    ///
    /// # Errors
    /// - If raw mode cannot be enabled
    /// - If the terminal cannot be initialized
    pub fn new(reference_level_db: i8) -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(Self {
            terminal,
            list_state: ListState::default(),
            follow: true,
            seen_turns: 0,
            confirming: false,
            meter: LevelMeter::new(reference_level_db),
            active: true,
        })
    }

    /// Transcript index of the highlighted turn.
    pub fn selected(&self) -> Option<usize> {
        self.list_state.selected()
    }

    pub fn is_confirming(&self) -> bool {
        self.confirming
    }

    /// Reads at most one pending key without blocking.
    ///
    /// Selection and the confirmation overlay are handled here; the returned
    /// action is for the session loop.
    pub fn poll_action(&mut self, turns: usize, ended: bool) -> Result<UiAction> {
        if !event::poll(Duration::ZERO)? {
            return Ok(UiAction::None);
        }
        let Event::Key(key) = event::read()? else {
            return Ok(UiAction::None);
        };

        let action = map_key(key, self.confirming, ended);
        match action {
            UiAction::SelectPrevious => {
                let current = self.list_state.selected().unwrap_or(turns);
                if turns > 0 {
                    self.list_state.select(Some(current.saturating_sub(1)));
                    self.follow = false;
                }
            }
            UiAction::SelectNext => {
                if turns > 0 {
                    let next = self
                        .list_state
                        .selected()
                        .map_or(0, |i| (i + 1).min(turns - 1));
                    self.list_state.select(Some(next));
                    self.follow = next == turns - 1;
                }
            }
            UiAction::RequestEndEarly => {
                tracing::debug!("End interview requested, asking for confirmation");
                self.confirming = true;
            }
            UiAction::DismissConfirm | UiAction::ConfirmEndEarly => self.confirming = false,
            _ => {}
        }
        Ok(action)
    }

    /// Draws one frame.
    ///
    /// # Errors
    /// - If terminal rendering fails
    pub fn render(&mut self, view: &SessionView<'_>) -> Result<()> {
        let turns = view.transcript.len();
        if turns != self.seen_turns {
            if self.follow && turns > 0 {
                self.list_state.select(Some(turns - 1));
            }
            self.seen_turns = turns;
        }

        let recording = view.status == Status::Recording;
        let width = self.terminal.size()?.width as usize;
        let level = if recording {
            self.meter.update(view.samples, view.sample_rate, width)
        } else {
            self.meter.reset();
            0
        };

        let confirming = self.confirming;
        let meter = &self.meter;
        let list_state = &mut self.list_state;

        self.terminal.draw(|frame| {
            let area = frame.area();
            frame.render_widget(Block::default().style(Style::default().bg(BG)), area);

            let meter_height = if recording { 3 } else { 0 };
            let chunks = Layout::vertical([
                Constraint::Length(1),
                Constraint::Min(3),
                Constraint::Length(meter_height),
                Constraint::Length(1),
            ])
            .split(area);

            // Header: status, progress, countdown
            let status_span = if recording {
                Span::styled(
                    format!("● {} {level}%", view.status.label()),
                    Style::default().fg(Color::Red),
                )
            } else {
                Span::styled(view.status.label(), Style::default().fg(ACCENT))
            };
            let progress = match view.progress {
                (answered, Some(total)) => format!("  ·  answered {answered}/{total}"),
                (answered, None) if answered > 0 => format!("  ·  answered {answered}"),
                _ => String::new(),
            };
            let countdown_style = if !view.countdown.is_running() {
                Style::default().fg(MUTED)
            } else if view.countdown.remaining() <= LOW_TIME_SECS {
                Style::default().fg(Color::Red).bold()
            } else {
                Style::default().fg(FG).bold()
            };
            let header_chunks =
                Layout::horizontal([Constraint::Min(10), Constraint::Length(7)]).split(chunks[0]);
            frame.render_widget(
                Paragraph::new(Line::from(vec![
                    status_span,
                    Span::styled(progress, Style::default().fg(MUTED)),
                ])),
                header_chunks[0],
            );
            frame.render_widget(
                Paragraph::new(Span::styled(view.countdown.display(), countdown_style))
                    .alignment(Alignment::Right),
                header_chunks[1],
            );

            // Transcript
            let transcript_block = Block::default()
                .borders(Borders::TOP)
                .border_style(Style::default().fg(MUTED))
                .padding(Padding::horizontal(1));
            let inner_width = transcript_block.inner(chunks[1]).width as usize;
            let items: Vec<ListItem> = view
                .transcript
                .iter()
                .enumerate()
                .map(|(i, turn)| turn_item(turn, i, inner_width, view.playing.contains(&i)))
                .collect();
            let list = List::new(items)
                .block(transcript_block)
                .highlight_style(Style::default().bg(HIGHLIGHT_BG));
            frame.render_stateful_widget(list, chunks[1], list_state);

            if recording {
                let sparkline = Sparkline::default()
                    .data(&meter.history)
                    .max(100)
                    .style(Style::default().bg(BG).fg(ACCENT));
                frame.render_widget(sparkline, chunks[2]);
            }

            frame.render_widget(
                Paragraph::new(Span::styled(key_help(view), Style::default().fg(MUTED))),
                chunks[3],
            );

            if confirming {
                let dialog = centered(area, 44, 5);
                frame.render_widget(Clear, dialog);
                frame.render_widget(
                    Paragraph::new(vec![
                        Line::raw("End the interview now?"),
                        Line::styled("Your progress cannot be resumed.", Style::default().fg(MUTED)),
                        Line::styled("y end · n continue", Style::default().fg(ACCENT)),
                    ])
                    .alignment(Alignment::Center)
                    .block(
                        Block::default()
                            .borders(Borders::ALL)
                            .border_style(Style::default().fg(ERROR_FG))
                            .style(Style::default().bg(BG).fg(FG)),
                    ),
                    dialog,
                );
            }
        })?;

        Ok(())
    }

    /// Restores the terminal.
    ///
    /// # Errors
    /// - If terminal mode cannot be disabled
    /// - If cursor cannot be shown
    pub fn cleanup(&mut self) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for InterviewTui {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn enter_and_space_are_primary_while_active() {
        assert_eq!(map_key(press(KeyCode::Enter), false, false), UiAction::Primary);
        assert_eq!(map_key(press(KeyCode::Char(' ')), false, false), UiAction::Primary);
        assert_eq!(map_key(press(KeyCode::Enter), false, true), UiAction::Close);
    }

    #[test]
    fn quitting_asks_for_confirmation_first() {
        assert_eq!(
            map_key(press(KeyCode::Char('q')), false, false),
            UiAction::RequestEndEarly
        );
        assert_eq!(
            map_key(press(KeyCode::Char('y')), true, false),
            UiAction::ConfirmEndEarly
        );
        assert_eq!(map_key(press(KeyCode::Esc), true, false), UiAction::DismissConfirm);
        assert_eq!(map_key(press(KeyCode::Char('p')), true, false), UiAction::None);
        assert_eq!(map_key(press(KeyCode::Char('q')), false, true), UiAction::Close);
    }

    #[test]
    fn ctrl_c_requests_end_then_confirms() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(map_key(ctrl_c, false, false), UiAction::RequestEndEarly);
        assert_eq!(map_key(ctrl_c, true, false), UiAction::ConfirmEndEarly);
        assert_eq!(map_key(ctrl_c, false, true), UiAction::Close);
    }

    #[test]
    fn key_releases_are_ignored() {
        let mut release = press(KeyCode::Enter);
        release.kind = KeyEventKind::Release;
        assert_eq!(map_key(release, false, false), UiAction::None);
    }

    #[test]
    fn level_spans_reference_window() {
        assert_eq!(level_percent(&[], 16000, -20), 0);
        assert_eq!(level_percent(&[0; 800], 16000, -20), 4);
        assert_eq!(level_percent(&[i16::MAX; 800], 16000, -20), 100);

        // -20 dBFS sits at the top of the window when it is the reference
        let quiet = vec![3277i16; 800];
        assert!(level_percent(&quiet, 16000, -20) >= 99);
        assert!(level_percent(&quiet, 16000, -6) < 70);
    }

    #[test]
    fn level_uses_only_recent_window() {
        let mut samples = vec![i16::MAX; 16000];
        samples.extend(vec![0i16; 800]);
        assert_eq!(level_percent(&samples, 16000, -20), 4);
    }

    #[test]
    fn wraps_on_word_boundaries() {
        assert_eq!(
            wrap_text("Tell me about yourself", 10),
            vec!["Tell me", "about", "yourself"]
        );
        assert_eq!(wrap_text("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert_eq!(wrap_text("one\ntwo", 20), vec!["one", "two"]);
        assert_eq!(wrap_text("", 5), vec![""]);
    }

    #[test]
    fn help_tracks_session_status() {
        let countdown = Countdown::new();
        let transcript = TranscriptLog::new();
        let view = |status, can_begin| SessionView {
            status,
            can_begin,
            countdown: &countdown,
            transcript: &transcript,
            progress: (0, None),
            samples: &[],
            sample_rate: 16000,
            playing: &[],
        };

        assert!(key_help(&view(Status::AwaitingStart, true)).contains("try again"));
        assert!(key_help(&view(Status::Recording, false)).contains("stop & send"));
        assert_eq!(key_help(&view(Status::Finished, false)), "Enter close");
    }
}
