//! Full-screen error display for failures that end the session before or
//! instead of the interview loop.

use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Paragraph, Wrap},
};
use std::io::{self, Stdout};
use std::time::Duration;

const ERROR_BG: Color = Color::Rgb(160, 20, 20);
const ERROR_FG: Color = Color::Rgb(255, 255, 255);
const HINT_FG: Color = Color::Rgb(240, 190, 190);

/// Red screen with a title, a wrapped message and a dismiss hint.
pub struct ErrorScreen {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    active: bool,
}

impl ErrorScreen {
    /// Enters alternate screen mode.
    ///
    /// # Errors
    /// - If raw mode cannot be enabled
    /// - If the terminal cannot be initialized
    pub fn new() -> anyhow::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(Self {
            terminal,
            active: true,
        })
    }

    /// Shows `message` under `title` until a key is pressed.
    pub fn show(&mut self, title: &str, message: &str) -> anyhow::Result<()> {
        loop {
            self.terminal.draw(|frame| {
                let area = frame.area();
                frame.render_widget(
                    Block::default().style(Style::default().bg(ERROR_BG)),
                    area,
                );

                let text_width = (area.width * 80) / 100;
                let mut lines = vec![
                    Line::styled(title, Style::default().fg(ERROR_FG).bold()),
                    Line::raw(""),
                ];
                lines.extend(
                    message
                        .lines()
                        .map(|l| Line::styled(l, Style::default().fg(ERROR_FG))),
                );
                lines.push(Line::raw(""));
                lines.push(Line::styled(
                    "Press any key to close",
                    Style::default().fg(HINT_FG),
                ));

                let height = (lines.len() as u16 + 2).min(area.height);
                let body = Rect {
                    x: area.x + (area.width - text_width) / 2,
                    y: area.y + area.height.saturating_sub(height) / 2,
                    width: text_width,
                    height,
                };

                frame.render_widget(
                    Paragraph::new(lines)
                        .alignment(Alignment::Center)
                        .wrap(Wrap { trim: true })
                        .style(Style::default().bg(ERROR_BG)),
                    body,
                );
            })?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        break;
                    }
                }
            }
        }

        Ok(())
    }

    /// Restores the terminal.
    pub fn cleanup(&mut self) -> anyhow::Result<()> {
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

impl Drop for ErrorScreen {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

/// Opens an error screen, shows the message and restores the terminal.
pub fn show_error(title: &str, message: &str) -> anyhow::Result<()> {
    let mut screen = ErrorScreen::new()?;
    screen.show(title, message)?;
    screen.cleanup()
}
