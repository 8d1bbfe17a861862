use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Terminal;

use crate::audio::CpalBackend;
use crate::command::Command;
use crate::config::MetronomeConfig;
use crate::runtime::{LoopDriver, FRAME_INTERVAL};
use crate::session::SessionController;
use crate::ui::{render_star, render_transport, star_block, Theme, TransportInfo};
use crate::visual::FrameSlot;

/// How long a status message stays in the footer
const STATUS_TTL: Duration = Duration::from_secs(3);

/// Application state
pub struct App {
    /// Current theme
    theme: Theme,
    /// Start/stop authority over the metronome
    controller: SessionController,
    /// Runs the audio scheduler and the step engine between input polls
    driver: LoopDriver,
    /// Latest star frame, written by the step engine
    frames: FrameSlot,
    /// Whether the app should quit
    should_quit: bool,
    /// Temporary status message (e.g., "Start failed: ...")
    status_message: Option<(String, Instant)>,
}

impl App {
    pub fn new(theme: Theme, config: MetronomeConfig) -> Self {
        let frames = FrameSlot::new();
        let controller =
            SessionController::new(config, Box::new(CpalBackend), Arc::new(frames.clone()));

        Self {
            theme,
            controller,
            driver: LoopDriver::new(),
            frames,
            should_quit: false,
            status_message: None,
        }
    }

    /// Run the main application loop
    pub fn run(&mut self) -> Result<()> {
        let mut terminal = Self::setup_terminal()?;

        let result = self.main_loop(&mut terminal);

        self.controller.stop();
        Self::restore_terminal(&mut terminal)?;

        result
    }

    /// Setup the terminal for TUI
    fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        stdout.execute(EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(terminal)
    }

    /// Restore terminal to normal state
    fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        disable_raw_mode()?;
        terminal.backend_mut().execute(LeaveAlternateScreen)?;
        terminal.show_cursor()?;
        Ok(())
    }

    /// Main event loop: timers, then a display refresh when one is due, then input
    fn main_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let mut next_frame = Instant::now();
        loop {
            let now = Instant::now();
            self.driver.run_timers(now);

            if now >= next_frame {
                self.driver.run_frame(now);
                terminal.draw(|frame| self.render(frame))?;
                next_frame = now + FRAME_INTERVAL;
            }

            let timeout = self
                .driver
                .next_wake(next_frame)
                .saturating_duration_since(Instant::now());
            if event::poll(timeout)? {
                if let Event::Key(key) = event::read()? {
                    // Only handle key press events (not release)
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key);
                        next_frame = Instant::now();
                    }
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    /// Apply a command from the control surface
    fn dispatch(&mut self, cmd: Command) {
        tracing::debug!(command = cmd.description(), "dispatch");
        match cmd {
            Command::Start => {
                if let Err(e) = self.controller.start(&mut self.driver, Instant::now()) {
                    self.set_status(format!("Start failed: {}", e));
                }
            }
            Command::Stop => {
                self.controller.stop();
                self.frames.clear();
                self.driver.purge_cancelled();
                tracing::debug!(pending = self.driver.pending(), "loops released");
            }
            Command::Quit => {
                self.should_quit = true;
            }
        }
    }

    /// Set a temporary status message shown in the footer
    fn set_status(&mut self, msg: String) {
        self.status_message = Some((msg, Instant::now()));
    }

    /// Handle key press events
    fn handle_key(&mut self, key: KeyEvent) {
        let cmd = match key.code {
            KeyCode::Char(' ') | KeyCode::Enter => Command::toggle(self.controller.is_running()),
            KeyCode::Char('s') => Command::Start,
            KeyCode::Char('x') => Command::Stop,
            KeyCode::Char('q') | KeyCode::Esc => Command::Quit,
            _ => return,
        };
        self.dispatch(cmd);
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        // Clear with background color
        let bg_block = Block::default().style(Style::default().bg(self.theme.bg));
        frame.render_widget(bg_block, area);

        // Layout: header, transport, star, footer
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Length(3), // Transport
                Constraint::Min(6),    // Star
                Constraint::Length(3), // Footer
            ])
            .split(area);

        self.render_header(frame, chunks[0]);

        let config = self.controller.config();
        let session = self.controller.session();
        let info = TransportInfo {
            running: self.controller.is_running(),
            stopped: self.controller.is_stopped(),
            visual_bpm: config.visual_tempo_bpm,
            audio_bpm: config.audio_tempo_bpm,
            session: session.map(|s| s.id()),
            elapsed: session.map(|s| s.elapsed()),
            step: session.map(|s| s.current_step()),
        };
        render_transport(frame, chunks[1], &info, &self.theme);

        let star_area = square_area(chunks[2]);
        let inner = star_block(&self.theme).inner(star_area);
        self.frames.set_surface(inner.width, inner.height);
        let cmd = if self.controller.is_running() {
            self.frames.frame()
        } else {
            None
        };
        render_star(frame, star_area, cmd.as_ref(), &self.theme);

        self.render_footer(frame, chunks[3]);
    }

    /// Render the header
    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let title = format!(" PENTAPULSE v{} ", env!("CARGO_PKG_VERSION"));
        let header = Paragraph::new(title)
            .style(
                Style::default()
                    .fg(self.theme.highlight)
                    .bg(self.theme.bg)
                    .bold(),
            )
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(self.theme.border))
                    .style(Style::default().bg(self.theme.bg)),
            );
        frame.render_widget(header, area);
    }

    /// Render the footer with help or status message
    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        let text = match self.status_message {
            Some((ref msg, at)) if at.elapsed() < STATUS_TTL => msg.clone(),
            _ => self.footer_help(),
        };

        let footer = Paragraph::new(text)
            .style(Style::default().fg(self.theme.dimmed).bg(self.theme.bg))
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(self.theme.border))
                    .style(Style::default().bg(self.theme.bg)),
            );
        frame.render_widget(footer, area);
    }

    fn footer_help(&self) -> String {
        format!(
            "SPACE:{} | S:Start | X:Stop | Q:Quit | {}",
            crate::ui::button_label(self.controller.is_running()),
            self.theme.name
        )
    }
}

/// Largest centered area that looks square, given cells twice as tall as wide
fn square_area(area: Rect) -> Rect {
    let width = area.width.min(area.height.saturating_mul(2));
    let height = area.height.min(area.width / 2);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}
