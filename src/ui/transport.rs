use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::ui::Theme;

/// What the transport bar shows
pub struct TransportInfo {
    pub running: bool,
    /// A session ran and was stopped; false before the first start
    pub stopped: bool,
    pub visual_bpm: f64,
    pub audio_bpm: f64,
    /// Run number of the current session
    pub session: Option<u64>,
    /// Seconds since the session started, if one is running
    pub elapsed: Option<f64>,
    pub step: Option<usize>,
}

/// Label of the single button: Start while idle, Stop while running
pub fn button_label(running: bool) -> &'static str {
    if running {
        "Stop"
    } else {
        "Start"
    }
}

/// Short state label: RUN, STOPPED after a stop, IDLE before the first start
fn transport_state(info: &TransportInfo) -> &'static str {
    if info.running {
        "RUN"
    } else if info.stopped {
        "STOPPED"
    } else {
        "IDLE"
    }
}

pub fn render_transport(frame: &mut Frame, area: Rect, info: &TransportInfo, theme: &Theme) {
    let status = transport_state(info);
    let status_style = if info.running {
        Style::default().fg(theme.marker).bold()
    } else {
        Style::default().fg(theme.dimmed)
    };

    let button_style = if info.running {
        Style::default().fg(Color::White).bg(theme.button_bg).bold()
    } else {
        Style::default().fg(theme.highlight).bold()
    };

    let separator = || Span::styled(" | ", Style::default().fg(theme.border));
    let mut spans = vec![
        Span::styled(format!(" [ {} ] ", button_label(info.running)), button_style),
        separator(),
        Span::styled(format!(" {} ", status), status_style),
        separator(),
        Span::styled(
            format!("Step BPM: {:.0}", info.visual_bpm),
            Style::default().fg(theme.fg),
        ),
        separator(),
        Span::styled(
            format!("Pulse BPM: {:.0}", info.audio_bpm),
            Style::default().fg(theme.fg),
        ),
    ];

    if let (Some(run), Some(elapsed), Some(step)) = (info.session, info.elapsed, info.step) {
        spans.push(separator());
        spans.push(Span::styled(
            format!("Run #{}", run),
            Style::default().fg(theme.dimmed),
        ));
        spans.push(separator());
        spans.push(Span::styled(
            format!("Time: {:6.2}s", elapsed),
            Style::default().fg(theme.fg),
        ));
        spans.push(separator());
        spans.push(Span::styled(
            format!("Point: {}/5", step + 1),
            Style::default().fg(theme.fg),
        ));
    }

    let transport = Paragraph::new(Line::from(spans))
        .style(Style::default().bg(theme.bg))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.border))
                .style(Style::default().bg(theme.bg)),
        );

    frame.render_widget(transport, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn info(running: bool, stopped: bool) -> TransportInfo {
        TransportInfo {
            running,
            stopped,
            visual_bpm: 62.0,
            audio_bpm: 124.0,
            session: running.then_some(1),
            elapsed: running.then_some(1.5),
            step: running.then_some(1),
        }
    }

    fn rendered_text(info: &TransportInfo) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 3)).unwrap();
        terminal
            .draw(|frame| render_transport(frame, frame.area(), info, &Theme::default()))
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn state_label_follows_the_session_phase() {
        assert_eq!(transport_state(&info(false, false)), "IDLE");
        assert_eq!(transport_state(&info(true, false)), "RUN");
        assert_eq!(transport_state(&info(false, true)), "STOPPED");
    }

    #[test]
    fn stopped_transport_offers_start_again() {
        let text = rendered_text(&info(false, true));
        assert!(text.contains("STOPPED"));
        assert!(text.contains("[ Start ]"));
        assert!(!text.contains("Run #"));
    }

    #[test]
    fn running_transport_shows_run_and_point() {
        let text = rendered_text(&info(true, false));
        assert!(text.contains("[ Stop ]"));
        assert!(text.contains("Run #1"));
        assert!(text.contains("Point: 2/5"));
    }
}
