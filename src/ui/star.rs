use ratatui::prelude::*;
use ratatui::symbols::Marker;
use ratatui::widgets::canvas::{Canvas, Circle, Line as CanvasLine};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::ui::Theme;
use crate::visual::{DrawCommand, Point};

/// Marker dot radius as a share of the surface edge (20 px on a 1000 px canvas)
const MARKER_RATIO: f64 = 0.02;

/// Block around the star, shared so the caller can measure its inner area
pub fn star_block(theme: &Theme) -> Block<'static> {
    Block::default()
        .title(Span::styled(" Pentagram ", Style::default().fg(theme.highlight)))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border))
        .style(Style::default().bg(theme.bg))
}

/// Render one frame of the star: outline, vertices and the filled marker.
pub fn render_star(frame: &mut Frame, area: Rect, cmd: Option<&DrawCommand>, theme: &Theme) {
    let block = star_block(theme);

    let Some(cmd) = cmd else {
        let inner = block.inner(area);
        frame.render_widget(block, area);
        let hint = Paragraph::new("press SPACE to start")
            .style(Style::default().fg(theme.dimmed))
            .alignment(Alignment::Center);
        let y = inner.y + inner.height / 2;
        frame.render_widget(hint, Rect::new(inner.x, y, inner.width, 1.min(inner.height)));
        return;
    };

    let size = cmd.geometry.size();
    // Surface y grows downward, canvas y grows upward
    let flip = |p: Point| (p.x, size - p.y);
    let marker_radius = size * MARKER_RATIO;

    let canvas = Canvas::default()
        .block(block)
        .background_color(theme.bg)
        .marker(Marker::Braille)
        .x_bounds([0.0, size])
        .y_bounds([0.0, size])
        .paint(move |ctx| {
            for (from, to) in cmd.geometry.outline() {
                let (x1, y1) = flip(from);
                let (x2, y2) = flip(to);
                ctx.draw(&CanvasLine::new(x1, y1, x2, y2, theme.outline));
            }
            ctx.layer();

            for (i, point) in cmd.geometry.points().iter().enumerate() {
                let (x, y) = flip(*point);
                if i == cmd.step {
                    // Concentric rings read as a filled dot
                    let mut r = marker_radius;
                    while r > 0.0 {
                        ctx.draw(&Circle {
                            x,
                            y,
                            radius: r,
                            color: theme.marker,
                        });
                        r -= marker_radius / 4.0;
                    }
                } else {
                    ctx.draw(&Circle {
                        x,
                        y,
                        radius: marker_radius / 3.0,
                        color: theme.vertex,
                    });
                }
            }
        });

    frame.render_widget(canvas, area);
}
