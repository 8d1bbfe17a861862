use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use super::geometry::StarGeometry;

/// Size of the surface a renderer draws on, in its own units
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Surface {
    pub width: u16,
    pub height: u16,
}

/// One redraw: clear, draw the star outline, mark vertex `step`.
#[derive(Clone, Debug)]
pub struct DrawCommand {
    pub geometry: Arc<StarGeometry>,
    pub step: usize,
    /// Seconds since the session started
    pub elapsed: f64,
}

/// Receives redraw commands from the step engine.
pub trait Renderer {
    /// The surface to draw on, or `None` while there is nothing to draw on.
    fn surface(&self) -> Option<Surface>;
    fn present(&self, cmd: DrawCommand);
}

/// Smallest terminal area that can hold a recognisable star
const MIN_SURFACE: u16 = 4;

#[derive(Default)]
struct SlotState {
    surface: Option<Surface>,
    frame: Option<DrawCommand>,
}

/// Latest-frame slot shared between the step engine and the TUI.
///
/// The TUI reports its canvas size each time it lays out, and paints
/// whatever command was presented last.
#[derive(Clone, Default)]
pub struct FrameSlot {
    state: Arc<RwLock<SlotState>>,
}

impl FrameSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the canvas area; areas too small to draw on count as no surface.
    pub fn set_surface(&self, width: u16, height: u16) {
        let surface = (width >= MIN_SURFACE && height >= MIN_SURFACE)
            .then_some(Surface { width, height });
        self.state.write().surface = surface;
    }

    pub fn frame(&self) -> Option<DrawCommand> {
        self.state.read().frame.clone()
    }

    /// Forget the last frame (the session ended)
    pub fn clear(&self) {
        self.state.write().frame = None;
    }
}

impl Renderer for FrameSlot {
    fn surface(&self) -> Option<Surface> {
        self.state.read().surface
    }

    fn present(&self, cmd: DrawCommand) {
        self.state.write().frame = Some(cmd);
    }
}

/// Headless renderer: logs each time the marker moves to a new vertex.
pub struct LogRenderer {
    surface: Surface,
    last_step: AtomicUsize,
    frames: AtomicUsize,
}

impl LogRenderer {
    pub fn new(size: u16) -> Self {
        Self {
            surface: Surface {
                width: size,
                height: size,
            },
            last_step: AtomicUsize::new(usize::MAX),
            frames: AtomicUsize::new(0),
        }
    }

    /// Frames presented so far
    pub fn frames(&self) -> usize {
        self.frames.load(Ordering::Relaxed)
    }
}

impl Renderer for LogRenderer {
    fn surface(&self) -> Option<Surface> {
        Some(self.surface)
    }

    fn present(&self, cmd: DrawCommand) {
        self.frames.fetch_add(1, Ordering::Relaxed);
        let previous = self.last_step.swap(cmd.step, Ordering::Relaxed);
        if previous != cmd.step {
            let vertex = cmd.geometry.vertex(cmd.step);
            tracing::info!(
                step = cmd.step,
                elapsed = format_args!("{:.3}", cmd.elapsed),
                x = format_args!("{:.1}", vertex.x),
                y = format_args!("{:.1}", vertex.y),
                "star step"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(step: usize) -> DrawCommand {
        DrawCommand {
            geometry: Arc::new(StarGeometry::new(1000.0, 420.0)),
            step,
            elapsed: 0.0,
        }
    }

    #[test]
    fn slot_has_no_surface_until_laid_out() {
        let slot = FrameSlot::new();
        assert_eq!(slot.surface(), None);
        slot.set_surface(40, 20);
        assert_eq!(
            slot.surface(),
            Some(Surface {
                width: 40,
                height: 20
            })
        );
        slot.set_surface(2, 20);
        assert_eq!(slot.surface(), None);
    }

    #[test]
    fn slot_keeps_the_latest_frame() {
        let slot = FrameSlot::new();
        let reader = slot.clone();
        slot.present(command(1));
        slot.present(command(3));
        assert_eq!(reader.frame().map(|f| f.step), Some(3));
        slot.clear();
        assert!(reader.frame().is_none());
    }

    #[test]
    fn log_renderer_counts_frames() {
        let renderer = LogRenderer::new(1000);
        assert!(renderer.surface().is_some());
        renderer.present(command(0));
        renderer.present(command(0));
        renderer.present(command(1));
        assert_eq!(renderer.frames(), 3);
    }
}
