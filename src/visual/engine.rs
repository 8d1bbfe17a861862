use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::geometry::{StarGeometry, POINTS};
use super::renderer::{DrawCommand, Renderer};
use crate::clock::Clock;
use crate::runtime::{Rearm, Task};
use crate::scheduler::beat_interval;

/// Star vertex for a given elapsed time. Always derived from absolute time,
/// so a stalled or skipped frame lands on the right vertex next time.
pub fn step_index(elapsed: f64, interval: f64) -> usize {
    if elapsed <= 0.0 {
        return 0;
    }
    ((elapsed / interval).floor() as u64 % POINTS as u64) as usize
}

/// Redraws the star on every display refresh while its session runs.
pub struct StepEngine {
    clock: Arc<dyn Clock>,
    renderer: Arc<dyn Renderer>,
    geometry: Arc<StarGeometry>,
    running: Arc<AtomicBool>,
    start_time: f64,
    interval: f64,
}

impl StepEngine {
    pub fn new(
        clock: Arc<dyn Clock>,
        renderer: Arc<dyn Renderer>,
        geometry: Arc<StarGeometry>,
        bpm: f64,
        start_time: f64,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            clock,
            renderer,
            geometry,
            running,
            start_time,
            interval: beat_interval(bpm),
        }
    }

    pub fn elapsed(&self) -> f64 {
        self.clock.now() - self.start_time
    }

    /// Draw the current step. Returns `None` when stopped or when the
    /// renderer has no surface this frame.
    pub fn redraw(&mut self) -> Option<usize> {
        if !self.running.load(Ordering::Acquire) {
            return None;
        }
        let Some(surface) = self.renderer.surface() else {
            tracing::trace!("no drawing surface, skipping frame");
            return None;
        };

        let elapsed = self.elapsed();
        let step = step_index(elapsed, self.interval);
        tracing::trace!(
            width = surface.width,
            height = surface.height,
            step,
            "redraw"
        );
        self.renderer.present(DrawCommand {
            geometry: self.geometry.clone(),
            step,
            elapsed,
        });
        Some(step)
    }
}

impl Task for StepEngine {
    fn run(&mut self) -> Rearm {
        if !self.running.load(Ordering::Acquire) {
            return Rearm::Finish;
        }
        self.redraw();
        Rearm::NextFrame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::visual::renderer::Surface;
    use parking_lot::Mutex;

    struct Recorder {
        ready: AtomicBool,
        steps: Mutex<Vec<usize>>,
    }

    impl Recorder {
        fn new(ready: bool) -> Arc<Self> {
            Arc::new(Self {
                ready: AtomicBool::new(ready),
                steps: Mutex::new(Vec::new()),
            })
        }
    }

    impl Renderer for Recorder {
        fn surface(&self) -> Option<Surface> {
            self.ready.load(Ordering::Relaxed).then_some(Surface {
                width: 100,
                height: 100,
            })
        }

        fn present(&self, cmd: DrawCommand) {
            self.steps.lock().push(cmd.step);
        }
    }

    fn engine(bpm: f64, renderer: Arc<Recorder>) -> (StepEngine, ManualClock, Arc<AtomicBool>) {
        let clock = ManualClock::new();
        let running = Arc::new(AtomicBool::new(true));
        let engine = StepEngine::new(
            Arc::new(clock.clone()),
            renderer,
            Arc::new(StarGeometry::new(1000.0, 420.0)),
            bpm,
            clock.now(),
            running.clone(),
        );
        (engine, clock, running)
    }

    #[test]
    fn step_at_two_seconds_of_62_bpm() {
        assert_eq!(step_index(2.0, beat_interval(62.0)), 2);
    }

    #[test]
    fn step_wraps_around_the_five_points() {
        let interval = beat_interval(62.0);
        assert_eq!(step_index(0.0, interval), 0);
        assert_eq!(step_index(4.5 * interval, interval), 4);
        assert_eq!(step_index(5.5 * interval, interval), 0);
        assert_eq!(step_index(-1.0, interval), 0);
    }

    #[test]
    fn elapsed_counts_from_the_given_start_time() {
        let clock = ManualClock::new();
        clock.set(4.0);
        let renderer = Recorder::new(true);
        let mut engine = StepEngine::new(
            Arc::new(clock.clone()),
            renderer.clone(),
            Arc::new(StarGeometry::new(1000.0, 420.0)),
            62.0,
            2.0,
            Arc::new(AtomicBool::new(true)),
        );

        assert!((engine.elapsed() - 2.0).abs() < 1e-12);
        assert_eq!(engine.redraw(), Some(2));
    }

    #[test]
    fn step_after_stall_matches_elapsed_time() {
        let renderer = Recorder::new(true);
        let (mut engine, clock, _) = engine(62.0, renderer.clone());
        let interval = beat_interval(62.0);

        // Jump straight to 3 beats in with no frames in between
        clock.set(3.0 * interval);
        assert_eq!(engine.redraw(), Some(3));

        // Redrawing again at the same time is idempotent
        assert_eq!(engine.redraw(), Some(3));
        assert_eq!(*renderer.steps.lock(), vec![3, 3]);
    }

    #[test]
    fn many_frames_and_one_frame_agree() {
        let smooth = Recorder::new(true);
        let (mut every_frame, smooth_clock, _) = engine(62.0, smooth.clone());
        let stalled = Recorder::new(true);
        let (mut one_frame, stalled_clock, _) = engine(62.0, stalled.clone());

        for _ in 0..600 {
            smooth_clock.advance(1.0 / 60.0);
            every_frame.redraw();
        }
        stalled_clock.set(smooth_clock.now());
        one_frame.redraw();

        assert_eq!(smooth.steps.lock().last(), stalled.steps.lock().last());
    }

    #[test]
    fn missing_surface_skips_the_frame() {
        let renderer = Recorder::new(false);
        let (mut engine, clock, _) = engine(62.0, renderer.clone());
        clock.set(1.0);
        assert_eq!(engine.redraw(), None);
        assert_eq!(engine.run(), Rearm::NextFrame);
        assert!(renderer.steps.lock().is_empty());

        renderer.ready.store(true, Ordering::Relaxed);
        assert_eq!(engine.redraw(), Some(1));
    }

    #[test]
    fn stopped_engine_draws_nothing() {
        let renderer = Recorder::new(true);
        let (mut engine, clock, running) = engine(62.0, renderer.clone());
        running.store(false, Ordering::Release);
        clock.set(2.0);
        assert_eq!(engine.redraw(), None);
        assert_eq!(engine.run(), Rearm::Finish);
        assert!(renderer.steps.lock().is_empty());
    }
}
