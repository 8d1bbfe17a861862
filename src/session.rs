//! Session lifecycle: one start creates a fresh output, clock, scheduler and
//! step engine; one stop tears all of them down.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::audio::{AudioBackend, AudioOutput};
use crate::clock::Clock;
use crate::config::MetronomeConfig;
use crate::error::Result;
use crate::runtime::{LoopDriver, TaskHandle};
use crate::scheduler::{beat_interval, LookAheadScheduler};
use crate::synth::ToneSynth;
use crate::visual::{step_index, Renderer, StarGeometry, StepEngine};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Running,
    Stopped,
}

/// Everything one running session owns.
pub struct Session {
    id: u64,
    config: MetronomeConfig,
    state: SessionState,
    /// Read by both loops of this session and by nothing else
    running: Arc<AtomicBool>,
    output: Box<dyn AudioOutput>,
    clock: Arc<dyn Clock>,
    start_time: f64,
    scheduler: TaskHandle,
    engine: TaskHandle,
}

impl Session {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    pub fn is_stopped(&self) -> bool {
        self.state == SessionState::Stopped
    }

    /// Seconds since this session started
    pub fn elapsed(&self) -> f64 {
        self.clock.now() - self.start_time
    }

    pub fn current_step(&self) -> usize {
        step_index(self.elapsed(), beat_interval(self.config.visual_tempo_bpm))
    }

    /// Clear the flag, cancel both loops, release the output. Runs once.
    fn shutdown(&mut self) {
        if self.is_stopped() {
            return;
        }
        self.running.store(false, Ordering::Release);
        self.scheduler.cancel();
        self.engine.cancel();
        self.output.close();
        self.state = SessionState::Stopped;
        tracing::info!(
            session = self.id,
            elapsed = format_args!("{:.3}", self.elapsed()),
            "session stopped"
        );
    }

    #[cfg(test)]
    fn running_flag(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown();
    }
}

enum Phase {
    Idle,
    Running(Session),
    Stopped,
}

/// The only component allowed to start or stop the metronome.
pub struct SessionController {
    config: MetronomeConfig,
    backend: Box<dyn AudioBackend>,
    renderer: Arc<dyn Renderer>,
    synth: ToneSynth,
    phase: Phase,
    next_id: u64,
}

impl SessionController {
    pub fn new(
        config: MetronomeConfig,
        backend: Box<dyn AudioBackend>,
        renderer: Arc<dyn Renderer>,
    ) -> Self {
        Self {
            config,
            backend,
            renderer,
            synth: ToneSynth::default(),
            phase: Phase::Idle,
            next_id: 1,
        }
    }

    pub fn config(&self) -> &MetronomeConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        matches!(&self.phase, Phase::Running(session) if session.is_running())
    }

    /// True after a stop, until the next start
    pub fn is_stopped(&self) -> bool {
        matches!(self.phase, Phase::Stopped)
    }

    pub fn session(&self) -> Option<&Session> {
        match &self.phase {
            Phase::Running(session) => Some(session),
            _ => None,
        }
    }

    /// Open the output and begin both loops on `driver`.
    ///
    /// A no-op while already running. If the output cannot be opened the
    /// error is returned and the controller stays where it was.
    pub fn start(&mut self, driver: &mut LoopDriver, now: Instant) -> Result<()> {
        if self.is_running() {
            tracing::debug!("start ignored, session already running");
            return Ok(());
        }

        let output = self.backend.open().inspect_err(|e| {
            tracing::warn!("session start failed: {}", e);
        })?;
        let clock = output.clock();
        let running = Arc::new(AtomicBool::new(true));

        let scheduler = LookAheadScheduler::new(
            clock.clone(),
            output.sink(),
            self.synth,
            self.config.audio_tempo_bpm,
            running.clone(),
        );
        let geometry = Arc::new(StarGeometry::new(
            self.config.canvas_size,
            self.config.star_radius,
        ));
        // One reading shared by the engine and the session, so both agree on the step
        let start_time = clock.now();
        let engine = StepEngine::new(
            clock.clone(),
            self.renderer.clone(),
            geometry,
            self.config.visual_tempo_bpm,
            start_time,
            running.clone(),
        );

        let scheduler_handle = TaskHandle::new();
        let engine_handle = TaskHandle::new();
        driver.spawn_timer(
            Box::new(scheduler),
            scheduler_handle.clone(),
            Duration::ZERO,
            now,
        );
        driver.spawn_frame(Box::new(engine), engine_handle.clone());

        let id = self.next_id;
        self.next_id += 1;
        tracing::info!(
            session = id,
            visual_bpm = self.config.visual_tempo_bpm,
            audio_bpm = self.config.audio_tempo_bpm,
            "session started"
        );

        self.phase = Phase::Running(Session {
            id,
            config: self.config,
            state: SessionState::Running,
            running,
            output,
            clock,
            start_time,
            scheduler: scheduler_handle,
            engine: engine_handle,
        });
        Ok(())
    }

    /// Stop the running session. A no-op when idle.
    pub fn stop(&mut self) {
        match std::mem::replace(&mut self.phase, Phase::Stopped) {
            Phase::Running(mut session) => session.shutdown(),
            previous => {
                tracing::debug!("stop ignored, no session running");
                self.phase = previous;
            }
        }
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.stop();
    }
}
