use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use crate::audio::CpalBackend;
use crate::config::MetronomeConfig;
use crate::runtime::{LoopDriver, FRAME_INTERVAL};
use crate::session::SessionController;
use crate::visual::LogRenderer;

/// Longest headless run, one day
pub const MAX_DURATION_SECS: f64 = 24.0 * 60.0 * 60.0;

/// Play the metronome without a terminal UI, logging star steps.
pub fn run_headless(config: MetronomeConfig, duration: f64) -> Result<()> {
    let renderer = Arc::new(LogRenderer::new(config.canvas_size as u16));
    let mut controller = SessionController::new(config, Box::new(CpalBackend), renderer.clone());
    let mut driver = LoopDriver::new();

    let start = Instant::now();
    controller
        .start(&mut driver, start)
        .context("Failed to start metronome session")?;

    let end = start + Duration::from_secs_f64(duration);
    let mut next_frame = start;
    loop {
        let now = Instant::now();
        if now >= end {
            break;
        }

        driver.run_timers(now);
        if now >= next_frame {
            driver.run_frame(now);
            next_frame = now + FRAME_INTERVAL;
        }

        let wake = driver.next_wake(next_frame).min(end);
        thread::sleep(wake.saturating_duration_since(Instant::now()));
    }

    controller.stop();
    tracing::info!(frames = renderer.frames(), "headless run finished");
    Ok(())
}
