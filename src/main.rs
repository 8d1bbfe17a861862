mod app;
mod audio;
mod clock;
mod command;
mod config;
mod error;
mod export;
mod headless;
mod runtime;
mod scheduler;
mod session;
mod synth;
mod ui;
mod visual;

use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use app::App;
use config::MetronomeConfig;
use ui::Theme;

/// Pentapulse - terminal audiovisual metronome
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Theme to use for the interface
    #[arg(long, default_value = "default")]
    theme: String,

    /// List available themes and exit
    #[arg(long)]
    list_themes: bool,

    /// JSON config file (visualTempoBpm, audioTempoBpm, canvasSize, starRadius)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Rate the marker steps between star points
    #[arg(long)]
    visual_bpm: Option<f64>,

    /// Rate of the pulse tone
    #[arg(long)]
    audio_bpm: Option<f64>,

    /// Edge length of the drawing surface
    #[arg(long)]
    size: Option<f64>,

    /// Radius of the circle the star points sit on
    #[arg(long)]
    radius: Option<f64>,

    /// Play without the terminal UI, logging each star step
    #[arg(long, conflicts_with = "export")]
    headless: bool,

    /// Render the pulse offline to a WAV file and exit
    #[arg(long)]
    export: Option<PathBuf>,

    /// Seconds to play (headless) or render (export)
    #[arg(long, default_value_t = 10.0)]
    duration: f64,

    /// Write logs to this file while the terminal UI is running
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Handle --list-themes
    if args.list_themes {
        println!("Available themes:");
        for theme in Theme::available_themes() {
            println!("  {}", theme);
        }
        return Ok(());
    }

    let tui = !args.headless && args.export.is_none();
    init_tracing(tui, args.log_file.as_ref())?;

    let config = build_config(&args)?;

    if let Some(path) = &args.export {
        check_duration(args.duration, export::MAX_DURATION_SECS)?;
        let result = export::export_wav(&config, args.duration, path)?;
        println!(
            "Exported: {} ({:.1}s, {} samples, {} beats)",
            path.display(),
            result.duration_secs,
            result.samples,
            result.beats
        );
        return Ok(());
    }

    if args.headless {
        check_duration(args.duration, headless::MAX_DURATION_SECS)?;
        return headless::run_headless(config, args.duration);
    }

    // Load theme
    let theme = Theme::from_name(&args.theme).unwrap_or_else(|| {
        eprintln!(
            "Warning: Unknown theme '{}', using default. Use --list-themes to see available themes.",
            args.theme
        );
        Theme::default()
    });

    // Run the TUI application
    let mut app = App::new(theme, config);
    app.run()
}

/// `--duration` must be a positive number of seconds no larger than `max`
fn check_duration(seconds: f64, max: f64) -> Result<()> {
    if !seconds.is_finite() || seconds <= 0.0 {
        anyhow::bail!("--duration must be a positive number of seconds");
    }
    if seconds > max {
        anyhow::bail!("--duration {} is too long (at most {} seconds)", seconds, max);
    }
    Ok(())
}

/// Config file first, then command-line overrides
fn build_config(args: &Args) -> Result<MetronomeConfig> {
    let mut config = match &args.config {
        Some(path) => MetronomeConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => MetronomeConfig::default(),
    };

    if let Some(bpm) = args.visual_bpm {
        config.visual_tempo_bpm = bpm;
    }
    if let Some(bpm) = args.audio_bpm {
        config.audio_tempo_bpm = bpm;
    }
    if let Some(size) = args.size {
        config.canvas_size = size;
    }
    if let Some(radius) = args.radius {
        config.star_radius = radius;
    }

    config.validate()?;
    Ok(config)
}

/// Stderr logging for headless and export runs. The terminal UI owns the
/// screen, so there logs only go to `--log-file` when one is given.
fn init_tracing(tui: bool, log_file: Option<&PathBuf>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if let Some(path) = log_file {
        let file = File::create(path)
            .with_context(|| format!("Failed to create log file: {}", path.display()))?;
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init();
    } else if !tui {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_must_be_positive_and_bounded() {
        assert!(check_duration(10.0, export::MAX_DURATION_SECS).is_ok());
        assert!(check_duration(0.0, export::MAX_DURATION_SECS).is_err());
        assert!(check_duration(-1.0, headless::MAX_DURATION_SECS).is_err());
        assert!(check_duration(f64::NAN, headless::MAX_DURATION_SECS).is_err());
        assert!(check_duration(f64::INFINITY, headless::MAX_DURATION_SECS).is_err());
        assert!(check_duration(1e300, headless::MAX_DURATION_SECS).is_err());
        assert!(check_duration(export::MAX_DURATION_SECS + 1.0, export::MAX_DURATION_SECS).is_err());
        assert!(check_duration(headless::MAX_DURATION_SECS, headless::MAX_DURATION_SECS).is_ok());
    }
}
