use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig};

use super::bus::{ToneBus, ToneReceiver};
use super::mixer::ToneMixer;
use super::{AudioBackend, AudioOutput, ToneSink};
use crate::clock::{AudioClock, Clock};
use crate::error::{MetronomeError, Result};

/// Opens the host's default output device
#[derive(Clone, Copy, Debug, Default)]
pub struct CpalBackend;

impl AudioBackend for CpalBackend {
    fn open(&self) -> Result<Box<dyn AudioOutput>> {
        Ok(Box::new(CpalOutput::open_default()?))
    }
}

/// Live output stream. Its frame counter is the session clock.
pub struct CpalOutput {
    stream: Option<Stream>,
    clock: AudioClock,
    sink: Arc<dyn ToneSink>,
}

impl CpalOutput {
    /// Initialize the output with the default device
    pub fn open_default() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(MetronomeError::NoOutputDevice)?;

        let config = device
            .default_output_config()
            .map_err(MetronomeError::stream)?;
        let clock = AudioClock::new(config.sample_rate().0);
        let bus = ToneBus::new();

        let stream = match config.sample_format() {
            SampleFormat::F32 => {
                Self::build_stream::<f32>(&device, &config.into(), bus.receiver(), clock.clone())?
            }
            SampleFormat::I16 => {
                Self::build_stream::<i16>(&device, &config.into(), bus.receiver(), clock.clone())?
            }
            SampleFormat::U16 => {
                Self::build_stream::<u16>(&device, &config.into(), bus.receiver(), clock.clone())?
            }
            format => return Err(MetronomeError::UnsupportedSampleFormat(format!("{:?}", format))),
        };

        stream.play().map_err(MetronomeError::stream)?;

        tracing::debug!(
            device = %device.name().unwrap_or_default(),
            sample_rate = clock.sample_rate(),
            "audio output opened"
        );

        Ok(Self {
            stream: Some(stream),
            clock,
            sink: Arc::new(bus.sender()),
        })
    }

    /// Build the audio stream for a specific sample format
    fn build_stream<T>(
        device: &Device,
        config: &StreamConfig,
        tone_rx: ToneReceiver,
        clock: AudioClock,
    ) -> Result<Stream>
    where
        T: cpal::SizedSample + cpal::FromSample<f32>,
    {
        let sample_rate = config.sample_rate.0 as f64;
        let channels = config.channels as usize;
        let mut mixer = ToneMixer::new(sample_rate as f32, tone_rx);

        let stream = device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    mixer.drain_bus();

                    let first_frame = clock.frames();
                    let mut rendered = 0u64;
                    for frame in data.chunks_mut(channels) {
                        let frame_time = (first_frame + rendered) as f64 / sample_rate;
                        let sample = T::from_sample(mixer.next_sample(frame_time));
                        for channel_sample in frame.iter_mut() {
                            *channel_sample = sample;
                        }
                        rendered += 1;
                    }

                    clock.advance_frames(rendered);
                },
                |err| {
                    tracing::error!("audio stream error: {}", err);
                },
                None,
            )
            .map_err(MetronomeError::stream)?;

        Ok(stream)
    }
}

impl AudioOutput for CpalOutput {
    fn clock(&self) -> Arc<dyn Clock> {
        Arc::new(self.clock.clone())
    }

    fn sink(&self) -> Arc<dyn ToneSink> {
        self.sink.clone()
    }

    fn close(&mut self) {
        let Some(stream) = self.stream.take() else {
            return;
        };
        if let Err(e) = stream.pause() {
            tracing::debug!("pausing stream on close failed: {}", e);
        }
        drop(stream);
        tracing::debug!(at = self.clock.now(), "audio output closed");
    }
}

impl Drop for CpalOutput {
    fn drop(&mut self) {
        self.close();
    }
}
