use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use super::ToneSink;
use crate::synth::ScheduledTone;

const BUS_CAPACITY: usize = 256;

/// Drop accounting shared by every sender of one bus.
///
/// A run of consecutive drops is one episode: it is logged when it begins
/// and again, with its total, when a send gets through.
#[derive(Default)]
struct Overflow {
    active: AtomicBool,
    dropped: AtomicU64,
    episodes: AtomicU64,
}

/// Channel carrying scheduled tones from the scheduler to the audio thread
pub struct ToneBus {
    tx: Sender<ScheduledTone>,
    rx: Receiver<ScheduledTone>,
    overflow: Arc<Overflow>,
}

impl ToneBus {
    pub fn new() -> Self {
        let (tx, rx) = bounded(BUS_CAPACITY);
        Self {
            tx,
            rx,
            overflow: Arc::new(Overflow::default()),
        }
    }

    /// Get a sender that can be cloned and shared
    pub fn sender(&self) -> ToneSender {
        ToneSender {
            tx: self.tx.clone(),
            overflow: self.overflow.clone(),
        }
    }

    /// Get a receiver (typically for the audio thread)
    pub fn receiver(&self) -> ToneReceiver {
        ToneReceiver {
            rx: self.rx.clone(),
        }
    }
}

impl Default for ToneBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Cloneable sender for scheduled tones
#[derive(Clone)]
pub struct ToneSender {
    tx: Sender<ScheduledTone>,
    overflow: Arc<Overflow>,
}

impl ToneSender {
    /// Send a tone (non-blocking, drops if buffer full)
    pub fn send(&self, tone: ScheduledTone) -> bool {
        match self.tx.try_send(tone) {
            Ok(()) => {
                if self.overflow.active.swap(false, Ordering::AcqRel) {
                    let dropped = self.overflow.dropped.swap(0, Ordering::AcqRel);
                    tracing::warn!(dropped, "tone bus accepting tones again");
                }
                true
            }
            Err(TrySendError::Full(_)) => {
                self.overflow.dropped.fetch_add(1, Ordering::AcqRel);
                if !self.overflow.active.swap(true, Ordering::AcqRel) {
                    self.overflow.episodes.fetch_add(1, Ordering::AcqRel);
                    tracing::warn!(start = tone.start, "tone bus full, dropping tones");
                }
                false
            }
            // Output already closed
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    #[cfg(test)]
    fn dropped(&self) -> u64 {
        self.overflow.dropped.load(Ordering::Acquire)
    }

    #[cfg(test)]
    fn episodes(&self) -> u64 {
        self.overflow.episodes.load(Ordering::Acquire)
    }
}

impl ToneSink for ToneSender {
    fn schedule(&self, tone: ScheduledTone) {
        self.send(tone);
    }
}

/// Receiver for consuming scheduled tones
#[derive(Clone)]
pub struct ToneReceiver {
    rx: Receiver<ScheduledTone>,
}

impl ToneReceiver {
    /// Try to receive a tone (non-blocking)
    pub fn try_recv(&self) -> Option<ScheduledTone> {
        self.rx.try_recv().ok()
    }
}
