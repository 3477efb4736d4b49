//! Utterance endpointing
//!
//! Energy-based segmentation of the capture stream into one bounded
//! utterance: wait for speech onset, accumulate until trailing silence or the
//! phrase cap, then hand the samples to recognition.

use crate::voice::capture::SAMPLE_RATE;

/// RMS energy above which a chunk counts as speech
const ENERGY_THRESHOLD: f32 = 0.03;

/// Minimum accumulated speech to accept an utterance (0.3 s at 16 kHz)
const MIN_SPEECH_SAMPLES: usize = 4800;

/// Trailing silence that closes an utterance (0.5 s at 16 kHz)
const TRAILING_SILENCE_SAMPLES: usize = 8000;

/// Where the segmenter is within one listening window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentStatus {
    /// No speech onset yet
    Waiting,
    /// Speech started, still accumulating
    Capturing,
    /// A complete utterance is buffered
    Complete,
}

/// Segments one utterance out of a chunked audio stream
#[derive(Debug, Default)]
pub struct Segmenter {
    buffer: Vec<f32>,
    in_speech: bool,
    silence_run: usize,
}

impl Segmenter {
    /// Create a segmenter for one listening window
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: Vec::new(),
            in_speech: false,
            silence_run: 0,
        }
    }

    /// Feed one chunk of samples; `max_phrase_samples` caps the utterance
    pub fn push(&mut self, chunk: &[f32], max_phrase_samples: usize) -> SegmentStatus {
        let is_speech = rms_energy(chunk) > ENERGY_THRESHOLD;

        if !self.in_speech {
            if !is_speech {
                return SegmentStatus::Waiting;
            }
            self.in_speech = true;
            self.silence_run = 0;
            tracing::trace!("speech onset");
        }

        self.buffer.extend_from_slice(chunk);

        if is_speech {
            self.silence_run = 0;
        } else {
            self.silence_run += chunk.len();
        }

        if self.buffer.len() >= max_phrase_samples {
            self.buffer.truncate(max_phrase_samples);
            tracing::debug!(samples = self.buffer.len(), "phrase cap reached");
            return SegmentStatus::Complete;
        }

        if self.silence_run > TRAILING_SILENCE_SAMPLES && self.buffer.len() > MIN_SPEECH_SAMPLES {
            tracing::debug!(samples = self.buffer.len(), "utterance complete");
            return SegmentStatus::Complete;
        }

        SegmentStatus::Capturing
    }

    /// Take the buffered utterance, resetting the segmenter
    pub fn take_utterance(&mut self) -> Vec<f32> {
        self.in_speech = false;
        self.silence_run = 0;
        std::mem::take(&mut self.buffer)
    }

    /// Whether speech onset has been observed in this window
    #[must_use]
    pub const fn has_speech(&self) -> bool {
        self.in_speech
    }
}

/// Convert a phrase duration to a sample cap at the capture rate
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn phrase_samples(duration: std::time::Duration) -> usize {
    (duration.as_secs_f64() * f64::from(SAMPLE_RATE)) as usize
}

/// RMS energy of a chunk
#[allow(clippy::cast_precision_loss)]
pub fn rms_energy(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}
