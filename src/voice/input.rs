//! Microphone-backed speech input
//!
//! Implements the `SpeechInput` contract: one bounded listening window over
//! the capture stream, endpointed by the segmenter and transcribed by the
//! configured STT backend. Every failure mode crosses the boundary as a
//! `ListenError`, never a panic.

use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::adapters::{ListenError, SpeechInput};
use crate::voice::capture::{AudioCapture, SAMPLE_RATE, samples_to_wav};
use crate::voice::segmenter::{SegmentStatus, Segmenter, phrase_samples};
use crate::voice::stt::SpeechToText;

/// Polling cadence over the capture buffer
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Listens on the default microphone and recognizes one utterance per call
pub struct MicSpeechInput {
    capture: AudioCapture,
    stt: SpeechToText,
}

impl MicSpeechInput {
    /// Wire a capture device to an STT backend
    #[must_use]
    pub const fn new(capture: AudioCapture, stt: SpeechToText) -> Self {
        Self { capture, stt }
    }
}

#[async_trait(?Send)]
impl SpeechInput for MicSpeechInput {
    async fn listen(
        &mut self,
        timeout: Duration,
        max_phrase: Duration,
    ) -> std::result::Result<String, ListenError> {
        self.capture.clear();
        self.capture
            .start()
            .map_err(|e| ListenError::Service(e.to_string()))?;

        let max_samples = phrase_samples(max_phrase);
        let mut segmenter = Segmenter::new();
        let onset_deadline = Instant::now() + timeout;

        tracing::debug!(?timeout, ?max_phrase, "listening");

        let utterance = loop {
            tokio::time::sleep(POLL_INTERVAL).await;

            let chunk = self.capture.drain();
            match segmenter.push(&chunk, max_samples) {
                SegmentStatus::Waiting => {
                    if Instant::now() >= onset_deadline {
                        self.capture.stop();
                        tracing::debug!("listen timeout, no speech onset");
                        return Err(ListenError::Timeout);
                    }
                }
                SegmentStatus::Capturing => {
                    // Onset happened; the phrase cap bounds the rest.
                }
                SegmentStatus::Complete => break segmenter.take_utterance(),
            }
        };

        self.capture.stop();

        if utterance.len() < SAMPLE_RATE as usize / 4 {
            tracing::debug!(samples = utterance.len(), "utterance too short");
            return Err(ListenError::Empty);
        }

        let wav = samples_to_wav(&utterance, SAMPLE_RATE)
            .map_err(|e| ListenError::Service(e.to_string()))?;

        let text = self
            .stt
            .transcribe(&wav)
            .await
            .map_err(|e| ListenError::Service(e.to_string()))?;

        if text.trim().is_empty() {
            return Err(ListenError::Unrecognized);
        }

        Ok(text.trim().to_string())
    }
}
