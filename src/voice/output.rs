//! Speaker-backed speech output
//!
//! Implements the `SpeechOutput` contract: synthesize with the configured TTS
//! backend, decode, and play to completion before returning.

use std::time::Duration;

use async_trait::async_trait;

use crate::Result;
use crate::adapters::SpeechOutput;
use crate::voice::playback::AudioPlayback;
use crate::voice::tts::TextToSpeech;

/// Pause after each spoken line so replies don't run together
const POST_SPEECH_PAUSE: Duration = Duration::from_millis(300);

/// Speaks text through the default output device
pub struct SpokenOutput {
    tts: TextToSpeech,
    playback: AudioPlayback,
}

impl SpokenOutput {
    /// Wire a TTS backend to a playback device
    #[must_use]
    pub const fn new(tts: TextToSpeech, playback: AudioPlayback) -> Self {
        Self { tts, playback }
    }
}

#[async_trait(?Send)]
impl SpeechOutput for SpokenOutput {
    async fn speak(&mut self, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Ok(());
        }

        let audio = self.tts.synthesize(text).await?;
        tracing::debug!(bytes = audio.len(), "synthesized");

        self.playback.play_mp3(&audio).await?;
        tokio::time::sleep(POST_SPEECH_PAUSE).await;
        Ok(())
    }
}
