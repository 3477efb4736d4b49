//! Adapter traits the dialog controller depends on
//!
//! Each external collaborator (speech recognition, speech synthesis, response
//! generation) sits behind a trait so the controller can be driven by mocks in
//! tests. Failure modes cross these boundaries as tagged outcomes, never as
//! panics.
//!
//! The traits are `?Send`: production impls hold audio device handles bound
//! to the thread that opened them (a cpal stream is `!Send`), and the whole
//! call loop runs on the main task.

use std::time::Duration;

use async_trait::async_trait;

use crate::Result;
use crate::dialog::ConversationHistory;

/// Why a listening window produced no usable utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenError {
    /// Recognition returned an empty transcript
    Empty,
    /// No speech started within the listening timeout
    Timeout,
    /// Audio was captured but could not be recognized
    Unrecognized,
    /// The recognition backend was unreachable or errored
    Service(String),
}

impl std::fmt::Display for ListenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty transcript"),
            Self::Timeout => write!(f, "no speech within timeout"),
            Self::Unrecognized => write!(f, "speech not recognized"),
            Self::Service(e) => write!(f, "recognition service error: {e}"),
        }
    }
}

/// Why response generation failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerateError {
    /// The generation backend was unreachable or errored
    Service(String),
}

impl std::fmt::Display for GenerateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Self::Service(e) = self;
        write!(f, "generation service error: {e}")
    }
}

/// Converts a bounded listening window of audio into text
#[async_trait(?Send)]
pub trait SpeechInput {
    /// Listen for one utterance
    ///
    /// Waits up to `timeout` for speech to start, then captures at most
    /// `max_phrase` of audio before recognition. All failure modes are
    /// returned as a [`ListenError`].
    async fn listen(
        &mut self,
        timeout: Duration,
        max_phrase: Duration,
    ) -> std::result::Result<String, ListenError>;
}

/// Renders text to speech and plays it back
#[async_trait(?Send)]
pub trait SpeechOutput {
    /// Speak the given text, returning once playback has finished
    ///
    /// # Errors
    ///
    /// Returns error if synthesis or playback fails. The caller treats this
    /// as non-fatal.
    async fn speak(&mut self, text: &str) -> Result<()>;
}

/// Produces the assistant's next reply from conversation context
#[async_trait(?Send)]
pub trait ResponseGenerator {
    /// Generate a reply to `user_text` given the conversation so far
    ///
    /// The returned text is expected, but not guaranteed, to carry a status
    /// marker; the caller tolerates its absence.
    async fn generate(
        &self,
        history: &ConversationHistory,
        user_text: &str,
    ) -> std::result::Result<String, GenerateError>;
}
