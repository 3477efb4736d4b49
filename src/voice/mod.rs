//! Voice processing
//!
//! Microphone capture, utterance endpointing, STT, TTS, and playback. The
//! dialog controller sees only the `SpeechInput`/`SpeechOutput` trait impls
//! in `input` and `output`.

mod capture;
mod input;
mod output;
mod playback;
mod segmenter;
mod stt;
mod tts;

pub use capture::{AudioCapture, SAMPLE_RATE, samples_to_wav};
pub use input::MicSpeechInput;
pub use output::SpokenOutput;
pub use playback::AudioPlayback;
pub use segmenter::{SegmentStatus, Segmenter, phrase_samples, rms_energy};
pub use stt::SpeechToText;
pub use tts::TextToSpeech;
