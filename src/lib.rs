//! outcall - voice gateway for automated outbound screening calls
//!
//! Drives a guided, turn-based spoken conversation between a human caller and
//! an automated interviewing assistant, collecting a fixed sequence of facts
//! through natural speech.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                 DialogController                  │
//! │  turn loop │ retry policy │ status protocol      │
//! └──────┬──────────────┬──────────────┬─────────────┘
//!        │              │              │
//!   SpeechInput   ResponseGenerator  SpeechOutput
//!   (mic + STT)   (chat completions) (TTS + speaker)
//! ```
//!
//! The controller is the only component with control logic; the adapters are
//! linear plumbing behind traits and can be replaced by mocks in tests.

pub mod adapters;
pub mod config;
pub mod dialog;
pub mod error;
pub mod llm;
pub mod prompt;
pub mod voice;

pub use adapters::{GenerateError, ListenError, ResponseGenerator, SpeechInput, SpeechOutput};
pub use config::{Config, SessionConfig};
pub use dialog::{
    CallEnd, CallReport, ConversationHistory, DialogController, StatusCode, Turn, TurnOutcome,
};
pub use error::{Error, Result};
pub use llm::ChatGenerator;
