//! Dialog control core
//!
//! Turn sequencing, the embedded status-tag protocol, and the append-only
//! conversation history. Pure of any speech or model dependency; the
//! controller talks to those through the traits in `crate::adapters`.

mod controller;
mod history;
mod status;

pub use controller::{CallEnd, CallReport, DialogController, Turn, TurnOutcome};
pub use history::{ConversationHistory, Exchange, Speaker};
pub use status::{CONTINUE_MARKER, END_MARKER, Resolved, StatusCode, resolve};
