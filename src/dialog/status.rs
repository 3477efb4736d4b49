//! Status-tag protocol
//!
//! The generator embeds a literal control marker in its replies: `[702]` to
//! keep the call going, `[701]` to end it. This module resolves raw generated
//! text into a speakable string and exactly one status code, tolerating
//! missing or conflicting markers.

/// Marker signaling the call should end
pub const END_MARKER: &str = "[701]";

/// Marker signaling the conversation should continue
pub const CONTINUE_MARKER: &str = "[702]";

/// Resolved conversation control decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// Keep the call going
    Continue,
    /// End the call
    End,
}

/// Generated text after marker resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// Text with all markers stripped and whitespace normalized
    pub text: String,
    /// The single status code this reply resolves to
    pub code: StatusCode,
}

/// Resolve raw generated text into cleaned text and a status code
///
/// The END marker wins whenever it appears, regardless of position or a
/// CONTINUE marker elsewhere; ambiguous output is resolved toward ending the
/// call rather than looping. With neither marker present the call continues,
/// so a malformed reply never aborts the call on its own.
#[must_use]
pub fn resolve(raw: &str) -> Resolved {
    let code = if raw.contains(END_MARKER) {
        StatusCode::End
    } else {
        StatusCode::Continue
    };

    let stripped = raw.replace(END_MARKER, " ").replace(CONTINUE_MARKER, " ");
    let text = stripped.split_whitespace().collect::<Vec<_>>().join(" ");

    Resolved { text, code }
}
