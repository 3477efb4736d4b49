//! Append-only conversation history
//!
//! The generator reads an ordered transcript of the call so far. Past
//! exchanges are never mutated or removed; a turn that fails after the
//! caller's utterance was recorded keeps that utterance in the log.

/// Who produced an utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    /// The human caller
    Caller,
    /// The automated assistant
    Assistant,
}

impl Speaker {
    /// Label used in formatted transcripts and chat roles
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Caller => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One recorded utterance
#[derive(Debug, Clone)]
pub struct Exchange {
    /// Who spoke
    pub speaker: Speaker,
    /// What was said (assistant entries are stored marker-free)
    pub text: String,
}

/// Ordered, append-only log of everything said on the call
#[derive(Debug, Default)]
pub struct ConversationHistory {
    entries: Vec<Exchange>,
}

impl ConversationHistory {
    /// Create an empty history
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Record a caller utterance
    pub fn push_caller(&mut self, text: impl Into<String>) {
        self.entries.push(Exchange {
            speaker: Speaker::Caller,
            text: text.into(),
        });
    }

    /// Record an assistant utterance
    pub fn push_assistant(&mut self, text: impl Into<String>) {
        self.entries.push(Exchange {
            speaker: Speaker::Assistant,
            text: text.into(),
        });
    }

    /// Ordered read view of the full transcript
    #[must_use]
    pub fn entries(&self) -> &[Exchange] {
        &self.entries
    }

    /// Number of recorded utterances
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been said yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Format the history as a plain-text transcript block for prompts
    #[must_use]
    pub fn format_transcript(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(entry.speaker.label());
            out.push_str(": ");
            out.push_str(&entry.text);
            out.push('\n');
        }
        out
    }
}
