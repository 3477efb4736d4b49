//! Dialog controller - the turn state machine
//!
//! Owns the session configuration and the call loop. Each turn runs strictly
//! sequentially: listen, append, generate, resolve status, speak, then apply
//! termination policy. Every adapter failure is converted at this boundary
//! into one of the fixed scripted responses; no raw failure detail is ever
//! spoken to the caller, and history is never rolled back.

use tokio::sync::mpsc;

use crate::adapters::{ListenError, ResponseGenerator, SpeechInput, SpeechOutput};
use crate::config::{CallScript, SessionConfig};
use crate::dialog::history::ConversationHistory;
use crate::dialog::status::{self, StatusCode};

/// Phase of the call
#[derive(Debug, Clone, PartialEq, Eq)]
enum DialogState {
    /// Speaking the scripted opening
    Greeting,
    /// Waiting for a caller utterance
    Listening,
    /// Generating a reply to the latest utterance
    Thinking { user_text: String },
    /// Speaking the generated reply
    Speaking { text: String, code: StatusCode },
    /// Terminal
    Ended(CallEnd),
}

/// Why the call reached its terminal state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallEnd {
    /// The generator signaled END
    Completed,
    /// The caller said an end keyword
    EndKeyword,
    /// Consecutive no-speech results reached the retry threshold
    CallerUnreachable,
    /// Response generation failed
    GenerationFailed,
    /// The hard turn budget ran out
    TurnBudgetExhausted,
    /// External cancellation signal
    Interrupted,
}

impl CallEnd {
    /// Human-readable reason for the end-of-call banner
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::EndKeyword => "caller asked to end",
            Self::CallerUnreachable => "caller unreachable",
            Self::GenerationFailed => "generation failed",
            Self::TurnBudgetExhausted => "turn budget exhausted",
            Self::Interrupted => "interrupted",
        }
    }
}

/// What one turn amounted to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// A full exchange happened and the call goes on
    Continued,
    /// No speech was detected; the caller was re-prompted
    Retried,
    /// The call reached a terminal state on this turn
    Ended,
    /// Generation failed on this turn
    Failed,
}

/// One recorded exchange, immutable once pushed
#[derive(Debug, Clone)]
pub struct Turn {
    /// 1-based ordinal within the call
    pub index: u32,
    /// What the caller said (empty on a failed listen)
    pub user_text: String,
    /// Raw generated text, markers included
    pub raw_reply: Option<String>,
    /// Resolved status code
    pub status: Option<StatusCode>,
    /// Marker-free text that was spoken
    pub spoken: Option<String>,
    /// How the turn resolved
    pub outcome: TurnOutcome,
}

/// Running per-call counters, owned exclusively by the controller
#[derive(Debug, Default)]
struct SessionState {
    turns_taken: u32,
    no_speech_streak: u32,
}

/// Final record of a completed call
#[derive(Debug)]
pub struct CallReport {
    /// Terminal reason
    pub end: CallEnd,
    /// Every recorded turn, in order
    pub turns: Vec<Turn>,
    /// The full transcript
    pub history: ConversationHistory,
}

/// Drives one call from greeting to terminal state
pub struct DialogController<I, O, G> {
    config: SessionConfig,
    script: CallScript,
    input: I,
    output: O,
    generator: G,
    interrupt_rx: mpsc::Receiver<()>,
    history: ConversationHistory,
    turns: Vec<Turn>,
    session: SessionState,
}

impl<I, O, G> DialogController<I, O, G>
where
    I: SpeechInput,
    O: SpeechOutput,
    G: ResponseGenerator,
{
    /// Create a controller for one call
    ///
    /// `interrupt_rx` receives the cooperative cancellation signal; it is
    /// checked between adapter calls, never during one.
    pub fn new(
        config: SessionConfig,
        script: CallScript,
        input: I,
        output: O,
        generator: G,
        interrupt_rx: mpsc::Receiver<()>,
    ) -> Self {
        Self {
            config,
            script,
            input,
            output,
            generator,
            interrupt_rx,
            history: ConversationHistory::new(),
            turns: Vec::new(),
            session: SessionState {
                turns_taken: 0,
                no_speech_streak: 0,
            },
        }
    }

    /// Run the call to completion
    pub async fn run(mut self) -> CallReport {
        let mut state = DialogState::Greeting;

        let end = loop {
            if self.interrupted() {
                tracing::info!("interrupt signal observed");
                let farewell = self.script.interrupt_farewell.clone();
                self.say(&farewell).await;
                break CallEnd::Interrupted;
            }

            state = match state {
                DialogState::Greeting => self.greet().await,
                DialogState::Listening => self.listen_turn().await,
                DialogState::Thinking { user_text } => self.think(&user_text).await,
                DialogState::Speaking { text, code } => self.speak_reply(&text, code).await,
                DialogState::Ended(end) => break end,
            };
        };

        println!("\n{}", "=".repeat(60));
        println!("call ended: {}", end.describe());
        println!("{}", "=".repeat(60));
        tracing::info!(
            end = end.describe(),
            turns = self.session.turns_taken,
            "call ended"
        );

        CallReport {
            end,
            turns: self.turns,
            history: self.history,
        }
    }

    /// GREETING: scripted opening, no generator call
    async fn greet(&mut self) -> DialogState {
        for line in self.script.greeting.clone() {
            self.say(&line).await;
        }
        DialogState::Listening
    }

    /// LISTENING: one bounded listening window, with budget and retry policy
    async fn listen_turn(&mut self) -> DialogState {
        // The turn counter is independent of the state machine and counts
        // failed listens too, so the budget bounds the loop unconditionally.
        if self.session.turns_taken >= self.config.max_turns {
            tracing::info!(max_turns = self.config.max_turns, "turn budget reached");
            let closing = self.script.budget_closing.clone();
            self.say(&closing).await;
            return DialogState::Ended(CallEnd::TurnBudgetExhausted);
        }

        self.session.turns_taken += 1;
        let index = self.session.turns_taken;
        println!("\n── turn {index} ──");

        let listened = self
            .input
            .listen(self.config.listen_timeout, self.config.max_phrase)
            .await;

        match listened {
            Ok(text) if !text.trim().is_empty() => {
                self.session.no_speech_streak = 0;
                println!("caller: {text}");
                self.history.push_caller(&text);

                if self.matches_end_keyword(&text) {
                    tracing::info!(utterance = %text, "end keyword matched");
                    self.turns.push(Turn {
                        index,
                        user_text: text,
                        raw_reply: None,
                        status: None,
                        spoken: None,
                        outcome: TurnOutcome::Ended,
                    });
                    let farewell = self.script.keyword_farewell.clone();
                    self.say(&farewell).await;
                    return DialogState::Ended(CallEnd::EndKeyword);
                }

                DialogState::Thinking { user_text: text }
            }
            Ok(_) => self.no_speech(index, &ListenError::Empty).await,
            Err(e) => self.no_speech(index, &e).await,
        }
    }

    /// A listen produced nothing usable: bounded retry, then give up
    async fn no_speech(&mut self, index: u32, reason: &ListenError) -> DialogState {
        self.session.no_speech_streak += 1;
        println!("caller: [no speech detected]");
        tracing::warn!(
            %reason,
            streak = self.session.no_speech_streak,
            "no speech detected"
        );

        let terminal = self.session.no_speech_streak >= self.config.no_speech_retry_threshold;
        self.turns.push(Turn {
            index,
            user_text: String::new(),
            raw_reply: None,
            status: None,
            spoken: None,
            outcome: if terminal {
                TurnOutcome::Ended
            } else {
                TurnOutcome::Retried
            },
        });

        if terminal {
            let apology = self.script.unreachable_apology.clone();
            self.say(&apology).await;
            DialogState::Ended(CallEnd::CallerUnreachable)
        } else {
            let reprompt = self.script.reprompt.clone();
            self.say(&reprompt).await;
            DialogState::Listening
        }
    }

    /// THINKING: one generator call; a failure ends the call, never retries
    async fn think(&mut self, user_text: &str) -> DialogState {
        let index = self.session.turns_taken;

        match self.generator.generate(&self.history, user_text).await {
            Ok(raw) => {
                let resolved = status::resolve(&raw);
                self.history.push_assistant(&resolved.text);
                self.turns.push(Turn {
                    index,
                    user_text: user_text.to_string(),
                    raw_reply: Some(raw),
                    status: Some(resolved.code),
                    spoken: Some(resolved.text.clone()),
                    outcome: match resolved.code {
                        StatusCode::Continue => TurnOutcome::Continued,
                        StatusCode::End => TurnOutcome::Ended,
                    },
                });
                DialogState::Speaking {
                    text: resolved.text,
                    code: resolved.code,
                }
            }
            Err(e) => {
                tracing::error!(error = %e, turn = index, "generation failed");
                self.turns.push(Turn {
                    index,
                    user_text: user_text.to_string(),
                    raw_reply: None,
                    status: None,
                    spoken: None,
                    outcome: TurnOutcome::Failed,
                });
                let apology = self.script.technical_apology.clone();
                self.say(&apology).await;
                DialogState::Ended(CallEnd::GenerationFailed)
            }
        }
    }

    /// SPEAKING: play the cleaned reply, then apply the status decision
    async fn speak_reply(&mut self, text: &str, code: StatusCode) -> DialogState {
        if text.is_empty() {
            tracing::debug!("empty cleaned reply, skipping playback");
        } else {
            self.say(text).await;
        }

        match code {
            StatusCode::End => DialogState::Ended(CallEnd::Completed),
            StatusCode::Continue => DialogState::Listening,
        }
    }

    /// Speak a line, printing it to the transcript; playback failures are
    /// logged and swallowed so the call keeps progressing
    async fn say(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        println!("assistant: {text}");
        if let Err(e) = self.output.speak(text).await {
            tracing::warn!(error = %e, "playback failed");
        }
    }

    /// Case-insensitive substring match against the end-keyword set
    fn matches_end_keyword(&self, utterance: &str) -> bool {
        let lower = utterance.to_lowercase();
        self.config
            .end_keywords
            .iter()
            .any(|k| lower.contains(&k.to_lowercase()))
    }

    /// Check the cooperative interrupt channel without blocking
    fn interrupted(&mut self) -> bool {
        matches!(self.interrupt_rx.try_recv(), Ok(()))
    }
}
