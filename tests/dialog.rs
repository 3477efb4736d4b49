//! Dialog controller integration tests
//!
//! Drives the turn state machine with scripted mock adapters; no audio
//! hardware or model backend involved.

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use outcall::adapters::{GenerateError, ListenError, ResponseGenerator, SpeechInput, SpeechOutput};
use outcall::config::{CallScript, SessionConfig};
use outcall::dialog::{
    CallEnd, CallReport, ConversationHistory, DialogController, Speaker, StatusCode, TurnOutcome,
};

/// Speech input that replays a scripted sequence of listen results
struct ScriptedInput {
    results: VecDeque<Result<String, ListenError>>,
}

impl ScriptedInput {
    fn new(results: Vec<Result<String, ListenError>>) -> Self {
        Self {
            results: results.into(),
        }
    }
}

#[async_trait(?Send)]
impl SpeechInput for ScriptedInput {
    async fn listen(
        &mut self,
        _timeout: Duration,
        _max_phrase: Duration,
    ) -> Result<String, ListenError> {
        self.results.pop_front().unwrap_or(Err(ListenError::Timeout))
    }
}

/// Speech output that records everything it is asked to speak
#[derive(Clone)]
struct RecordingOutput {
    spoken: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl RecordingOutput {
    fn new() -> Self {
        Self {
            spoken: Arc::new(Mutex::new(Vec::new())),
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            spoken: Arc::new(Mutex::new(Vec::new())),
            fail: true,
        }
    }

    fn lines(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }

    fn spoke(&self, needle: &str) -> bool {
        self.lines().iter().any(|l| l.contains(needle))
    }
}

#[async_trait(?Send)]
impl SpeechOutput for RecordingOutput {
    async fn speak(&mut self, text: &str) -> outcall::Result<()> {
        self.spoken.lock().unwrap().push(text.to_string());
        if self.fail {
            return Err(outcall::Error::Tts("device gone".to_string()));
        }
        Ok(())
    }
}

/// Generator that replays scripted replies and counts invocations
struct ScriptedGenerator {
    replies: Mutex<VecDeque<Result<String, GenerateError>>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedGenerator {
    fn new(replies: Vec<Result<String, GenerateError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait(?Send)]
impl ResponseGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        _history: &ConversationHistory,
        _user_text: &str,
    ) -> Result<String, GenerateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GenerateError::Service("script exhausted".to_string())))
    }
}

/// Test session policy: same shape as the default, shorter where convenient
fn session(max_turns: u32) -> SessionConfig {
    SessionConfig {
        listen_timeout: Duration::from_millis(10),
        max_phrase: Duration::from_millis(10),
        no_speech_retry_threshold: 2,
        max_turns,
        end_keywords: vec![
            "bye".to_string(),
            "stop".to_string(),
            "नहीं चाहिए".to_string(),
        ],
    }
}

/// Test script with distinctive lines for assertions
fn script() -> CallScript {
    CallScript {
        greeting: vec!["hello, this is the screening call".to_string()],
        reprompt: "can you hear me?".to_string(),
        unreachable_apology: "cannot hear you, call back later".to_string(),
        technical_apology: "technical problem, try later".to_string(),
        keyword_farewell: "okay, no problem, goodbye".to_string(),
        budget_closing: "out of time, team will contact you".to_string(),
        interrupt_farewell: "call disconnected, thank you".to_string(),
        self_check_phrase: "test".to_string(),
    }
}

async fn run_call(
    config: SessionConfig,
    input: ScriptedInput,
    output: RecordingOutput,
    generator: ScriptedGenerator,
) -> CallReport {
    let (_tx, rx) = mpsc::channel(1);
    DialogController::new(config, script(), input, output, generator, rx)
        .run()
        .await
}

#[tokio::test]
async fn continue_marker_keeps_call_going() {
    // Scenario A: a tagged reply is cleaned, spoken, and the loop continues
    let input = ScriptedInput::new(vec![
        Ok("हाँ मुझे interest है".to_string()),
        Ok("Ravi".to_string()),
    ]);
    let output = RecordingOutput::new();
    let generator = ScriptedGenerator::new(vec![
        Ok("बढ़िया! आपका नाम क्या है? [702]".to_string()),
        Ok("धन्यवाद! हमारी team contact करेगी। [701]".to_string()),
    ]);

    let report = run_call(session(20), input, output.clone(), generator).await;

    assert_eq!(report.end, CallEnd::Completed);
    assert_eq!(report.turns.len(), 2);
    assert_eq!(report.turns[0].status, Some(StatusCode::Continue));
    assert_eq!(report.turns[0].outcome, TurnOutcome::Continued);
    assert_eq!(
        report.turns[0].spoken.as_deref(),
        Some("बढ़िया! आपका नाम क्या है?")
    );
    assert!(output.spoke("बढ़िया! आपका नाम क्या है?"));
    assert!(!output.spoke("[702]"));
}

#[tokio::test]
async fn end_keyword_skips_generator() {
    // Scenario B: "bye" terminates on the same turn, generator never runs
    let input = ScriptedInput::new(vec![Ok("bye".to_string())]);
    let output = RecordingOutput::new();
    let generator = ScriptedGenerator::new(vec![]);
    let calls = generator.call_counter();

    let report = run_call(session(20), input, output.clone(), generator).await;

    assert_eq!(report.end, CallEnd::EndKeyword);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(output.spoke("okay, no problem, goodbye"));
    assert_eq!(report.turns.len(), 1);
    assert_eq!(report.turns[0].outcome, TurnOutcome::Ended);
}

#[tokio::test]
async fn end_keyword_is_case_insensitive_substring() {
    let input = ScriptedInput::new(vec![Ok("ओके BYE जी".to_string())]);
    let output = RecordingOutput::new();
    let generator = ScriptedGenerator::new(vec![]);
    let calls = generator.call_counter();

    let report = run_call(session(20), input, output, generator).await;

    assert_eq!(report.end, CallEnd::EndKeyword);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn two_consecutive_timeouts_end_the_call() {
    // Scenario C: the re-prompt fires once, then the unreachable apology
    let input = ScriptedInput::new(vec![Err(ListenError::Timeout), Err(ListenError::Timeout)]);
    let output = RecordingOutput::new();
    let generator = ScriptedGenerator::new(vec![]);
    let calls = generator.call_counter();

    let report = run_call(session(20), input, output.clone(), generator).await;

    assert_eq!(report.end, CallEnd::CallerUnreachable);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(output.spoke("can you hear me?"));
    assert!(output.spoke("cannot hear you"));
    assert_eq!(report.turns.len(), 2);
    assert_eq!(report.turns[0].outcome, TurnOutcome::Retried);
    assert_eq!(report.turns[1].outcome, TurnOutcome::Ended);
}

#[tokio::test]
async fn recognition_service_error_counts_as_no_speech() {
    let input = ScriptedInput::new(vec![
        Err(ListenError::Service("backend down".to_string())),
        Err(ListenError::Unrecognized),
    ]);
    let output = RecordingOutput::new();
    let generator = ScriptedGenerator::new(vec![]);

    let report = run_call(session(20), input, output, generator).await;

    assert_eq!(report.end, CallEnd::CallerUnreachable);
}

#[tokio::test]
async fn successful_listen_resets_no_speech_streak() {
    // Alternating timeout/success never reaches the retry threshold; the
    // turn budget is what finally bounds the loop.
    let input = ScriptedInput::new(vec![
        Err(ListenError::Timeout),
        Ok("हाँ".to_string()),
        Err(ListenError::Timeout),
        Ok("ठीक है".to_string()),
        Err(ListenError::Timeout),
        Ok("अच्छा".to_string()),
    ]);
    let output = RecordingOutput::new();
    let generator = ScriptedGenerator::new(vec![
        Ok("q1 [702]".to_string()),
        Ok("q2 [702]".to_string()),
        Ok("q3 [702]".to_string()),
    ]);

    let report = run_call(session(6), input, output.clone(), generator).await;

    assert_eq!(report.end, CallEnd::TurnBudgetExhausted);
    assert_eq!(report.turns.len(), 6);
    assert!(output.spoke("out of time, team will contact you"));
}

#[tokio::test]
async fn generation_failure_ends_call_but_keeps_history() {
    // Scenario D: the generator dies on turn 3; turns 1-2 stay in history,
    // and so does the turn-3 caller utterance recorded before the failure
    let input = ScriptedInput::new(vec![
        Ok("हाँ interest है".to_string()),
        Ok("Ravi".to_string()),
        Ok("25 साल".to_string()),
    ]);
    let output = RecordingOutput::new();
    let generator = ScriptedGenerator::new(vec![
        Ok("नाम बताइए [702]".to_string()),
        Ok("उम्र बताइए [702]".to_string()),
        Err(GenerateError::Service("model unreachable".to_string())),
    ]);

    let report = run_call(session(20), input, output.clone(), generator).await;

    assert_eq!(report.end, CallEnd::GenerationFailed);
    assert!(output.spoke("technical problem"));

    // 3 caller utterances + 2 assistant replies, nothing rolled back
    let entries = report.history.entries();
    assert_eq!(entries.len(), 5);
    assert_eq!(entries[0].speaker, Speaker::Caller);
    assert_eq!(entries[0].text, "हाँ interest है");
    assert_eq!(entries[1].text, "नाम बताइए");
    assert_eq!(entries[4].text, "25 साल");

    assert_eq!(report.turns.len(), 3);
    assert_eq!(report.turns[2].outcome, TurnOutcome::Failed);
    assert!(report.turns[2].raw_reply.is_none());
}

#[tokio::test]
async fn turn_budget_bounds_a_call_that_never_ends() {
    // Scenario E: 20 turns of CONTINUE end with the closing line
    let inputs: Vec<_> = (0..25).map(|i| Ok(format!("answer {i}"))).collect();
    let replies: Vec<_> = (0..25).map(|i| Ok(format!("question {i} [702]"))).collect();
    let input = ScriptedInput::new(inputs);
    let output = RecordingOutput::new();
    let generator = ScriptedGenerator::new(replies);

    let report = run_call(session(20), input, output.clone(), generator).await;

    assert_eq!(report.end, CallEnd::TurnBudgetExhausted);
    assert_eq!(report.turns.len(), 20);
    assert!(output.spoke("out of time, team will contact you"));
}

#[tokio::test]
async fn end_marker_wins_when_both_markers_present() {
    let input = ScriptedInput::new(vec![Ok("ठीक है".to_string())]);
    let output = RecordingOutput::new();
    let generator =
        ScriptedGenerator::new(vec![Ok("[702] धन्यवाद, बस इतना ही [701]".to_string())]);

    let report = run_call(session(20), input, output.clone(), generator).await;

    assert_eq!(report.end, CallEnd::Completed);
    assert_eq!(report.turns[0].status, Some(StatusCode::End));
    assert!(output.spoke("धन्यवाद, बस इतना ही"));
}

#[tokio::test]
async fn missing_marker_defaults_to_continue() {
    let input = ScriptedInput::new(vec![Ok("हाँ".to_string()), Ok("bye".to_string())]);
    let output = RecordingOutput::new();
    let generator = ScriptedGenerator::new(vec![Ok("आपका नाम क्या है?".to_string())]);

    let report = run_call(session(20), input, output, generator).await;

    // The untagged reply continued the loop; the keyword ended it
    assert_eq!(report.end, CallEnd::EndKeyword);
    assert_eq!(report.turns[0].status, Some(StatusCode::Continue));
}

#[tokio::test]
async fn marker_only_reply_skips_playback() {
    let input = ScriptedInput::new(vec![Ok("हाँ".to_string()), Ok("bye".to_string())]);
    let output = RecordingOutput::new();
    let generator = ScriptedGenerator::new(vec![Ok("[702]".to_string())]);

    let report = run_call(session(20), input, output.clone(), generator).await;

    assert_eq!(report.end, CallEnd::EndKeyword);
    assert_eq!(report.turns[0].spoken.as_deref(), Some(""));
    assert!(output.lines().iter().all(|l| !l.is_empty()));
}

#[tokio::test]
async fn playback_failure_does_not_end_the_call() {
    let input = ScriptedInput::new(vec![Ok("हाँ".to_string()), Ok("Ravi".to_string())]);
    let output = RecordingOutput::failing();
    let generator = ScriptedGenerator::new(vec![
        Ok("नाम बताइए [702]".to_string()),
        Ok("धन्यवाद [701]".to_string()),
    ]);

    let report = run_call(session(20), input, output.clone(), generator).await;

    // Every speak failed, the call still ran to normal completion
    assert_eq!(report.end, CallEnd::Completed);
    assert!(output.spoke("नाम बताइए"));
}

#[tokio::test]
async fn interrupt_ends_call_with_farewell() {
    let input = ScriptedInput::new(vec![Ok("हाँ".to_string())]);
    let output = RecordingOutput::new();
    let generator = ScriptedGenerator::new(vec![]);
    let calls = generator.call_counter();

    let (tx, rx) = mpsc::channel(1);
    tx.send(()).await.unwrap();

    let report = DialogController::new(session(20), script(), input, output.clone(), generator, rx)
        .run()
        .await;

    assert_eq!(report.end, CallEnd::Interrupted);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(output.spoke("call disconnected"));
}

#[tokio::test]
async fn interrupt_farewell_failure_is_swallowed() {
    let input = ScriptedInput::new(vec![]);
    let output = RecordingOutput::failing();
    let generator = ScriptedGenerator::new(vec![]);

    let (tx, rx) = mpsc::channel(1);
    tx.send(()).await.unwrap();

    let report = DialogController::new(session(20), script(), input, output, generator, rx)
        .run()
        .await;

    assert_eq!(report.end, CallEnd::Interrupted);
}

/// Input adapter holding a thread-bound resource across an await, the way
/// the microphone implementation keeps its capture stream alive while
/// polling. This must type-check and run; the adapter traits carry no Send
/// bound.
struct DeviceBoundInput {
    handle: Rc<Cell<u32>>,
    reply: Option<String>,
}

#[async_trait(?Send)]
impl SpeechInput for DeviceBoundInput {
    async fn listen(
        &mut self,
        _timeout: Duration,
        _max_phrase: Duration,
    ) -> Result<String, ListenError> {
        self.handle.set(self.handle.get() + 1);
        tokio::time::sleep(Duration::from_millis(1)).await;
        self.reply.take().ok_or(ListenError::Timeout)
    }
}

#[tokio::test]
async fn adapters_may_hold_thread_bound_handles() {
    let handle = Rc::new(Cell::new(0));
    let input = DeviceBoundInput {
        handle: Rc::clone(&handle),
        reply: Some("bye".to_string()),
    };
    let output = RecordingOutput::new();
    let generator = ScriptedGenerator::new(vec![]);

    let (_tx, rx) = mpsc::channel(1);
    let report = DialogController::new(session(20), script(), input, output, generator, rx)
        .run()
        .await;

    assert_eq!(report.end, CallEnd::EndKeyword);
    assert_eq!(handle.get(), 1);
}

#[tokio::test]
async fn greeting_is_spoken_before_first_listen() {
    let input = ScriptedInput::new(vec![Ok("bye".to_string())]);
    let output = RecordingOutput::new();
    let generator = ScriptedGenerator::new(vec![]);

    let report = run_call(session(20), input, output.clone(), generator).await;

    let lines = output.lines();
    assert_eq!(lines[0], "hello, this is the screening call");
    // Scripted lines are not part of the generator's context
    assert_eq!(report.history.entries()[0].speaker, Speaker::Caller);
}
