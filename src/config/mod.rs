//! Configuration for outcall
//!
//! Defaults live in code; an optional TOML file overlays them and API keys
//! come from the environment. Everything here is immutable for the lifetime
//! of a call.

pub mod file;

use std::path::Path;
use std::time::Duration;

use crate::{Error, Result};

/// Full gateway configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Turn-loop policy
    pub session: SessionConfig,

    /// Fixed spoken lines
    pub script: CallScript,

    /// STT/TTS configuration
    pub voice: VoiceConfig,

    /// Response generation configuration
    pub llm: LlmConfig,

    /// API keys for external services
    pub api_keys: ApiKeys,
}

/// Immutable per-call session policy
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long to wait for speech to start
    pub listen_timeout: Duration,

    /// Max duration of one caller phrase
    pub max_phrase: Duration,

    /// Consecutive failed listens tolerated before ending the call
    pub no_speech_retry_threshold: u32,

    /// Hard turn budget; the call ends when it is reached
    pub max_turns: u32,

    /// End-of-call keywords, matched case-insensitively as substrings
    pub end_keywords: Vec<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            listen_timeout: Duration::from_secs(10),
            max_phrase: Duration::from_secs(8),
            no_speech_retry_threshold: 2,
            max_turns: 20,
            end_keywords: [
                "बंद",
                "रोको",
                "नहीं चाहिए",
                "interest नहीं",
                "रुको",
                "bye",
                "goodbye",
                "stop",
            ]
            .iter()
            .map(ToString::to_string)
            .collect(),
        }
    }
}

/// The fixed lines the assistant speaks outside of generation
#[derive(Debug, Clone)]
pub struct CallScript {
    /// Scripted opening, spoken line by line before the first listen
    pub greeting: Vec<String>,

    /// Spoken after a failed listen below the retry threshold
    pub reprompt: String,

    /// Spoken when the retry threshold is reached
    pub unreachable_apology: String,

    /// Spoken when response generation fails
    pub technical_apology: String,

    /// Spoken when the caller says an end keyword
    pub keyword_farewell: String,

    /// Spoken when the turn budget runs out
    pub budget_closing: String,

    /// Best-effort farewell on an external interrupt
    pub interrupt_farewell: String,

    /// Short phrase used by the startup audio self-check
    pub self_check_phrase: String,
}

impl Default for CallScript {
    fn default() -> Self {
        Self {
            greeting: vec![
                "नमस्ते! मैं Kovon से Prachi बोल रही हूँ।".to_string(),
                "Kovon आपको verified agencies से safely connect करता है।".to_string(),
                "क्या आपको overseas jobs में interest है?".to_string(),
            ],
            reprompt: "क्या आप सुन पा रहे हैं? कृपया बोलिए।".to_string(),
            unreachable_apology: "मुझे आपकी आवाज़ नहीं आ रही। कृपया बाद में call करें।"
                .to_string(),
            technical_apology: "माफ़ कीजिए, कुछ technical problem हो गई। कृपया बाद में try करें।"
                .to_string(),
            keyword_farewell: "ठीक है, कोई बात नहीं। धन्यवाद! नमस्ते!".to_string(),
            budget_closing: "समय की कमी है। हमारी team आपको contact करेगी। धन्यवाद!"
                .to_string(),
            interrupt_farewell: "Call disconnect हो गई। धन्यवाद!".to_string(),
            self_check_phrase: "टेस्ट".to_string(),
        }
    }
}

/// STT provider backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SttProvider {
    /// `OpenAI` Whisper
    Whisper,
    /// Deepgram
    Deepgram,
}

/// TTS provider backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtsProvider {
    /// `OpenAI` TTS
    OpenAI,
    /// `ElevenLabs`
    ElevenLabs,
}

/// Voice processing configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// STT backend
    pub stt_provider: SttProvider,

    /// STT model (e.g. "whisper-1", "nova-2")
    pub stt_model: String,

    /// Recognition language code
    pub language: String,

    /// TTS backend
    pub tts_provider: TtsProvider,

    /// TTS model (e.g. "tts-1")
    pub tts_model: String,

    /// TTS voice identifier
    pub tts_voice: String,

    /// TTS speed multiplier
    pub tts_speed: f32,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            stt_provider: SttProvider::Whisper,
            stt_model: "whisper-1".to_string(),
            language: "hi".to_string(),
            tts_provider: TtsProvider::OpenAI,
            tts_model: "tts-1".to_string(),
            tts_voice: "alloy".to_string(),
            tts_speed: 1.0,
        }
    }
}

/// Response generation configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// OpenAI-compatible chat completions base URL
    pub base_url: String,

    /// Model identifier
    pub model: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Max tokens per reply, kept short for speech
    pub max_tokens: u32,

    /// API key for the chat endpoint, if required
    pub api_key: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434/v1".to_string(),
            model: "llama3.2:3b".to_string(),
            temperature: 0.7,
            max_tokens: 100,
            api_key: None,
        }
    }
}

/// API keys for external services
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    /// `OpenAI` API key (Whisper STT and TTS)
    pub openai: Option<String>,

    /// `ElevenLabs` API key (optional TTS)
    pub elevenlabs: Option<String>,

    /// Deepgram API key (optional STT)
    pub deepgram: Option<String>,
}

impl Config {
    /// Load configuration: defaults, then the TOML overlay, then env keys
    ///
    /// # Errors
    ///
    /// Returns error if the config file cannot be parsed or names an unknown
    /// provider.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let overlay = file::load_config_file(config_path)?;
        let mut config = Self {
            session: SessionConfig::default(),
            script: CallScript::default(),
            voice: VoiceConfig::default(),
            llm: LlmConfig::default(),
            api_keys: ApiKeys::default(),
        };

        let session = overlay.session;
        if let Some(secs) = session.listen_timeout_secs {
            config.session.listen_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = session.max_phrase_secs {
            config.session.max_phrase = Duration::from_secs(secs);
        }
        if let Some(n) = session.no_speech_retry_threshold {
            config.session.no_speech_retry_threshold = n;
        }
        if let Some(n) = session.max_turns {
            config.session.max_turns = n;
        }
        if let Some(keywords) = session.end_keywords {
            config.session.end_keywords = keywords;
        }

        let voice = overlay.voice;
        if let Some(provider) = voice.stt_provider {
            config.voice.stt_provider = parse_stt_provider(&provider)?;
        }
        if let Some(model) = voice.stt_model {
            config.voice.stt_model = model;
        }
        if let Some(language) = voice.language {
            config.voice.language = language;
        }
        if let Some(provider) = voice.tts_provider {
            config.voice.tts_provider = parse_tts_provider(&provider)?;
        }
        if let Some(model) = voice.tts_model {
            config.voice.tts_model = model;
        }
        if let Some(tts_voice) = voice.tts_voice {
            config.voice.tts_voice = tts_voice;
        }
        if let Some(speed) = voice.tts_speed {
            config.voice.tts_speed = speed;
        }

        let llm = overlay.llm;
        if let Some(url) = llm.base_url {
            config.llm.base_url = url;
        }
        if let Some(model) = llm.model {
            config.llm.model = model;
        }
        if let Some(t) = llm.temperature {
            config.llm.temperature = t;
        }
        if let Some(n) = llm.max_tokens {
            config.llm.max_tokens = n;
        }
        config.llm.api_key = llm.api_key;

        // Env vars win over the file for secrets
        config.api_keys = ApiKeys {
            openai: std::env::var("OPENAI_API_KEY")
                .ok()
                .or(overlay.api_keys.openai),
            elevenlabs: std::env::var("ELEVENLABS_API_KEY")
                .ok()
                .or(overlay.api_keys.elevenlabs),
            deepgram: std::env::var("DEEPGRAM_API_KEY")
                .ok()
                .or(overlay.api_keys.deepgram),
        };

        Ok(config)
    }
}

/// Parse an STT provider name from config
fn parse_stt_provider(name: &str) -> Result<SttProvider> {
    match name.to_lowercase().as_str() {
        "whisper" | "openai" => Ok(SttProvider::Whisper),
        "deepgram" => Ok(SttProvider::Deepgram),
        other => Err(Error::Config(format!("unknown STT provider: {other}"))),
    }
}

/// Parse a TTS provider name from config
fn parse_tts_provider(name: &str) -> Result<TtsProvider> {
    match name.to_lowercase().as_str() {
        "openai" => Ok(TtsProvider::OpenAI),
        "elevenlabs" => Ok(TtsProvider::ElevenLabs),
        other => Err(Error::Config(format!("unknown TTS provider: {other}"))),
    }
}
