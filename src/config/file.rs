//! TOML configuration file loading
//!
//! Supports `~/.config/omni/outcall/config.toml` as a persistent config
//! source. All fields are optional — the file is a partial overlay on top of
//! defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::Result;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct OutcallConfigFile {
    /// Session / turn-loop configuration
    #[serde(default)]
    pub session: SessionFileConfig,

    /// Voice (STT/TTS) configuration
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// LLM configuration
    #[serde(default)]
    pub llm: LlmFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,
}

/// Turn-loop configuration
#[derive(Debug, Default, Deserialize)]
pub struct SessionFileConfig {
    /// Seconds to wait for speech to start
    pub listen_timeout_secs: Option<u64>,

    /// Max seconds of one caller phrase
    pub max_phrase_secs: Option<u64>,

    /// Consecutive failed listens tolerated before ending the call
    pub no_speech_retry_threshold: Option<u32>,

    /// Hard turn budget
    pub max_turns: Option<u32>,

    /// Case-insensitive end-of-call keywords (replaces the default set)
    pub end_keywords: Option<Vec<String>>,
}

/// Voice processing configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// STT provider: "whisper" or "deepgram"
    pub stt_provider: Option<String>,

    /// STT model (e.g. "whisper-1", "nova-2")
    pub stt_model: Option<String>,

    /// Recognition language code (e.g. "hi")
    pub language: Option<String>,

    /// TTS provider: "openai" or "elevenlabs"
    pub tts_provider: Option<String>,

    /// TTS model (e.g. "tts-1")
    pub tts_model: Option<String>,

    /// TTS voice identifier (e.g. "alloy", or an ElevenLabs voice id)
    pub tts_voice: Option<String>,

    /// TTS speed multiplier
    pub tts_speed: Option<f32>,
}

/// LLM-related configuration
#[derive(Debug, Default, Deserialize)]
pub struct LlmFileConfig {
    /// OpenAI-compatible base URL (a local Ollama works:
    /// `http://localhost:11434/v1`)
    pub base_url: Option<String>,

    /// Model identifier (e.g. "llama3.2:3b")
    pub model: Option<String>,

    /// Sampling temperature
    pub temperature: Option<f32>,

    /// Max tokens per reply; replies are kept short for speech
    pub max_tokens: Option<u32>,

    /// API key for the chat endpoint, if it requires one
    pub api_key: Option<String>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub openai: Option<String>,
    pub elevenlabs: Option<String>,
    pub deepgram: Option<String>,
}

/// Default config file location: `~/.config/omni/outcall/config.toml`
#[must_use]
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".config/omni/outcall/config.toml"))
}

/// Load the config file from `path`, or the default location when `None`
///
/// A missing file is not an error; it yields the empty overlay.
///
/// # Errors
///
/// Returns error if the file exists but cannot be read or parsed.
pub fn load_config_file(path: Option<&Path>) -> Result<OutcallConfigFile> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match config_file_path() {
            Some(p) => p,
            None => return Ok(OutcallConfigFile::default()),
        },
    };

    if !path.exists() {
        return Ok(OutcallConfigFile::default());
    }

    let raw = std::fs::read_to_string(&path)?;
    let parsed = toml::from_str(&raw)?;
    tracing::debug!(path = %path.display(), "loaded config file");
    Ok(parsed)
}
