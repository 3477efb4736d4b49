//! Text-to-speech over OpenAI or ElevenLabs

use crate::config::{ApiKeys, TtsProvider, VoiceConfig};
use crate::{Error, Result};

/// Synthesizes speech (MP3) from text
pub struct TextToSpeech {
    client: reqwest::Client,
    api_key: String,
    model: String,
    voice: String,
    speed: f32,
    provider: TtsProvider,
}

impl TextToSpeech {
    /// Build the configured TTS backend
    ///
    /// # Errors
    ///
    /// Returns error if the required API key is missing.
    pub fn from_config(voice: &VoiceConfig, keys: &ApiKeys) -> Result<Self> {
        let api_key = match voice.tts_provider {
            TtsProvider::OpenAI => keys
                .openai
                .clone()
                .filter(|k| !k.is_empty())
                .ok_or_else(|| Error::Config("OpenAI API key required for TTS".to_string()))?,
            TtsProvider::ElevenLabs => keys
                .elevenlabs
                .clone()
                .filter(|k| !k.is_empty())
                .ok_or_else(|| Error::Config("ElevenLabs API key required for TTS".to_string()))?,
        };

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model: voice.tts_model.clone(),
            voice: voice.tts_voice.clone(),
            speed: voice.tts_speed,
            provider: voice.tts_provider,
        })
    }

    /// Synthesize text to MP3 bytes
    ///
    /// # Errors
    ///
    /// Returns error if synthesis fails.
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        match self.provider {
            TtsProvider::OpenAI => self.synthesize_openai(text).await,
            TtsProvider::ElevenLabs => self.synthesize_elevenlabs(text).await,
        }
    }

    async fn synthesize_openai(&self, text: &str) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct TtsRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            speed: f32,
        }

        let request = TtsRequest {
            model: &self.model,
            input: text,
            voice: &self.voice,
            speed: self.speed,
        };

        let response = self
            .client
            .post("https://api.openai.com/v1/audio/speech")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("OpenAI TTS error {status}: {body}")));
        }

        Ok(response.bytes().await?.to_vec())
    }

    async fn synthesize_elevenlabs(&self, text: &str) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct ElevenLabsRequest<'a> {
            text: &'a str,
            model_id: &'a str,
        }

        let url = format!("https://api.elevenlabs.io/v1/text-to-speech/{}", self.voice);
        let request = ElevenLabsRequest {
            text,
            model_id: &self.model,
        };

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("ElevenLabs TTS error {status}: {body}")));
        }

        Ok(response.bytes().await?.to_vec())
    }
}
