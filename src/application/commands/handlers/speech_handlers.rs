//! Speech Command Handlers

use std::sync::Arc;

use crate::application::commands::{CloneVoice, SynthesizeSpeech};
use crate::application::error::ApplicationError;
use crate::application::ports::{
    CloneVoiceRequest, GenerativePlatformPort, SpeechOutput, SpeechRequest,
};
use crate::domain::voice::{normalize_language_boost, VoiceError, VoiceId};

// ============================================================================
// SynthesizeSpeech
// ============================================================================

/// SynthesizeSpeech Handler
pub struct SynthesizeSpeechHandler {
    platform: Arc<dyn GenerativePlatformPort>,
}

impl SynthesizeSpeechHandler {
    pub fn new(platform: Arc<dyn GenerativePlatformPort>) -> Self {
        Self { platform }
    }

    pub async fn handle(&self, command: SynthesizeSpeech) -> Result<SpeechOutput, ApplicationError> {
        let text = command.text.trim();
        if text.is_empty() {
            return Err(VoiceError::EmptyText.into());
        }
        command.voice_setting.validate()?;

        let request = SpeechRequest::new(text, command.voice_setting)
            .streamed(command.stream)
            .with_language_boost(normalize_language_boost(command.language_boost.as_deref()));

        tracing::debug!(
            text_len = text.len(),
            stream = request.stream,
            voice_id = %request.voice_setting.voice_id,
            "Synthesizing speech"
        );

        Ok(self.platform.synthesize_speech(request).await?)
    }
}

// ============================================================================
// CloneVoice
// ============================================================================

/// CloneVoice Handler
pub struct CloneVoiceHandler {
    platform: Arc<dyn GenerativePlatformPort>,
}

impl CloneVoiceHandler {
    pub fn new(platform: Arc<dyn GenerativePlatformPort>) -> Self {
        Self { platform }
    }

    pub async fn handle(&self, command: CloneVoice) -> Result<VoiceId, ApplicationError> {
        let voice_id = self
            .platform
            .clone_voice(CloneVoiceRequest {
                file_id: command.file_id.clone(),
                voice_id: command.voice_id,
                noise_reduction: command.noise_reduction,
                text: command
                    .preview_text
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty()),
            })
            .await?;

        tracing::info!(
            voice_id = %voice_id,
            file_id = %command.file_id,
            "Voice cloned"
        );

        Ok(voice_id)
    }
}
