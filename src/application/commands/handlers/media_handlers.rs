//! Media Command Handlers - 文件上传与音乐

use std::sync::Arc;

use crate::application::commands::{GenerateMusic, UploadMedia};
use crate::application::error::ApplicationError;
use crate::application::ports::{AudioDecoderPort, GenerativePlatformPort, UploadFile};
use crate::domain::generation::FileRef;
use crate::domain::media::{AudioUploadPolicy, MusicReferences, MusicRequest, UploadPurpose};

// ============================================================================
// UploadMedia
// ============================================================================

/// 通用文件上传 Handler
///
/// 克隆参考音频需先通过上传策略（大小、解码后时长）
pub struct UploadFileHandler {
    platform: Arc<dyn GenerativePlatformPort>,
    decoder: Arc<dyn AudioDecoderPort>,
    policy: AudioUploadPolicy,
}

impl UploadFileHandler {
    pub fn new(
        platform: Arc<dyn GenerativePlatformPort>,
        decoder: Arc<dyn AudioDecoderPort>,
        policy: AudioUploadPolicy,
    ) -> Self {
        Self {
            platform,
            decoder,
            policy,
        }
    }

    pub async fn handle(&self, command: UploadMedia) -> Result<FileRef, ApplicationError> {
        if command.purpose.is_music_reference() {
            return Err(ApplicationError::validation(format!(
                "purpose '{}' must be uploaded through the music upload endpoint",
                command.purpose
            )));
        }

        let bytes = if command.purpose == UploadPurpose::VoiceClone {
            check_clone_audio(&self.policy, Arc::clone(&self.decoder), command.bytes).await?
        } else {
            if command.bytes.is_empty() {
                return Err(ApplicationError::validation("File is empty"));
            }
            command.bytes
        };

        let size = bytes.len();
        let file_id = self
            .platform
            .upload_file(UploadFile::new(bytes, command.filename, command.purpose))
            .await?;

        tracing::info!(
            file_id = %file_id,
            purpose = %command.purpose,
            size = size,
            "File uploaded"
        );

        Ok(file_id)
    }
}

/// 依次检查大小与解码后时长，通过后原样返回字节
async fn check_clone_audio(
    policy: &AudioUploadPolicy,
    decoder: Arc<dyn AudioDecoderPort>,
    bytes: Vec<u8>,
) -> Result<Vec<u8>, ApplicationError> {
    policy.check_size(bytes.len() as u64)?;

    let (bytes, decoded) = tokio::task::spawn_blocking(move || {
        let decoded = decoder.decode(&bytes);
        (bytes, decoded)
    })
    .await
    .map_err(|e| ApplicationError::internal(format!("decode task failed: {}", e)))?;

    let audio = decoded.map_err(|e| {
        ApplicationError::validation(format!("Reference audio could not be decoded: {}", e))
    })?;
    policy.check_duration(audio.duration())?;
    Ok(bytes)
}

// ============================================================================
// UploadMusic
// ============================================================================

/// 音乐参考上传 Handler
pub struct UploadMusicHandler {
    platform: Arc<dyn GenerativePlatformPort>,
    policy: AudioUploadPolicy,
}

impl UploadMusicHandler {
    pub fn new(platform: Arc<dyn GenerativePlatformPort>, policy: AudioUploadPolicy) -> Self {
        Self { platform, policy }
    }

    pub async fn handle(&self, command: UploadMedia) -> Result<MusicReferences, ApplicationError> {
        if !command.purpose.is_music_reference() {
            return Err(ApplicationError::validation(format!(
                "'{}' is not a music upload purpose",
                command.purpose
            )));
        }
        self.policy.check_size(command.bytes.len() as u64)?;

        let refs = self
            .platform
            .upload_music(UploadFile::new(command.bytes, command.filename, command.purpose))
            .await?;

        tracing::info!(
            purpose = %command.purpose,
            voice_id = ?refs.voice_id,
            instrumental_id = ?refs.instrumental_id,
            "Music reference uploaded"
        );

        Ok(refs)
    }
}

// ============================================================================
// GenerateMusic
// ============================================================================

/// 音乐生成 Handler
pub struct GenerateMusicHandler {
    platform: Arc<dyn GenerativePlatformPort>,
}

impl GenerateMusicHandler {
    pub fn new(platform: Arc<dyn GenerativePlatformPort>) -> Self {
        Self { platform }
    }

    pub async fn handle(&self, command: GenerateMusic) -> Result<Vec<u8>, ApplicationError> {
        let request = MusicRequest::new(
            command.lyrics,
            command.refer_voice,
            command.refer_instrumental,
        )?;
        let audio = self.platform.generate_music(&request).await?;

        tracing::info!(
            lyrics_len = request.lyrics.len(),
            bytes = audio.len(),
            "Music generated"
        );

        Ok(audio)
    }
}
