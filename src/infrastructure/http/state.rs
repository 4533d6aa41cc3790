//! Application State
//!
//! 代理服务端的应用状态，包含所有 Command/Query Handlers

use std::sync::Arc;

use crate::application::{
    // Command handlers
    ChatHandler, CloneVoiceHandler, GenerateMusicHandler, SubmitVideoHandler,
    SynthesizeSpeechHandler, UploadFileHandler, UploadMusicHandler,
    // Query handlers
    GetVideoStatusHandler, ResolveFileHandler,
    // Ports
    AudioDecoderPort, GenerativePlatformPort,
};
use crate::domain::generation::VideoModel;
use crate::domain::media::AudioUploadPolicy;

/// 应用状态
pub struct AppState {
    // ========== Ports ==========
    pub platform: Arc<dyn GenerativePlatformPort>,

    /// 请求未指定模型时使用
    pub default_video_model: VideoModel,

    // ========== Command Handlers ==========
    pub chat_handler: ChatHandler,
    pub synthesize_speech_handler: SynthesizeSpeechHandler,
    pub clone_voice_handler: CloneVoiceHandler,
    pub upload_file_handler: UploadFileHandler,
    pub upload_music_handler: UploadMusicHandler,
    pub generate_music_handler: GenerateMusicHandler,
    pub submit_video_handler: SubmitVideoHandler,

    // ========== Query Handlers ==========
    pub get_video_status_handler: GetVideoStatusHandler,
    pub resolve_file_handler: ResolveFileHandler,
}

impl AppState {
    /// 创建应用状态
    pub fn new(
        platform: Arc<dyn GenerativePlatformPort>,
        decoder: Arc<dyn AudioDecoderPort>,
        upload_policy: AudioUploadPolicy,
        default_video_model: VideoModel,
    ) -> Self {
        Self {
            platform: platform.clone(),
            default_video_model,

            // Command handlers
            chat_handler: ChatHandler::new(platform.clone()),
            synthesize_speech_handler: SynthesizeSpeechHandler::new(platform.clone()),
            clone_voice_handler: CloneVoiceHandler::new(platform.clone()),
            upload_file_handler: UploadFileHandler::new(platform.clone(), decoder, upload_policy),
            upload_music_handler: UploadMusicHandler::new(platform.clone(), upload_policy),
            generate_music_handler: GenerateMusicHandler::new(platform.clone()),
            submit_video_handler: SubmitVideoHandler::new(platform.clone()),

            // Query handlers
            get_video_status_handler: GetVideoStatusHandler::new(platform.clone()),
            resolve_file_handler: ResolveFileHandler::new(platform),
        }
    }
}
