//! Studio Session - 单个用户会话的客户端核心
//!
//! 持有对话历史、已克隆音色、播放器、轮询器和操作登记表。
//! 会话开始时创建，reset() / close() 时清理。

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::application::error::ApplicationError;
use crate::application::ports::{
    CloneVoiceRequest, GenerativePlatformPort, OperationChannel, OperationRegistryPort,
    OperationTicket, SpeechRequest, UploadFile,
};
use crate::application::services::audio_player::{PlaybackHandle, StreamingAudioPlayer};
use crate::application::services::task_poller::{TaskPoller, VideoArtifact};
use crate::domain::conversation::{ChatMessage, Conversation};
use crate::domain::generation::{FileRef, VideoModel, VideoRequest};
use crate::domain::media::{MusicReferences, MusicRequest, UploadPurpose};
use crate::domain::voice::{ClonedVoices, VoiceError, VoiceId, VoiceSettings};

/// 会话配置
#[derive(Debug, Clone)]
pub struct StudioSessionConfig {
    pub welcome_message: String,
    /// 等待聊天回复的上限
    pub reply_timeout: Duration,
    pub voice: VoiceSettings,
    pub stream_speech: bool,
    pub language_boost: Option<String>,
}

impl Default for StudioSessionConfig {
    fn default() -> Self {
        Self {
            welcome_message: "Hello! How can I help you today?".to_string(),
            reply_timeout: Duration::from_millis(30_000),
            voice: VoiceSettings::default(),
            stream_speech: false,
            language_boost: None,
        }
    }
}

/// 本地媒体文件
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub bytes: Vec<u8>,
    pub filename: String,
}

impl MediaFile {
    pub fn new(bytes: Vec<u8>, filename: impl Into<String>) -> Self {
        Self {
            bytes,
            filename: filename.into(),
        }
    }

    fn into_upload(self, purpose: UploadPurpose) -> UploadFile {
        UploadFile::new(self.bytes, self.filename, purpose)
    }
}

/// 视频生成输入（参考图尚未上传）
#[derive(Debug, Clone)]
pub struct VideoDraft {
    pub model: VideoModel,
    pub prompt: String,
    pub prompt_optimizer: bool,
    pub first_frame: Option<MediaFile>,
    pub subject_reference: Option<MediaFile>,
}

impl VideoDraft {
    pub fn new(model: VideoModel, prompt: impl Into<String>) -> Self {
        Self {
            model,
            prompt: prompt.into(),
            prompt_optimizer: true,
            first_frame: None,
            subject_reference: None,
        }
    }
}

/// 音色克隆结果
#[derive(Debug)]
pub struct CloneOutcome {
    pub voice_id: VoiceId,
    /// 试听播放（提供了试听文本且合成成功时）
    pub preview: Option<PlaybackHandle>,
}

struct SessionState {
    conversation: Conversation,
    voices: ClonedVoices,
    voice: VoiceSettings,
    last_reply: Option<String>,
}

pub struct StudioSession {
    platform: Arc<dyn GenerativePlatformPort>,
    registry: Arc<dyn OperationRegistryPort>,
    player: Arc<StreamingAudioPlayer>,
    poller: Arc<TaskPoller>,
    config: StudioSessionConfig,
    state: Mutex<SessionState>,
}

impl StudioSession {
    pub fn new(
        platform: Arc<dyn GenerativePlatformPort>,
        registry: Arc<dyn OperationRegistryPort>,
        player: Arc<StreamingAudioPlayer>,
        poller: Arc<TaskPoller>,
        config: StudioSessionConfig,
    ) -> Self {
        let state = SessionState {
            conversation: Conversation::new(config.welcome_message.clone()),
            voices: ClonedVoices::new(),
            voice: config.voice.clone(),
            last_reply: None,
        };
        Self {
            platform,
            registry,
            player,
            poller,
            config,
            state: Mutex::new(state),
        }
    }

    // ========================================================================
    // Chat
    // ========================================================================

    /// 发送聊天消息，返回助手回复
    ///
    /// 超时或失败时撤销未回复的用户消息；超时后到达的回复被丢弃
    pub async fn send_message(&self, text: &str) -> Result<String, ApplicationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ApplicationError::validation("Message cannot be empty"));
        }
        let ticket = OperationTicket::acquire(&self.registry, OperationChannel::Chat)?;

        let history = {
            let mut state = self.state.lock().await;
            state.conversation.push_user(text)?;
            state.conversation.messages().to_vec()
        };

        // 独立任务发送请求，超时只放弃等待，不中断传输
        let platform = Arc::clone(&self.platform);
        let request = tokio::spawn(async move { platform.chat(&history).await });

        let outcome = tokio::select! {
            biased;
            _ = ticket.token().cancelled() => Err(ApplicationError::Cancelled),
            result = tokio::time::timeout(self.config.reply_timeout, request) => match result {
                Ok(Ok(Ok(reply))) => Ok(reply),
                Ok(Ok(Err(e))) => Err(e.into()),
                Ok(Err(e)) => Err(ApplicationError::internal(format!("chat task failed: {}", e))),
                Err(_) => Err(ApplicationError::Timeout(format!(
                    "no chat reply within {}ms",
                    self.config.reply_timeout.as_millis()
                ))),
            },
        };

        let mut state = self.state.lock().await;
        match outcome {
            Ok(reply) => {
                state.conversation.push_assistant(reply.clone())?;
                state.last_reply = Some(reply.clone());
                tracing::debug!(messages = state.conversation.len(), "Chat reply received");
                Ok(reply)
            }
            Err(ApplicationError::Cancelled) => {
                // reset() 已经重建了历史
                Err(ApplicationError::Cancelled)
            }
            Err(e) => {
                state.conversation.rollback_pending();
                tracing::warn!(error = %e, "Chat request failed");
                Err(e)
            }
        }
    }

    pub async fn history(&self) -> Vec<ChatMessage> {
        self.state.lock().await.conversation.messages().to_vec()
    }

    pub async fn last_reply(&self) -> Option<String> {
        self.state.lock().await.last_reply.clone()
    }

    // ========================================================================
    // Speech
    // ========================================================================

    /// 用当前音色朗读文本
    pub async fn speak(&self, text: &str) -> Result<PlaybackHandle, ApplicationError> {
        let voice = self.state.lock().await.voice.clone();
        self.speak_with(text, voice).await
    }

    /// 朗读最近一条助手回复
    pub async fn speak_last_reply(&self) -> Result<PlaybackHandle, ApplicationError> {
        let reply = self
            .last_reply()
            .await
            .ok_or_else(|| ApplicationError::validation("No reply to speak yet"))?;
        self.speak(&reply).await
    }

    async fn speak_with(
        &self,
        text: &str,
        voice: VoiceSettings,
    ) -> Result<PlaybackHandle, ApplicationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(VoiceError::EmptyText.into());
        }
        voice.validate()?;

        let ticket = OperationTicket::acquire(&self.registry, OperationChannel::Speech)?;
        self.player.stop().await;

        let request = SpeechRequest::new(text, voice)
            .streamed(self.config.stream_speech)
            .with_language_boost(self.config.language_boost.clone());

        let output = tokio::select! {
            biased;
            _ = ticket.token().cancelled() => return Err(ApplicationError::Cancelled),
            result = self.platform.synthesize_speech(request) => result?,
        };
        if ticket.is_cancelled() {
            return Err(ApplicationError::Cancelled);
        }

        tracing::debug!(text_len = text.len(), "Starting speech playback");
        Ok(self.player.play(output).await?)
    }

    /// 停止当前播放
    pub async fn stop_audio(&self) -> bool {
        self.player.stop().await
    }

    pub async fn voice(&self) -> VoiceSettings {
        self.state.lock().await.voice.clone()
    }

    pub async fn set_voice(&self, voice: VoiceSettings) -> Result<(), ApplicationError> {
        voice.validate()?;
        self.state.lock().await.voice = voice;
        Ok(())
    }

    /// 切换音色，保留语速、音量、音调
    pub async fn use_voice(&self, voice_id: &str) -> Result<(), ApplicationError> {
        let voice_id = voice_id.trim();
        if voice_id.is_empty() {
            return Err(ApplicationError::validation("Voice ID cannot be empty"));
        }
        self.state.lock().await.voice.voice_id = voice_id.to_string();
        Ok(())
    }

    // ========================================================================
    // Voice cloning
    // ========================================================================

    /// 克隆音色
    ///
    /// 先在本地校验 voice_id，再上传参考音频并克隆；有试听文本时用新音色朗读
    pub async fn clone_voice(
        &self,
        audio: MediaFile,
        voice_id: &str,
        noise_reduction: bool,
        preview_text: Option<String>,
    ) -> Result<CloneOutcome, ApplicationError> {
        let voice_id = VoiceId::parse(voice_id)?;
        let preview_text = preview_text
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        let file_id = self
            .platform
            .upload_file(audio.into_upload(UploadPurpose::VoiceClone))
            .await?;

        let cloned = self
            .platform
            .clone_voice(CloneVoiceRequest {
                file_id,
                voice_id,
                noise_reduction,
                text: preview_text.clone(),
            })
            .await?;

        let voice = {
            let mut state = self.state.lock().await;
            state.voices.record(cloned.clone());
            VoiceSettings {
                voice_id: cloned.to_string(),
                ..state.voice.clone()
            }
        };
        tracing::info!(voice_id = %cloned, "Voice cloned");

        let preview = match preview_text {
            Some(text) => match self.speak_with(&text, voice).await {
                Ok(handle) => Some(handle),
                Err(e) => {
                    tracing::warn!(voice_id = %cloned, error = %e, "Voice preview failed");
                    None
                }
            },
            None => None,
        };

        Ok(CloneOutcome {
            voice_id: cloned,
            preview,
        })
    }

    pub async fn cloned_voices(&self) -> Vec<VoiceId> {
        self.state.lock().await.voices.iter().cloned().collect()
    }

    // ========================================================================
    // Music
    // ========================================================================

    /// 上传音乐参考（song / voice / instrumental）
    pub async fn upload_music(
        &self,
        file: MediaFile,
        purpose: UploadPurpose,
    ) -> Result<MusicReferences, ApplicationError> {
        if !purpose.is_music_reference() {
            return Err(ApplicationError::validation(format!(
                "'{}' is not a music upload purpose",
                purpose
            )));
        }
        let refs = self.platform.upload_music(file.into_upload(purpose)).await?;
        tracing::info!(
            purpose = %purpose,
            voice_id = ?refs.voice_id,
            instrumental_id = ?refs.instrumental_id,
            "Music reference uploaded"
        );
        Ok(refs)
    }

    /// 生成音乐，返回 MP3 字节
    pub async fn generate_music(
        &self,
        lyrics: &str,
        refer_voice: Option<String>,
        refer_instrumental: Option<String>,
    ) -> Result<Vec<u8>, ApplicationError> {
        let request = MusicRequest::new(lyrics, refer_voice, refer_instrumental)?;
        let audio = self.platform.generate_music(&request).await?;
        tracing::info!(bytes = audio.len(), "Music generated");
        Ok(audio)
    }

    // ========================================================================
    // Video
    // ========================================================================

    /// 生成视频：校验 -> 上传参考图 -> 提交 -> 轮询 -> 解析产物
    ///
    /// 新的视频任务会取消正在进行的轮询（远端任务不会被取消）
    pub async fn generate_video(&self, draft: VideoDraft) -> Result<VideoArtifact, ApplicationError> {
        let model = draft.model;
        model.check_inputs(
            &draft.prompt,
            draft.first_frame.is_some(),
            draft.subject_reference.is_some(),
        )?;

        let ticket = OperationTicket::acquire(&self.registry, OperationChannel::VideoTask)?;

        let first_frame_image = match draft.first_frame {
            Some(file) if model.requires_first_frame() => {
                Some(self.upload_reference(file, UploadPurpose::FirstFrame).await?)
            }
            _ => None,
        };
        let subject_reference = match draft.subject_reference {
            Some(file) if model.requires_subject_reference() => {
                Some(self.upload_reference(file, UploadPurpose::SubjectReference).await?)
            }
            _ => None,
        };

        let request = VideoRequest::new(
            model,
            draft.prompt,
            draft.prompt_optimizer,
            first_frame_image,
            subject_reference,
        )?;

        let handle = tokio::select! {
            biased;
            _ = ticket.token().cancelled() => return Err(ApplicationError::Cancelled),
            result = self.poller.submit(&request) => result?,
        };
        Ok(self.poller.run(&handle, ticket.token()).await?)
    }

    async fn upload_reference(
        &self,
        file: MediaFile,
        purpose: UploadPurpose,
    ) -> Result<FileRef, ApplicationError> {
        Ok(self.platform.upload_file(file.into_upload(purpose)).await?)
    }

    /// 下载生成产物
    pub async fn download_artifact(&self, url: &str) -> Result<Vec<u8>, ApplicationError> {
        Ok(self.platform.download_artifact(url).await?)
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// 恢复到初始对话，停止播放并取消所有进行中的操作
    pub async fn reset(&self) {
        let cancelled = self.registry.cancel_all();
        self.player.stop().await;

        let mut state = self.state.lock().await;
        state.conversation.reset();
        state.last_reply = None;
        tracing::info!(cancelled = cancelled, "Session reset");
    }

    /// 结束会话
    pub async fn close(&self) {
        self.reset().await;
        self.state.lock().await.voices.clear();
        tracing::info!("Session closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{NoopEvents, PlatformError};
    use crate::application::services::task_poller::TaskPollerConfig;
    use crate::domain::audio::DecodedAudio;
    use crate::domain::conversation::Role;
    use crate::domain::generation::{Progress, TaskSnapshot, TaskStatus};
    use crate::infrastructure::adapters::{ClockSink, FakePlatform, SymphoniaDecoder};
    use crate::infrastructure::memory::InMemoryOperationRegistry;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine as _;

    fn session_with(platform: Arc<FakePlatform>) -> (StudioSession, Arc<ClockSink>) {
        let sink = Arc::new(ClockSink::new());
        let player = Arc::new(StreamingAudioPlayer::new(
            Arc::new(SymphoniaDecoder::new()),
            sink.clone(),
            Arc::new(NoopEvents),
        ));
        let poller = Arc::new(TaskPoller::new(
            platform.clone(),
            Arc::new(NoopEvents),
            TaskPollerConfig::default(),
        ));
        let session = StudioSession::new(
            platform,
            Arc::new(InMemoryOperationRegistry::new()),
            player,
            poller,
            StudioSessionConfig::default(),
        );
        (session, sink)
    }

    fn silent_clip(ms: u64) -> String {
        BASE64.encode(DecodedAudio::silence(Duration::from_millis(ms), 8000, 1).to_wav_bytes())
    }

    #[tokio::test]
    async fn test_message_and_reply_alternate() {
        let platform = Arc::new(FakePlatform::new().with_chat_reply(Ok("Hi there".to_string())));
        let (session, _) = session_with(platform);

        let reply = session.send_message("  hello  ").await.unwrap();
        assert_eq!(reply, "Hi there");

        let history = session.history().await;
        let roles: Vec<Role> = history.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::Assistant, Role::User, Role::Assistant]);
        assert_eq!(history[1].content, "hello");
        assert_eq!(session.last_reply().await.as_deref(), Some("Hi there"));
    }

    #[tokio::test]
    async fn test_empty_message_rejected_without_request() {
        let platform = Arc::new(FakePlatform::new());
        let (session, _) = session_with(platform.clone());

        let err = session.send_message("   ").await.unwrap_err();
        assert!(matches!(err, ApplicationError::Validation(_)));
        assert_eq!(platform.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_chat_error_rolls_back_user_message() {
        let platform = Arc::new(
            FakePlatform::new().with_chat_reply(Err(PlatformError::remote(1002, "rate limited"))),
        );
        let (session, _) = session_with(platform);

        let err = session.send_message("hello").await.unwrap_err();
        assert_eq!(err.user_message(), "rate limited");
        assert_eq!(session.history().await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_chat_timeout_discards_late_reply() {
        let platform = Arc::new(
            FakePlatform::new()
                .with_chat_delay(Duration::from_secs(31))
                .with_chat_reply(Ok("too late".to_string())),
        );
        let (session, _) = session_with(platform.clone());

        let err = session.send_message("hello").await.unwrap_err();
        assert!(matches!(err, ApplicationError::Timeout(_)));
        assert_eq!(session.history().await.len(), 1);

        // 迟到的回复不会写入历史
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(session.history().await.len(), 1);
        assert_eq!(platform.calls_to("chat"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_chat_while_pending_is_busy() {
        let platform = Arc::new(FakePlatform::new().with_chat_delay(Duration::from_secs(1)));
        let (session, _) = session_with(platform);
        let session = Arc::new(session);

        let first = {
            let session = session.clone();
            tokio::spawn(async move { session.send_message("first").await })
        };
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(10)).await;

        let err = session.send_message("second").await.unwrap_err();
        assert!(matches!(err, ApplicationError::Busy { channel: "chat" }));

        assert!(first.await.unwrap().is_ok());
        assert_eq!(session.history().await.len(), 3);
    }

    #[tokio::test]
    async fn test_clone_with_short_id_makes_no_request() {
        let platform = Arc::new(FakePlatform::new());
        let (session, _) = session_with(platform.clone());

        let err = session
            .clone_voice(MediaFile::new(vec![1, 2, 3], "ref.mp3"), "ab", true, None)
            .await
            .unwrap_err();

        assert!(matches!(err, ApplicationError::Validation(_)));
        assert_eq!(platform.total_calls(), 0);
        assert!(session.cloned_voices().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_clone_records_voice_and_previews() {
        let platform = Arc::new(FakePlatform::new().with_speech_single(silent_clip(300)));
        let (session, _) = session_with(platform.clone());

        let outcome = session
            .clone_voice(
                MediaFile::new(vec![1, 2, 3], "ref.mp3"),
                "narrator01",
                true,
                Some("Hello from my new voice".to_string()),
            )
            .await
            .unwrap();

        assert_eq!(outcome.voice_id.as_str(), "narrator01");
        assert_eq!(session.cloned_voices().await.len(), 1);
        assert_eq!(platform.calls_to("upload_file"), 1);
        assert_eq!(platform.calls_to("clone_voice"), 1);
        assert_eq!(
            platform.last_speech_request().unwrap().voice_setting.voice_id,
            "narrator01"
        );

        let preview = outcome.preview.unwrap();
        assert_eq!(preview.finished().await.unwrap().chunks_played, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_speak_plays_streamed_chunks() {
        let lines: Vec<Vec<u8>> = [silent_clip(100), silent_clip(200)]
            .iter()
            .map(|clip| format!("data: {{\"data\":{{\"audio\":\"{}\"}}}}\n", clip).into_bytes())
            .collect();
        let platform = Arc::new(FakePlatform::new().with_speech_stream(lines));
        let (session, sink) = session_with(platform);

        let handle = session.speak("read this aloud").await.unwrap();
        let report = handle.finished().await.unwrap();
        assert_eq!(report.chunks_played, 2);
        assert_eq!(sink.active_outputs(), 0);
    }

    #[tokio::test]
    async fn test_speak_last_reply_requires_reply() {
        let (session, _) = session_with(Arc::new(FakePlatform::new()));
        assert!(matches!(
            session.speak_last_reply().await,
            Err(ApplicationError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_music_generation_validates_first() {
        let platform = Arc::new(FakePlatform::new());
        let (session, _) = session_with(platform.clone());

        let err = session.generate_music("la la la", None, None).await.unwrap_err();
        assert!(matches!(err, ApplicationError::Validation(_)));
        assert_eq!(platform.total_calls(), 0);

        let audio = session
            .generate_music("la la la", Some("voice-1".to_string()), None)
            .await
            .unwrap();
        assert!(!audio.is_empty());
    }

    #[tokio::test]
    async fn test_music_upload_rejects_non_music_purpose() {
        let (session, _) = session_with(Arc::new(FakePlatform::new()));
        let err = session
            .upload_music(MediaFile::new(vec![1], "a.mp3"), UploadPurpose::FirstFrame)
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::Validation(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_generate_video_uploads_reference_then_polls() {
        let platform = Arc::new(FakePlatform::new().with_poll_script(vec![
            Ok(TaskSnapshot::new(TaskStatus::Running, Progress::new(50), None)),
            Ok(TaskSnapshot::new(
                TaskStatus::Completed,
                Progress::new(100),
                Some(FileRef::new("f1")),
            )),
        ]));
        let (session, _) = session_with(platform.clone());

        let mut draft = VideoDraft::new(VideoModel::I2V01, "a cat on a boat");
        draft.first_frame = Some(MediaFile::new(vec![0xFF, 0xD8], "frame.jpg"));
        let artifact = session.generate_video(draft).await.unwrap();

        assert_eq!(artifact.file_ref.as_str(), "f1");
        assert_eq!(platform.calls_to("upload_file"), 1);
        let submitted = platform.last_video_request().unwrap();
        assert_eq!(submitted.first_frame_image, Some(FileRef::new("file-1")));
    }

    #[tokio::test]
    async fn test_generate_video_missing_reference_makes_no_request() {
        let platform = Arc::new(FakePlatform::new());
        let (session, _) = session_with(platform.clone());

        let err = session
            .generate_video(VideoDraft::new(VideoModel::S2V01, "a dancer"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::Validation(_)));
        assert_eq!(platform.total_calls(), 0);
    }

    fn spawn_video(
        session: &Arc<StudioSession>,
        prompt: &'static str,
    ) -> tokio::task::JoinHandle<Result<VideoArtifact, ApplicationError>> {
        let session = session.clone();
        tokio::spawn(async move {
            session
                .generate_video(VideoDraft::new(VideoModel::Video01, prompt))
                .await
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_video_task_preempts_polling() {
        let platform = Arc::new(FakePlatform::new().with_poll_script(vec![Ok(TaskSnapshot::new(
            TaskStatus::Running,
            Progress::new(10),
            None,
        ))]));
        let (session, _) = session_with(platform.clone());
        let session = Arc::new(session);

        let first = spawn_video(&session, "first");
        tokio::time::sleep(Duration::from_millis(3000)).await;
        let second = spawn_video(&session, "second");

        assert!(matches!(
            first.await.unwrap(),
            Err(ApplicationError::Cancelled)
        ));
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(platform.calls_to("submit_video_task"), 2);
        assert_eq!(platform.last_video_request().unwrap().prompt, "second");
        assert!(!second.is_finished());

        session.reset().await;
        assert!(matches!(
            second.await.unwrap(),
            Err(ApplicationError::Cancelled)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_cancels_video_polling() {
        let platform = Arc::new(FakePlatform::new().with_poll_script(vec![Ok(TaskSnapshot::new(
            TaskStatus::Running,
            Progress::new(10),
            None,
        ))]));
        let (session, _) = session_with(platform.clone());
        let session = Arc::new(session);

        let first = spawn_video(&session, "first");
        tokio::time::sleep(Duration::from_millis(3000)).await;

        session.reset().await;
        assert!(matches!(
            first.await.unwrap(),
            Err(ApplicationError::Cancelled)
        ));
        let polls = platform.calls_to("poll_video_task");
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(platform.calls_to("poll_video_task"), polls);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_restores_welcome_and_stops_audio() {
        let platform = Arc::new(
            FakePlatform::new()
                .with_chat_reply(Ok("sure".to_string()))
                .with_speech_single(silent_clip(5000)),
        );
        let (session, sink) = session_with(platform);

        session.send_message("hi").await.unwrap();
        let handle = session.speak("long text").await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        session.reset().await;
        assert_eq!(session.history().await.len(), 1);
        assert!(session.last_reply().await.is_none());
        assert_eq!(sink.active_outputs(), 0);
        assert!(handle.finished().await.is_err());
    }
}
