//! Fake Platform - 用于测试与离线演示的生成式平台
//!
//! 不发起网络请求，按预设脚本返回结果，并记录每次调用

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use futures_util::stream::{self, StreamExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::application::ports::{
    CloneVoiceRequest, GenerativePlatformPort, PlatformError, SpeechOutput, SpeechRequest,
    UploadFile,
};
use crate::domain::audio::DecodedAudio;
use crate::domain::conversation::{ChatMessage, Role};
use crate::domain::generation::{FileRef, Progress, TaskSnapshot, TaskStatus, VideoRequest};
use crate::domain::media::{MusicReferences, MusicRequest, UploadPurpose};
use crate::domain::voice::VoiceId;

/// 语音合成的预设结果
#[derive(Debug, Clone)]
enum SpeechScript {
    Single(String),
    Stream(Vec<Vec<u8>>),
}

/// 短静音 WAV，作为默认音频
fn silent_wav(ms: u64) -> Vec<u8> {
    DecodedAudio::silence(Duration::from_millis(ms), 8000, 1).to_wav_bytes()
}

/// Fake Platform
pub struct FakePlatform {
    chat_reply: Option<Result<String, PlatformError>>,
    chat_delay: Duration,
    speech: SpeechScript,
    submit_error: Option<PlatformError>,
    poll_script: Vec<Result<TaskSnapshot, PlatformError>>,
    poll_cursor: AtomicUsize,
    upload_counter: AtomicUsize,
    calls: Mutex<Vec<&'static str>>,
    last_speech: Mutex<Option<SpeechRequest>>,
    last_video: Mutex<Option<VideoRequest>>,
}

impl Default for FakePlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl FakePlatform {
    pub fn new() -> Self {
        Self {
            chat_reply: None,
            chat_delay: Duration::ZERO,
            speech: SpeechScript::Single(BASE64.encode(silent_wav(200))),
            submit_error: None,
            poll_script: Vec::new(),
            poll_cursor: AtomicUsize::new(0),
            upload_counter: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
            last_speech: Mutex::new(None),
            last_video: Mutex::new(None),
        }
    }

    /// 固定的对话回复（默认回显最后一条用户消息）
    pub fn with_chat_reply(mut self, reply: Result<String, PlatformError>) -> Self {
        self.chat_reply = Some(reply);
        self
    }

    pub fn with_chat_delay(mut self, delay: Duration) -> Self {
        self.chat_delay = delay;
        self
    }

    /// 非流式语音：单个 base64 音频
    pub fn with_speech_single(mut self, payload: impl Into<String>) -> Self {
        self.speech = SpeechScript::Single(payload.into());
        self
    }

    /// 流式语音：按给定字节块依次产出
    pub fn with_speech_stream(mut self, chunks: Vec<Vec<u8>>) -> Self {
        self.speech = SpeechScript::Stream(chunks);
        self
    }

    /// 轮询脚本，用尽后重复最后一项
    pub fn with_poll_script(mut self, script: Vec<Result<TaskSnapshot, PlatformError>>) -> Self {
        self.poll_script = script;
        self
    }

    pub fn with_submit_error(mut self, error: PlatformError) -> Self {
        self.submit_error = Some(error);
        self
    }

    /// 指定方法被调用的次数
    pub fn calls_to(&self, method: &str) -> usize {
        self.lock_calls().iter().filter(|m| **m == method).count()
    }

    pub fn total_calls(&self) -> usize {
        self.lock_calls().len()
    }

    pub fn last_speech_request(&self) -> Option<SpeechRequest> {
        self.last_speech.lock().ok().and_then(|r| r.clone())
    }

    pub fn last_video_request(&self) -> Option<VideoRequest> {
        self.last_video.lock().ok().and_then(|r| r.clone())
    }

    fn lock_calls(&self) -> std::sync::MutexGuard<'_, Vec<&'static str>> {
        self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, method: &'static str) {
        tracing::trace!(method, "FakePlatform call");
        self.lock_calls().push(method);
    }

    fn next_upload_id(&self) -> usize {
        self.upload_counter.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[async_trait]
impl GenerativePlatformPort for FakePlatform {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, PlatformError> {
        self.record("chat");
        if !self.chat_delay.is_zero() {
            tokio::time::sleep(self.chat_delay).await;
        }

        match &self.chat_reply {
            Some(reply) => reply.clone(),
            None => {
                let last = messages
                    .iter()
                    .rev()
                    .find(|m| m.role == Role::User)
                    .map(|m| m.content.as_str())
                    .unwrap_or_default();
                Ok(format!("You said: {}", last))
            }
        }
    }

    async fn synthesize_speech(&self, request: SpeechRequest) -> Result<SpeechOutput, PlatformError> {
        self.record("synthesize_speech");
        if let Ok(mut last) = self.last_speech.lock() {
            *last = Some(request);
        }

        Ok(match &self.speech {
            SpeechScript::Single(payload) => SpeechOutput::Single(payload.clone()),
            SpeechScript::Stream(chunks) => {
                SpeechOutput::Stream(stream::iter(chunks.clone().into_iter().map(Ok)).boxed())
            }
        })
    }

    async fn submit_video_task(&self, request: &VideoRequest) -> Result<String, PlatformError> {
        self.record("submit_video_task");
        if let Ok(mut last) = self.last_video.lock() {
            *last = Some(request.clone());
        }

        match &self.submit_error {
            Some(error) => Err(error.clone()),
            None => Ok("task-1".to_string()),
        }
    }

    async fn poll_video_task(&self, _task_id: &str) -> Result<TaskSnapshot, PlatformError> {
        self.record("poll_video_task");

        if self.poll_script.is_empty() {
            return Ok(TaskSnapshot::new(
                TaskStatus::Completed,
                Progress::DONE,
                Some(FileRef::new("video-file-1")),
            ));
        }
        let index = self
            .poll_cursor
            .fetch_add(1, Ordering::SeqCst)
            .min(self.poll_script.len() - 1);
        self.poll_script[index].clone()
    }

    async fn resolve_file(&self, file_ref: &FileRef) -> Result<String, PlatformError> {
        self.record("resolve_file");
        Ok(format!("https://files.fake/{}", file_ref))
    }

    async fn upload_file(&self, file: UploadFile) -> Result<FileRef, PlatformError> {
        self.record("upload_file");
        if file.bytes.is_empty() {
            return Err(PlatformError::remote(2013, "empty file"));
        }
        Ok(FileRef::new(format!("file-{}", self.next_upload_id())))
    }

    async fn clone_voice(&self, request: CloneVoiceRequest) -> Result<VoiceId, PlatformError> {
        self.record("clone_voice");
        Ok(request.voice_id)
    }

    async fn upload_music(&self, file: UploadFile) -> Result<MusicReferences, PlatformError> {
        self.record("upload_music");
        let n = self.next_upload_id();
        let voice_id = Some(format!("voice-{}", n));
        let instrumental_id = Some(format!("instrumental-{}", n));

        Ok(match file.purpose {
            UploadPurpose::Voice => MusicReferences {
                voice_id,
                instrumental_id: None,
            },
            UploadPurpose::Instrumental => MusicReferences {
                voice_id: None,
                instrumental_id,
            },
            _ => MusicReferences {
                voice_id,
                instrumental_id,
            },
        })
    }

    async fn generate_music(&self, _request: &MusicRequest) -> Result<Vec<u8>, PlatformError> {
        self.record("generate_music");
        Ok(silent_wav(500))
    }

    async fn download_artifact(&self, url: &str) -> Result<Vec<u8>, PlatformError> {
        self.record("download_artifact");
        Ok(format!("fake artifact from {}", url).into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_chat_echoes_last_user_message() {
        let platform = FakePlatform::new();
        let reply = platform
            .chat(&[ChatMessage::assistant("welcome"), ChatMessage::user("ping")])
            .await
            .unwrap();
        assert_eq!(reply, "You said: ping");
        assert_eq!(platform.calls_to("chat"), 1);
    }

    #[tokio::test]
    async fn test_poll_script_repeats_last_entry() {
        let platform = FakePlatform::new().with_poll_script(vec![
            Ok(TaskSnapshot::new(TaskStatus::Pending, Progress::new(0), None)),
            Ok(TaskSnapshot::new(TaskStatus::Running, Progress::new(40), None)),
        ]);

        let statuses: Vec<TaskStatus> = futures_util::future::join_all(
            (0..4).map(|_| platform.poll_video_task("task-1")),
        )
        .await
        .into_iter()
        .map(|s| s.unwrap().status)
        .collect();

        assert_eq!(
            statuses,
            vec![
                TaskStatus::Pending,
                TaskStatus::Running,
                TaskStatus::Running,
                TaskStatus::Running
            ]
        );
    }

    #[tokio::test]
    async fn test_upload_ids_increment() {
        let platform = FakePlatform::new();
        let file = || UploadFile::new(vec![1], "a.jpg", UploadPurpose::FirstFrame);
        assert_eq!(platform.upload_file(file()).await.unwrap().as_str(), "file-1");
        assert_eq!(platform.upload_file(file()).await.unwrap().as_str(), "file-2");
    }
}
